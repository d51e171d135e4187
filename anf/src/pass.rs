//! Module-level passes and the function rewrite driver.

use std::fmt;
use std::sync::Arc;

use snafu::ResultExt;

use crate::config::PassContext;
use crate::error::*;
use crate::expr::Function;
use crate::module::Module;

/// A `Module -> Module` transformation.
///
/// Passes never mutate their input; a pass that has nothing to do returns a
/// clone of it.
pub trait ModulePass: Send + Sync {
    fn name(&self) -> &str;

    /// Lowest [`PassContext::opt_level`] at which the pass runs.
    fn opt_level(&self) -> u32 {
        0
    }

    fn run(&self, module: &Module, ctx: &PassContext) -> Result<Module>;
}

/// Rewrite the function bound to `entry`, rebinding it in a new module.
///
/// When `rewrite` hands back the same `Arc`, the input module is returned
/// unchanged. No module is built if `rewrite` fails.
#[tracing::instrument(skip_all, fields(entry = entry))]
pub fn run_on_function<F>(module: &Module, entry: &str, rewrite: F) -> Result<Module>
where
    F: FnOnce(&Arc<Function>) -> Result<Arc<Function>>,
{
    let func = module.lookup_function(entry)?;
    tracing::debug!(func.before = %func, "rewriting entry function");
    let rewritten = rewrite(func)?;
    if Arc::ptr_eq(func, &rewritten) {
        tracing::trace!("entry function unchanged");
        return Ok(module.clone());
    }
    tracing::debug!(func.after = %rewritten, "rewrote entry function");
    Ok(module.with_function(entry, rewritten))
}

/// Ordered pipeline of passes, itself a pass.
///
/// Each member runs only if [`PassContext::is_enabled`] accepts it. A failing
/// member aborts the pipeline with [`Error::PassFailed`].
#[derive(Clone)]
pub struct Sequential {
    name: String,
    passes: Vec<Arc<dyn ModulePass>>,
}

impl Sequential {
    pub fn new(name: impl Into<String>, passes: Vec<Arc<dyn ModulePass>>) -> Self {
        Self { name: name.into(), passes }
    }

    pub fn passes(&self) -> &[Arc<dyn ModulePass>] {
        &self.passes
    }
}

impl fmt::Debug for Sequential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequential")
            .field("name", &self.name)
            .field("passes", &self.passes.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl ModulePass for Sequential {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip_all, fields(pipeline = %self.name))]
    fn run(&self, module: &Module, ctx: &PassContext) -> Result<Module> {
        let mut current = module.clone();
        for pass in &self.passes {
            if !ctx.is_enabled(pass.as_ref()) {
                tracing::debug!(pass = pass.name(), "skipped");
                continue;
            }

            current = pass.run(&current, ctx).context(PassFailedSnafu { pass: pass.name() })?;
            if ctx.verify {
                current.check_well_formed().context(PassFailedSnafu { pass: pass.name() })?;
            }
            tracing::debug!(pass = pass.name(), module = %current, "after pass");
        }
        Ok(current)
    }
}
