//! Explicit, ordered registry of module passes.
//!
//! Passes are looked up by name. Registration order is the order of
//! [`PassRegistry::names`] and of the default pipeline; nothing is registered
//! implicitly, [`PassRegistry::with_builtin_passes`] lists the built-ins.

use std::collections::HashMap;
use std::sync::Arc;

use snafu::{OptionExt, ensure};

use crate::error::*;
use crate::pass::{ModulePass, Sequential};
use crate::passes;

#[derive(Clone, Default)]
pub struct PassRegistry {
    passes: Vec<Arc<dyn ModulePass>>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for PassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl PassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every pass shipped with this crate.
    pub fn with_builtin_passes() -> Result<Self> {
        let mut registry = Self::new();
        passes::register_builtin(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, pass: Arc<dyn ModulePass>) -> Result<()> {
        let name = pass.name().to_string();
        ensure!(!self.by_name.contains_key(&name), DuplicatePassSnafu { name });
        tracing::debug!(pass = %name, opt_level = pass.opt_level(), "registered pass");
        self.by_name.insert(name, self.passes.len());
        self.passes.push(pass);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ModulePass>> {
        self.by_name.get(name).map(|&i| Arc::clone(&self.passes[i]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(|pass| pass.name())
    }

    /// Pipeline of the named passes, in the given order.
    pub fn build_pipeline(&self, name: &str, passes: &[&str]) -> Result<Sequential> {
        let passes = passes
            .iter()
            .map(|&pass| self.get(pass).context(UnknownPassSnafu { name: pass }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Sequential::new(name, passes))
    }

    /// Pipeline of every registered pass in registration order.
    pub fn default_pipeline(&self) -> Sequential {
        Sequential::new("default", self.passes.clone())
    }
}
