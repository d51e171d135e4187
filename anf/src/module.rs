//! Immutable modules and the swappable active-module slot.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use snafu::OptionExt;

use crate::analysis;
use crate::config::PassContext;
use crate::error::*;
use crate::expr::{Function, Type};
use crate::pass::ModulePass;

/// A module-level definition.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseFunc {
    Function(Arc<Function>),
    /// Declared with a type but implemented outside the module.
    Extern(Type),
}

/// Name to definition map.
///
/// Cloning is cheap and modules are never mutated in place: [`Module::with_function`]
/// returns a new module that shares every other definition with the original.
#[derive(Debug, Clone, Default)]
pub struct Module {
    functions: Arc<BTreeMap<String, BaseFunc>>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_functions<I, S>(functions: I) -> Self
    where
        I: IntoIterator<Item = (S, Function)>,
        S: Into<String>,
    {
        let functions =
            functions.into_iter().map(|(name, func)| (name.into(), BaseFunc::Function(Arc::new(func)))).collect();
        Self { functions: Arc::new(functions) }
    }

    pub fn lookup(&self, name: &str) -> Result<&BaseFunc> {
        self.functions.get(name).context(UndefinedSymbolSnafu { name })
    }

    pub fn lookup_function(&self, name: &str) -> Result<&Arc<Function>> {
        match self.lookup(name)? {
            BaseFunc::Function(func) => Ok(func),
            BaseFunc::Extern(_) => NotAFunctionSnafu { name }.fail(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Definition names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Copy of this module with `name` bound to `func`.
    pub fn with_function(&self, name: impl Into<String>, func: impl Into<Arc<Function>>) -> Module {
        self.with_definition(name.into(), BaseFunc::Function(func.into()))
    }

    pub fn with_extern(&self, name: impl Into<String>, ty: Type) -> Module {
        self.with_definition(name.into(), BaseFunc::Extern(ty))
    }

    fn with_definition(&self, name: String, def: BaseFunc) -> Module {
        let mut functions = (*self.functions).clone();
        functions.insert(name, def);
        Module { functions: Arc::new(functions) }
    }

    /// Whether both values are the same module snapshot.
    pub fn ptr_eq(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.functions, &other.functions)
    }

    /// Run [`analysis::check_well_formed`] on every function.
    pub fn check_well_formed(&self) -> Result<()> {
        for (name, def) in self.functions.iter() {
            if let BaseFunc::Function(func) = def {
                analysis::check_well_formed(func).map_err(|err| match err {
                    Error::IllFormed { reason } => Error::IllFormed { reason: format!("@{name}: {reason}") },
                    other => other,
                })?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, def) in self.functions.iter() {
            match def {
                BaseFunc::Function(func) => writeln!(f, "def @{name} = {func}")?,
                BaseFunc::Extern(ty) => writeln!(f, "extern @{name}: {ty}")?,
            }
        }
        Ok(())
    }
}

/// The active module of a compilation, replaced atomically by passes.
///
/// Readers get a snapshot through [`load`](Self::load); snapshots stay valid
/// after the slot is replaced.
#[derive(Debug, Default)]
pub struct SharedModule {
    current: RwLock<Module>,
}

impl SharedModule {
    pub fn new(module: Module) -> Self {
        Self { current: RwLock::new(module) }
    }

    pub fn load(&self) -> Module {
        self.current.read().clone()
    }

    pub fn store(&self, module: Module) {
        *self.current.write() = module;
    }

    /// Run `pass` on the current module and install its result.
    ///
    /// Other writers are excluded while the pass runs; readers are not. On
    /// failure the current module is left in place.
    pub fn apply(&self, pass: &dyn ModulePass, ctx: &PassContext) -> Result<Module> {
        let guard = self.current.upgradable_read();
        let next = pass.run(&guard, ctx)?;
        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        *guard = next.clone();
        Ok(next)
    }
}
