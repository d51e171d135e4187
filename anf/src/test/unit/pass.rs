use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use test_case::test_case;

use crate::error::{Error, Result};
use crate::test::{Trace, batch_norm_trace, dy_only_body, f32_tensor};
use crate::{
    CanonicalizeBackwardClosure, Expr, Function, Module, ModulePass, PassContext, PassRegistry, Sequential, Type, Var,
    run_on_function,
};

/// Counts its runs and otherwise returns the module unchanged.
struct Probe {
    name: &'static str,
    opt_level: u32,
    runs: AtomicUsize,
}

impl Probe {
    fn new(name: &'static str, opt_level: u32) -> Arc<Self> {
        Arc::new(Self { name, opt_level, runs: AtomicUsize::new(0) })
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }
}

impl ModulePass for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn opt_level(&self) -> u32 {
        self.opt_level
    }

    fn run(&self, module: &Module, _ctx: &PassContext) -> Result<Module> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        Ok(module.clone())
    }
}

/// Rebinds `main` to a function using an unbound variable.
struct Corrupt;

impl ModulePass for Corrupt {
    fn name(&self) -> &str {
        "Corrupt"
    }

    fn run(&self, module: &Module, _ctx: &PassContext) -> Result<Module> {
        let stray = Var::new("stray", Type::Unknown);
        Ok(module.with_function("main", Function::new(Vec::<Var>::new(), Expr::from(&stray))))
    }
}

fn trace_module() -> Module {
    let Trace { func, .. } = batch_norm_trace(dy_only_body);
    Module::new().with_function("main", func)
}

#[test]
fn test_run_on_function_rebinds_entry() {
    let module = trace_module();
    let replacement = Arc::new(Function::new(Vec::<Var>::new(), Expr::global("main")));

    let result = run_on_function(&module, "main", |_| Ok(Arc::clone(&replacement))).unwrap();

    assert!(Arc::ptr_eq(result.lookup_function("main").unwrap(), &replacement));
    assert!(!Arc::ptr_eq(module.lookup_function("main").unwrap(), &replacement));
}

#[test]
fn test_run_on_function_unchanged_returns_same_module() {
    let module = trace_module();
    let result = run_on_function(&module, "main", |func| Ok(Arc::clone(func))).unwrap();
    assert!(result.ptr_eq(&module));
}

#[test]
fn test_run_on_function_missing_entry() {
    let module = trace_module();
    let called = std::cell::Cell::new(false);

    let err = run_on_function(&module, "step", |func| {
        called.set(true);
        Ok(Arc::clone(func))
    })
    .unwrap_err();

    assert_eq!(err, Error::UndefinedSymbol { name: "step".to_string() });
    assert!(!called.get());
}

#[test_case(0, false; "level zero skips")]
#[test_case(1, true; "level one runs")]
#[test_case(3, true; "higher levels run")]
fn test_opt_level_gating(opt_level: u32, expect_run: bool) {
    let probe = Probe::new("Probe", 1);
    let ctx = PassContext::builder().opt_level(opt_level).build();

    assert_eq!(ctx.is_enabled(probe.as_ref()), expect_run);
    Sequential::new("pipeline", vec![probe.clone()]).run(&trace_module(), &ctx).unwrap();
    assert_eq!(probe.runs(), usize::from(expect_run));
}

#[test]
fn test_disabled_pass_is_skipped() {
    let probe = Probe::new("Probe", 0);
    let other = Probe::new("Other", 0);
    let ctx = PassContext::builder().disabled(vec!["Probe".to_string()]).build();

    Sequential::new("pipeline", vec![probe.clone(), other.clone()]).run(&trace_module(), &ctx).unwrap();

    assert_eq!(probe.runs(), 0);
    assert_eq!(other.runs(), 1);
}

#[test]
fn test_pipeline_wraps_failures() {
    let pipeline = Sequential::new("pipeline", vec![Arc::new(CanonicalizeBackwardClosure)]);
    let module = Module::new();

    let err = pipeline.run(&module, &PassContext::default()).unwrap_err();

    assert_eq!(err, Error::PassFailed {
        pass: "CanonicalizeBackwardClosure".to_string(),
        source: Box::new(Error::UndefinedSymbol { name: "main".to_string() }),
    });
}

#[test]
fn test_pipeline_verifies_when_asked() {
    let pipeline = Sequential::new("pipeline", vec![Arc::new(Corrupt)]);

    let unchecked = PassContext::builder().verify(false).build();
    assert!(pipeline.run(&trace_module(), &unchecked).is_ok());

    let checked = PassContext::builder().verify(true).build();
    let err = pipeline.run(&trace_module(), &checked).unwrap_err();
    assert!(matches!(err, Error::PassFailed { ref source, .. } if matches!(**source, Error::IllFormed { .. })));
}

#[test]
fn test_pipeline_chains_results() {
    let probe = Probe::new("Probe", 0);
    let pipeline = Sequential::new("pipeline", vec![Arc::new(CanonicalizeBackwardClosure), probe.clone()]);
    let module = trace_module();
    let ctx = PassContext::builder().verify(true).build();

    let result = pipeline.run(&module, &ctx).unwrap();

    assert_eq!(probe.runs(), 1);
    assert!(!result.ptr_eq(&module));
    let main = result.lookup_function("main").unwrap();
    assert!(main.to_string().contains("%dy: f32[8,3]"));
}

#[test]
fn test_registry_builtins() {
    let registry = PassRegistry::with_builtin_passes().unwrap();

    assert_eq!(registry.names().collect::<Vec<_>>(), ["CanonicalizeBackwardClosure"]);
    let pass = registry.get("CanonicalizeBackwardClosure").unwrap();
    assert_eq!(pass.opt_level(), 1);
    assert!(registry.get("DeadCodeElimination").is_none());
}

#[test]
fn test_registry_keeps_registration_order() {
    let mut registry = PassRegistry::new();
    for name in ["Zeta", "Alpha", "Mid"] {
        registry.register(Probe::new(name, 0)).unwrap();
    }
    assert_eq!(registry.names().collect::<Vec<_>>(), ["Zeta", "Alpha", "Mid"]);
    assert_eq!(registry.default_pipeline().passes().len(), 3);
}

#[test]
fn test_registry_rejects_duplicates() {
    let mut registry = PassRegistry::with_builtin_passes().unwrap();

    let err = registry.register(Arc::new(CanonicalizeBackwardClosure)).unwrap_err();
    assert_eq!(err, Error::DuplicatePass { name: "CanonicalizeBackwardClosure".to_string() });
    assert_eq!(registry.names().count(), 1);
}

#[test]
fn test_build_pipeline_by_name() {
    let mut registry = PassRegistry::with_builtin_passes().unwrap();
    let probe = Probe::new("Probe", 0);
    registry.register(probe.clone()).unwrap();

    let pipeline = registry.build_pipeline("train", &["Probe", "CanonicalizeBackwardClosure", "Probe"]).unwrap();
    pipeline.run(&trace_module(), &PassContext::default()).unwrap();
    assert_eq!(probe.runs(), 2);

    let err = registry.build_pipeline("train", &["Probe", "Fuse"]).unwrap_err();
    assert_eq!(err, Error::UnknownPass { name: "Fuse".to_string() });
}

#[test]
fn test_entry_parameter_types_survive() {
    let module = trace_module();
    let result = CanonicalizeBackwardClosure.run(&module, &PassContext::default()).unwrap();
    let main = result.lookup_function("main").unwrap();
    assert_eq!(main.params[0].ty(), &f32_tensor(&[8, 3]));
}
