//! Flatten the forward/backward pair produced by automatic differentiation.
//!
//! The differentiated entry function returns `(forward, bwd)` where `forward`
//! may be a tuple `(out, mutation_1, ...)` and `bwd` takes the matching tuple
//! of output gradients. Only the gradient of `out` is ever supplied, so the
//! pass rewrites
//!
//! ```text
//! let %fwd = (%out, %mean, %var);
//! let %bwd = fn (%t) { ... %t.0 ... };
//! let %ret = (%fwd, %bwd);
//! ```
//!
//! into
//!
//! ```text
//! let %fwd = (%out, %mean, %var);
//! let %bwd = fn (%dy) { ... %dy ... };
//! let %ret = (%out, %mean, %var, %bwd);
//! ```

use std::sync::Arc;

use snafu::{OptionExt, ensure};

use crate::analysis::free_vars;
use crate::config::PassContext;
use crate::error::*;
use crate::expr::{Expr, Function, Type, Var};
use crate::let_list::{ExplicitLetList, LetList};
use crate::module::Module;
use crate::mutator::{ExprMutator, walk_tuple_get_item};
use crate::pass::{ModulePass, run_on_function};

const PASS_NAME: &str = "CanonicalizeBackwardClosure";

/// Module pass applying [`canonicalize_backward_closure`] to the context's entry function.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalizeBackwardClosure;

impl ModulePass for CanonicalizeBackwardClosure {
    fn name(&self) -> &str {
        PASS_NAME
    }

    fn opt_level(&self) -> u32 {
        1
    }

    #[tracing::instrument(skip_all, fields(pass = PASS_NAME, entry = %ctx.entry))]
    fn run(&self, module: &Module, ctx: &PassContext) -> Result<Module> {
        run_on_function(module, &ctx.entry, canonicalize_backward_closure)
    }
}

/// Rewrite `func` so its backward closure takes `dy` alone and its forward
/// outputs are returned flat next to the closure.
///
/// Returns `func` itself when there is nothing to flatten.
pub fn canonicalize_backward_closure(func: &Arc<Function>) -> Result<Arc<Function>> {
    let ell = ExplicitLetList::make(&func.body)?;
    let last = ell.len().checked_sub(1).context(MalformedAnfSnafu { reason: "function body has no bindings" })?;
    ensure!(
        ell.vars[last] == ell.ret,
        MalformedAnfSnafu { reason: format!("function must return its last binding, returns {}", ell.ret) }
    );

    let fields = ell.exprs[last].as_tuple().context(MalformedAnfSnafu {
        reason: format!("function must return a (forward, backward) tuple, returns `{}`", ell.exprs[last]),
    })?;
    ensure!(
        fields.len() >= 2,
        MalformedAnfSnafu { reason: format!("return tuple has {} field(s), expected 2", fields.len()) }
    );
    if fields.len() > 2 {
        ensure_flattened(&ell, fields)?;
        tracing::debug!(fields = fields.len(), "fast path: return tuple is already flat");
        return Ok(Arc::clone(func));
    }

    let (Some(fwd_var), Some(bwd_var)) = (fields[0].as_var(), fields[1].as_var()) else {
        return MalformedAnfSnafu { reason: "return tuple fields must be variables" }.fail();
    };
    let bwd_pos = ell
        .position(bwd_var)
        .context(MalformedAnfSnafu { reason: format!("backward closure {bwd_var} is not bound in the body") })?;
    let closure = ell.exprs[bwd_pos]
        .as_function()
        .context(MalformedAnfSnafu { reason: format!("{bwd_var} is not bound to a function") })?;
    ensure!(
        closure.params.len() == 1,
        MalformedAnfSnafu {
            reason: format!("backward closure must take exactly one parameter, takes {}", closure.params.len())
        }
    );
    let param = &closure.params[0];

    let Some(fwd_fields) = ell.value_of(fwd_var).and_then(Expr::as_tuple) else {
        tracing::debug!("fast path: forward output is not a tuple");
        return Ok(Arc::clone(func));
    };
    if param.ty().is_tensor() {
        tracing::debug!("fast path: backward closure already takes a tensor");
        return Ok(Arc::clone(func));
    }

    for (var, expr) in ell.vars.iter().zip(&ell.exprs).take(last).skip(bwd_pos + 1) {
        ensure!(
            !free_vars(expr).contains(bwd_var),
            UnsupportedPatternSnafu { reason: format!("{var} uses backward closure {bwd_var} before it is returned") }
        );
    }

    let dy_type = param.ty().tuple_fields().and_then(|fields| fields.first()).cloned().unwrap_or(Type::Unknown);
    let dy = Var::new("dy", dy_type);
    let body = ProjectDy { param, dy: &dy }.mutate(&closure.body)?;
    let new_closure = Function {
        params: vec![dy.clone()],
        body,
        ret_type: closure.ret_type.clone(),
        type_params: closure.type_params.clone(),
    };
    let closure_type = new_closure.func_type();
    tracing::debug!(fwd.fields = fwd_fields.len(), "main path: flattened backward closure");

    let body = LetList::with(|ll| {
        for (i, (var, expr)) in ell.vars.iter().zip(&ell.exprs).take(last).enumerate() {
            if i != bwd_pos {
                ll.push(var.clone(), expr.clone())?;
            }
        }
        ll.push(bwd_var.clone(), Expr::function(new_closure))?;
        let flat = fwd_fields.iter().cloned().chain(std::iter::once(Expr::from(bwd_var)));
        ll.push(ell.ret.clone(), Expr::tuple(flat))?;
        Ok(Expr::from(&ell.ret))
    })?;

    Ok(Arc::new(Function {
        params: func.params.clone(),
        body,
        ret_type: flatten_ret_type(&func.ret_type, closure_type),
        type_params: func.type_params.clone(),
    }))
}

/// Accept a wider return tuple only in the shape this pass produces: forward
/// fields followed by a closure over a single tensor gradient.
fn ensure_flattened(ell: &ExplicitLetList, fields: &[Expr]) -> Result<()> {
    let malformed = || MalformedAnfSnafu {
        reason: format!("return tuple has {} fields, expected a (forward, backward) pair", fields.len()),
    };
    let closure = fields
        .last()
        .and_then(Expr::as_var)
        .and_then(|bwd| ell.value_of(bwd))
        .and_then(Expr::as_function)
        .with_context(malformed)?;
    match closure.params.as_slice() {
        [dy] if dy.ty().is_tensor() => Ok(()),
        _ => malformed().fail(),
    }
}

/// `((a, b, ...), bwd)` becomes `(a, b, ..., bwd')`; unannotated stays unannotated.
fn flatten_ret_type(ret_type: &Type, closure_type: Type) -> Type {
    match ret_type.tuple_fields() {
        Some([Type::Tuple(fwd), _]) => Type::tuple(fwd.iter().cloned().chain(std::iter::once(closure_type))),
        _ => Type::Unknown,
    }
}

/// Replaces `%param.0` with `%dy`; any other use of `%param` is rejected.
struct ProjectDy<'a> {
    param: &'a Var,
    dy: &'a Var,
}

impl ExprMutator for ProjectDy<'_> {
    fn visit_tuple_get_item(&mut self, expr: &Expr, tuple: &Expr, index: usize) -> Result<Expr> {
        if tuple.as_var() != Some(self.param) {
            return walk_tuple_get_item(self, expr, tuple, index);
        }
        ensure!(
            index == 0,
            UnsupportedPatternSnafu {
                reason: format!("backward closure reads {}.{index}; only the output gradient (.0) may be used", self.param)
            }
        );
        Ok(Expr::var(self.dy))
    }

    fn visit_var(&mut self, expr: &Expr, var: &Var) -> Result<Expr> {
        ensure!(
            var != self.param,
            UnsupportedPatternSnafu { reason: format!("backward closure uses {var} other than through .0") }
        );
        Ok(expr.clone())
    }
}
