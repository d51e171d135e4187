
use std::sync::Arc;

use strata_dtype::ElementType;

use crate::error::Result;
use crate::{Expr, Function, LetList, Type, Var};

pub(crate) fn f32_tensor(dims: &[i64]) -> Type {
    Type::tensor(ElementType::F32, dims.iter().copied())
}

/// Differentiated training step around a batch norm:
///
/// ```text
/// fn (%x) {
///   let %bn = nn.batch_norm(%x);
///   let %out = %bn.0;
///   let %mean = %bn.1;
///   let %var = %bn.2;
///   let %fwd = (%out, %mean, %var);
///   let %bwd = fn (%t) { <closure body> };
///   let %ret = (%fwd, %bwd);
///   %ret
/// }
/// ```
pub(crate) struct Trace {
    pub func: Arc<Function>,
    pub x: Var,
    pub out: Var,
    pub mean: Var,
    pub var: Var,
    pub fwd: Var,
    pub bwd: Var,
    pub t: Var,
    pub ret: Var,
}

/// `let %g = %t.0; let %dx = multiply(%g, %x); %dx`
pub(crate) fn dy_only_body(t: &Var, x: &Var) -> Result<Expr> {
    LetList::with(|ll| {
        let g = ll.push_fresh("g", f32_tensor(&[8, 3]), Expr::tuple_get_item(t.into(), 0));
        let dx = ll.push_fresh("dx", f32_tensor(&[8, 3]), Expr::call_op("multiply", [g.into(), x.into()]));
        Ok(dx.into())
    })
}

pub(crate) fn batch_norm_trace<F>(closure_body: F) -> Trace
where
    F: FnOnce(&Var, &Var) -> Result<Expr>,
{
    let x = Var::new("x", f32_tensor(&[8, 3]));
    let out = Var::new("out", f32_tensor(&[8, 3]));
    let mean = Var::new("mean", f32_tensor(&[3]));
    let var = Var::new("var", f32_tensor(&[3]));
    let fwd_type = Type::tuple([f32_tensor(&[8, 3]), f32_tensor(&[3]), f32_tensor(&[3])]);
    let fwd = Var::new("fwd", fwd_type.clone());
    let t = Var::new("t", fwd_type.clone());
    let bwd_type = Type::func([fwd_type.clone()], f32_tensor(&[8, 3]));
    let bwd = Var::new("bwd", bwd_type.clone());
    let ret = Var::new("ret", Type::tuple([fwd_type.clone(), bwd_type.clone()]));

    let closure = Function::new([t.clone()], closure_body(&t, &x).unwrap()).with_ret_type(f32_tensor(&[8, 3]));
    let body = LetList::with(|ll| {
        let bn = ll.push_fresh("bn", fwd_type.clone(), Expr::call_op("nn.batch_norm", [Expr::from(&x)]));
        ll.push(out.clone(), Expr::tuple_get_item(bn.clone().into(), 0))?;
        ll.push(mean.clone(), Expr::tuple_get_item(bn.clone().into(), 1))?;
        ll.push(var.clone(), Expr::tuple_get_item(bn.into(), 2))?;
        ll.push(fwd.clone(), Expr::tuple([Expr::from(&out), Expr::from(&mean), Expr::from(&var)]))?;
        ll.push(bwd.clone(), Expr::function(closure))?;
        ll.push(ret.clone(), Expr::tuple([Expr::from(&fwd), Expr::from(&bwd)]))?;
        Ok(Expr::from(&ret))
    })
    .unwrap();

    let func = Function::new([x.clone()], body).with_ret_type(Type::tuple([fwd_type, bwd_type]));
    Trace { func: Arc::new(func), x, out, mean, var, fwd, bwd, t, ret }
}

/// Same step with a single forward output: `(%out, %bwd)` is returned.
pub(crate) fn single_output_trace() -> Arc<Function> {
    let x = Var::new("x", f32_tensor(&[8, 3]));
    let t = Var::new("t", Type::tuple([f32_tensor(&[8, 3])]));
    let closure = Function::new([t.clone()], dy_only_body(&t, &x).unwrap());

    let body = LetList::with(|ll| {
        let out = ll.push_fresh("out", f32_tensor(&[8, 3]), Expr::call_op("nn.relu", [Expr::from(&x)]));
        let bwd = ll.push_fresh("bwd", Type::Unknown, Expr::function(closure));
        let ret = ll.push_fresh("ret", Type::Unknown, Expr::tuple([out.into(), bwd.into()]));
        Ok(ret.into())
    })
    .unwrap();
    Arc::new(Function::new([x], body))
}
