use std::sync::Arc;

use proptest::prelude::*;

use crate::analysis::check_well_formed;
use crate::mutator::ExprMutator;
use crate::{ExplicitLetList, Expr, Function, LetList, Literal, Type, Var, canonicalize_backward_closure};

/// Binding recipe: each step is an operator name and operand positions
/// among the variables bound so far (the first is always a constant).
fn arb_chain() -> impl Strategy<Value = Vec<(String, Vec<usize>)>> {
    let op = prop::sample::select(vec!["add", "multiply", "exp", "negative", "tuple"]);
    prop::collection::vec((op.prop_map(str::to_string), prop::collection::vec(any::<usize>(), 0..4)), 1..32)
}

fn build(recipe: &[(String, Vec<usize>)]) -> (Vec<Var>, Vec<Expr>, Expr) {
    let mut vars: Vec<Var> = Vec::new();
    let mut exprs = Vec::new();
    let body = LetList::with(|ll| {
        for (i, (op, operands)) in recipe.iter().enumerate() {
            let value = if i == 0 {
                Expr::constant(Literal::Int(0))
            } else {
                let args = operands.iter().map(|&p| Expr::from(&vars[p % vars.len()]));
                if op == "tuple" { Expr::tuple(args) } else { Expr::call_op(op.as_str(), args) }
            };
            let var = ll.push_fresh(&format!("v{i}"), Type::Unknown, value.clone());
            vars.push(var);
            exprs.push(value);
        }
        Ok(Expr::from(&vars[vars.len() - 1]))
    })
    .unwrap();
    (vars, exprs, body)
}

struct Identity;

impl ExprMutator for Identity {}

proptest! {
    #[test]
    fn let_list_round_trip(recipe in arb_chain()) {
        let (vars, exprs, body) = build(&recipe);
        let ell = ExplicitLetList::make(&body).unwrap();

        prop_assert_eq!(&ell.vars, &vars);
        prop_assert_eq!(&ell.exprs, &exprs);
        prop_assert_eq!(&ell.ret, vars.last().unwrap());
        prop_assert_eq!(ell.into_expr(), body);
    }

    #[test]
    fn built_chains_are_well_formed(recipe in arb_chain()) {
        let (_, _, body) = build(&recipe);
        prop_assert!(check_well_formed(&Function::new(Vec::<Var>::new(), body)).is_ok());
    }

    #[test]
    fn identity_mutation_shares_everything(recipe in arb_chain()) {
        let (_, _, body) = build(&recipe);
        prop_assert!(Identity.mutate(&body).unwrap().ptr_eq(&body));
    }

    #[test]
    fn functions_without_closure_pair_are_rejected_or_kept(recipe in arb_chain()) {
        let (_, _, body) = build(&recipe);
        let func = Arc::new(Function::new(Vec::<Var>::new(), body));

        match canonicalize_backward_closure(&func) {
            Ok(result) => prop_assert!(Arc::ptr_eq(&result, &func)),
            Err(err) => prop_assert!(matches!(err, crate::Error::MalformedAnf { .. }), "{}", err),
        }
    }
}
