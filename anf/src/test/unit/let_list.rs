use crate::error::Error;
use crate::test::f32_tensor;
use crate::{ExplicitLetList, Expr, ExprKind, LetList, Literal, Type, Var};

#[test]
fn test_bindings_emitted_in_push_order() {
    let a = Var::new("a", Type::Unknown);
    let b = Var::new("b", Type::Unknown);
    let c = Var::new("c", Type::Unknown);

    let body = LetList::with(|ll| {
        ll.push(a.clone(), Expr::constant(Literal::Int(1)))?;
        ll.push(b.clone(), Expr::call_op("negative", [Expr::from(&a)]))?;
        ll.push(c.clone(), Expr::tuple([Expr::from(&a), Expr::from(&b)]))?;
        Ok(Expr::from(&c))
    })
    .unwrap();

    let ell = ExplicitLetList::make(&body).unwrap();
    assert_eq!(ell.vars, vec![a, b, c.clone()]);
    assert_eq!(ell.ret, c);
    assert_eq!(ell.exprs[0], Expr::constant(Literal::Int(1)));
}

#[test]
fn test_push_returns_var() {
    let mut ll = LetList::new();
    let a = Var::new("a", Type::Unknown);
    assert_eq!(ll.push(a.clone(), Expr::op("zeros")).unwrap(), a);
    assert_eq!(ll.len(), 1);
}

#[test]
fn test_duplicate_binding_rejected() {
    let a = Var::new("a", Type::Unknown);
    let result = LetList::with(|ll| {
        ll.push(a.clone(), Expr::constant(Literal::Int(1)))?;
        ll.push(a.clone(), Expr::constant(Literal::Int(2)))?;
        Ok(Expr::from(&a))
    });

    assert_eq!(result.unwrap_err(), Error::DuplicateBinding { var: "%a".to_string() });
}

#[test]
fn test_same_hint_different_vars() {
    let body = LetList::with(|ll| {
        let first = ll.push_fresh("x", Type::Unknown, Expr::constant(Literal::Int(1)));
        let second = ll.push_fresh("x", Type::Unknown, Expr::constant(Literal::Int(2)));
        assert_ne!(first, second);
        Ok(second.into())
    })
    .unwrap();

    assert_eq!(ExplicitLetList::make(&body).unwrap().len(), 2);
}

#[test]
fn test_empty_list_returns_trailing_expr() {
    let x = Var::new("x", Type::Unknown);
    let body = LetList::with(|_| Ok(Expr::from(&x))).unwrap();
    assert_eq!(body.as_var(), Some(&x));

    let ell = ExplicitLetList::make(&body).unwrap();
    assert!(ell.is_empty());
    assert_eq!(ell.ret, x);
}

#[test]
fn test_callback_error_propagates() {
    let result = LetList::with(|ll| {
        ll.push_fresh("a", Type::Unknown, Expr::op("zeros"));
        crate::error::UnsupportedPatternSnafu { reason: "stop" }.fail()
    });
    assert!(matches!(result, Err(Error::UnsupportedPattern { .. })));
}

#[test]
fn test_make_rejects_non_variable_return() {
    let a = Var::new("a", Type::Unknown);
    let body = Expr::let_in(a.clone(), Expr::op("zeros"), Expr::tuple([Expr::from(&a)]));

    assert!(matches!(ExplicitLetList::make(&body), Err(Error::MalformedAnf { .. })));
}

#[test]
fn test_make_rejects_control_flow_tail() {
    let c = Var::new("c", f32_tensor(&[]));
    let body = Expr::let_in(
        c.clone(),
        Expr::constant(Literal::Bool(true)),
        Expr::if_then_else(Expr::from(&c), Expr::constant(Literal::Int(1)), Expr::constant(Literal::Int(2))),
    );

    assert!(matches!(ExplicitLetList::make(&body), Err(Error::MalformedAnf { .. })));
}

#[test]
fn test_make_rejects_rebinding() {
    let a = Var::new("a", Type::Unknown);
    let body = Expr::let_in(a.clone(), Expr::op("zeros"), Expr::let_in(a.clone(), Expr::op("ones"), Expr::from(&a)));

    assert!(matches!(ExplicitLetList::make(&body), Err(Error::MalformedAnf { .. })));
}

#[test]
fn test_into_expr_rebuilds_chain() {
    let a = Var::new("a", Type::Unknown);
    let b = Var::new("b", Type::Unknown);
    let body = LetList::with(|ll| {
        ll.push(a.clone(), Expr::op("zeros"))?;
        ll.push(b.clone(), Expr::call_op("exp", [Expr::from(&a)]))?;
        Ok(Expr::from(&b))
    })
    .unwrap();

    let rebuilt = ExplicitLetList::make(&body).unwrap().into_expr();
    assert_eq!(rebuilt, body);
    assert!(matches!(rebuilt.kind(), ExprKind::Let { var, .. } if *var == a));
}

#[test]
fn test_value_lookup() {
    let a = Var::new("a", Type::Unknown);
    let stray = Var::new("stray", Type::Unknown);
    let body = LetList::with(|ll| {
        ll.push(a.clone(), Expr::op("zeros"))?;
        Ok(Expr::from(&a))
    })
    .unwrap();
    let ell = ExplicitLetList::make(&body).unwrap();

    assert_eq!(ell.position(&a), Some(0));
    assert_eq!(ell.value_of(&a), Some(&Expr::op("zeros")));
    assert_eq!(ell.value_of(&stray), None);
}
