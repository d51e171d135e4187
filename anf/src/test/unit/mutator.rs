use crate::error::Result;
use crate::mutator::{ExprMutator, mutate_function, walk_call};
use crate::test::{batch_norm_trace, dy_only_body};
use crate::{Expr, ExprKind, LetList, Literal, Type, Var};

/// Mutator relying on the default hooks only.
struct Identity;

impl ExprMutator for Identity {}

/// Renames calls of one primitive operator.
struct RenameOp {
    from: &'static str,
    to: &'static str,
    rewrites: usize,
}

impl ExprMutator for RenameOp {
    fn visit_call(&mut self, expr: &Expr, callee: &Expr, args: &[Expr]) -> Result<Expr> {
        if let ExprKind::Op(name) = callee.kind()
            && name == self.from
        {
            self.rewrites += 1;
            let args = args.iter().map(|arg| self.mutate(arg)).collect::<Result<Vec<_>>>()?;
            return Ok(Expr::call_op(self.to, args));
        }
        walk_call(self, expr, callee, args)
    }
}

#[test]
fn test_identity_preserves_sharing() {
    let trace = batch_norm_trace(dy_only_body);
    let result = Identity.mutate(&trace.func.body).unwrap();

    assert!(result.ptr_eq(&trace.func.body));
    assert!(mutate_function(&mut Identity, &trace.func).unwrap().is_none());
}

#[test]
fn test_rewrite_inside_closure() {
    let trace = batch_norm_trace(dy_only_body);
    let mut rename = RenameOp { from: "multiply", to: "mul", rewrites: 0 };

    let rewritten = mutate_function(&mut rename, &trace.func).unwrap().unwrap();

    assert_eq!(rename.rewrites, 1);
    assert!(rewritten.to_string().contains("mul(%g, %x)"));
    assert!(!rewritten.to_string().contains("multiply"));
    assert!(trace.func.to_string().contains("multiply(%g, %x)"));
}

#[test]
fn test_rewrite_shares_untouched_prefix_values() {
    let trace = batch_norm_trace(dy_only_body);
    let mut rename = RenameOp { from: "multiply", to: "mul", rewrites: 0 };
    let rewritten = rename.mutate(&trace.func.body).unwrap();

    let mut original = &trace.func.body;
    let mut updated = &rewritten;
    let mut shared = 0;
    while let (ExprKind::Let { var: v1, value: e1, body: b1 }, ExprKind::Let { var: v2, value: e2, body: b2 }) =
        (original.kind(), updated.kind())
    {
        assert_eq!(v1, v2);
        if e1.ptr_eq(e2) {
            shared += 1;
        }
        original = b1;
        updated = b2;
    }
    // Every binding except the closure keeps its value node.
    assert_eq!(shared, 6);
}

#[test]
fn test_unchanged_suffix_keeps_identity() {
    let (a, b) = (Var::new("a", Type::Unknown), Var::new("b", Type::Unknown));
    let body = LetList::with(|ll| {
        ll.push(a.clone(), Expr::call_op("multiply", [Expr::constant(Literal::Int(2))]))?;
        ll.push(b.clone(), Expr::call_op("exp", [Expr::from(&a)]))?;
        Ok(Expr::from(&b))
    })
    .unwrap();
    let ExprKind::Let { body: suffix, .. } = body.kind() else { panic!("expected a let") };

    let rewritten = RenameOp { from: "multiply", to: "mul", rewrites: 0 }.mutate(&body).unwrap();
    let ExprKind::Let { body: new_suffix, .. } = rewritten.kind() else { panic!("expected a let") };

    assert!(!rewritten.ptr_eq(&body));
    assert!(new_suffix.ptr_eq(suffix));
}

#[test]
fn test_long_let_chain() {
    let body = LetList::with(|ll| {
        let mut last = ll.push_fresh("v", Type::Unknown, Expr::constant(Literal::Int(0)));
        for _ in 0..1_000 {
            last = ll.push_fresh("v", Type::Unknown, Expr::call_op("multiply", [Expr::from(&last)]));
        }
        Ok(last.into())
    })
    .unwrap();

    let mut rename = RenameOp { from: "multiply", to: "mul", rewrites: 0 };
    rename.mutate(&body).unwrap();
    assert_eq!(rename.rewrites, 1_000);
    assert!(Identity.mutate(&body).unwrap().ptr_eq(&body));
}

#[test]
fn test_if_branches_are_walked() {
    let c = Var::new("c", Type::Unknown);
    let expr = Expr::if_then_else(
        Expr::from(&c),
        Expr::call_op("multiply", [Expr::from(&c)]),
        Expr::call_op("exp", [Expr::from(&c)]),
    );
    let ExprKind::If { else_branch, .. } = expr.kind() else { panic!("expected an if") };

    let rewritten = RenameOp { from: "multiply", to: "mul", rewrites: 0 }.mutate(&expr).unwrap();
    let ExprKind::If { then_branch: new_then, else_branch: new_else, .. } = rewritten.kind() else {
        panic!("expected an if")
    };

    assert_eq!(*new_then, Expr::call_op("mul", [Expr::from(&c)]));
    assert!(new_else.ptr_eq(else_branch));
}
