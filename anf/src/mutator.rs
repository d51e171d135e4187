//! Structural expression rewriting.
//!
//! [`ExprMutator::mutate`] dispatches on the expression kind to a `visit_*`
//! hook. A pass overrides the hooks for the kinds it rewrites; the default
//! hooks call the matching `walk_*` function, which rebuilds the node from its
//! mutated children.
//!
//! # Sharing
//!
//! When no child changed, the walkers return the original `Arc` instead of a
//! copy, so a mutator that rewrites nothing returns an expression that is
//! [`ptr_eq`](Expr::ptr_eq) to its input.
//!
//! Let chains are walked with an explicit loop rather than by recursion on the
//! `body`, so long function bodies do not grow the stack.

use crate::error::Result;
use crate::expr::{Expr, ExprKind, Function, Var};

pub trait ExprMutator {
    fn mutate(&mut self, expr: &Expr) -> Result<Expr> {
        match expr.kind() {
            ExprKind::Var(var) => self.visit_var(expr, var),
            ExprKind::Constant(_) | ExprKind::Op(_) | ExprKind::GlobalVar(_) => self.visit_leaf(expr),
            ExprKind::Call { callee, args } => self.visit_call(expr, callee, args),
            ExprKind::Tuple(fields) => self.visit_tuple(expr, fields),
            ExprKind::TupleGetItem { tuple, index } => self.visit_tuple_get_item(expr, tuple, *index),
            ExprKind::Function(func) => self.visit_function(expr, func),
            ExprKind::Let { .. } => self.visit_let(expr),
            ExprKind::If { cond, then_branch, else_branch } => self.visit_if(expr, cond, then_branch, else_branch),
        }
    }

    fn visit_var(&mut self, expr: &Expr, _var: &Var) -> Result<Expr> {
        Ok(expr.clone())
    }

    /// Constants, operators and global references.
    fn visit_leaf(&mut self, expr: &Expr) -> Result<Expr> {
        Ok(expr.clone())
    }

    fn visit_call(&mut self, expr: &Expr, callee: &Expr, args: &[Expr]) -> Result<Expr> {
        walk_call(self, expr, callee, args)
    }

    fn visit_tuple(&mut self, expr: &Expr, fields: &[Expr]) -> Result<Expr> {
        walk_tuple(self, expr, fields)
    }

    fn visit_tuple_get_item(&mut self, expr: &Expr, tuple: &Expr, index: usize) -> Result<Expr> {
        walk_tuple_get_item(self, expr, tuple, index)
    }

    fn visit_function(&mut self, expr: &Expr, func: &Function) -> Result<Expr> {
        walk_function(self, expr, func)
    }

    /// Whole let chain starting at `expr`.
    fn visit_let(&mut self, expr: &Expr) -> Result<Expr> {
        walk_let(self, expr)
    }

    /// Value of one binding inside a let chain.
    fn visit_binding(&mut self, _var: &Var, value: &Expr) -> Result<Expr> {
        self.mutate(value)
    }

    fn visit_if(&mut self, expr: &Expr, cond: &Expr, then_branch: &Expr, else_branch: &Expr) -> Result<Expr> {
        walk_if(self, expr, cond, then_branch, else_branch)
    }
}

/// Mutate each expression; `None` when all results are the originals.
fn mutate_all<M: ExprMutator + ?Sized>(mutator: &mut M, exprs: &[Expr]) -> Result<Option<Vec<Expr>>> {
    let mut changed = false;
    let mut out = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let new = mutator.mutate(expr)?;
        changed |= !new.ptr_eq(expr);
        out.push(new);
    }
    Ok(changed.then_some(out))
}

pub fn walk_call<M: ExprMutator + ?Sized>(mutator: &mut M, expr: &Expr, callee: &Expr, args: &[Expr]) -> Result<Expr> {
    let new_callee = mutator.mutate(callee)?;
    let new_args = mutate_all(mutator, args)?;
    if new_callee.ptr_eq(callee) && new_args.is_none() {
        return Ok(expr.clone());
    }
    Ok(Expr::call(new_callee, new_args.unwrap_or_else(|| args.to_vec())))
}

pub fn walk_tuple<M: ExprMutator + ?Sized>(mutator: &mut M, expr: &Expr, fields: &[Expr]) -> Result<Expr> {
    Ok(match mutate_all(mutator, fields)? {
        Some(fields) => Expr::tuple(fields),
        None => expr.clone(),
    })
}

pub fn walk_tuple_get_item<M: ExprMutator + ?Sized>(
    mutator: &mut M,
    expr: &Expr,
    tuple: &Expr,
    index: usize,
) -> Result<Expr> {
    let new_tuple = mutator.mutate(tuple)?;
    if new_tuple.ptr_eq(tuple) {
        return Ok(expr.clone());
    }
    Ok(Expr::tuple_get_item(new_tuple, index))
}

pub fn walk_function<M: ExprMutator + ?Sized>(mutator: &mut M, expr: &Expr, func: &Function) -> Result<Expr> {
    let body = mutator.mutate(&func.body)?;
    if body.ptr_eq(&func.body) {
        return Ok(expr.clone());
    }
    Ok(Expr::function(Function { body, ..func.clone() }))
}

pub fn walk_let<M: ExprMutator + ?Sized>(mutator: &mut M, expr: &Expr) -> Result<Expr> {
    let mut chain = Vec::new();
    let mut cursor = expr;
    while let ExprKind::Let { var, value, body } = cursor.kind() {
        let new_value = mutator.visit_binding(var, value)?;
        chain.push((cursor, var, value, body, new_value));
        cursor = body;
    }
    let mut result = mutator.mutate(cursor)?;

    // Rebuild inside out; an unchanged suffix keeps its original nodes.
    for (link, var, value, body, new_value) in chain.into_iter().rev() {
        result = if new_value.ptr_eq(value) && result.ptr_eq(body) {
            link.clone()
        } else {
            Expr::let_in(var.clone(), new_value, result)
        };
    }
    Ok(result)
}

pub fn walk_if<M: ExprMutator + ?Sized>(
    mutator: &mut M,
    expr: &Expr,
    cond: &Expr,
    then_branch: &Expr,
    else_branch: &Expr,
) -> Result<Expr> {
    let new_cond = mutator.mutate(cond)?;
    let new_then = mutator.mutate(then_branch)?;
    let new_else = mutator.mutate(else_branch)?;
    if new_cond.ptr_eq(cond) && new_then.ptr_eq(then_branch) && new_else.ptr_eq(else_branch) {
        return Ok(expr.clone());
    }
    Ok(Expr::if_then_else(new_cond, new_then, new_else))
}

/// Apply `mutator` to the body of `func`; returns `None` if nothing changed.
pub fn mutate_function<M: ExprMutator + ?Sized>(mutator: &mut M, func: &Function) -> Result<Option<Function>> {
    let body = mutator.mutate(&func.body)?;
    Ok((!body.ptr_eq(&func.body)).then(|| Function { body, ..func.clone() }))
}
