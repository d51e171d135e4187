//! Variable scoping queries and the well-formedness checker.

use std::collections::HashSet;

use snafu::ensure;

use crate::error::*;
use crate::expr::{Expr, ExprKind, Function, Var};

/// Variables used in `expr` without being bound inside it, in first-use order.
pub fn free_vars(expr: &Expr) -> Vec<Var> {
    let mut collector = FreeVars::default();
    collector.visit(expr);
    collector.free
}

/// Every `let` variable and function parameter bound inside `expr`, in binding order.
pub fn bound_vars(expr: &Expr) -> Vec<Var> {
    let mut out = Vec::new();
    collect_bound(expr, &mut out);
    out
}

#[derive(Default)]
struct FreeVars {
    scope: HashSet<Var>,
    seen: HashSet<Var>,
    free: Vec<Var>,
}

impl FreeVars {
    fn visit(&mut self, expr: &Expr) {
        match expr.kind() {
            ExprKind::Var(var) => {
                if !self.scope.contains(var) && self.seen.insert(var.clone()) {
                    self.free.push(var.clone());
                }
            }
            ExprKind::Constant(_) | ExprKind::Op(_) | ExprKind::GlobalVar(_) => {}
            ExprKind::Call { callee, args } => {
                self.visit(callee);
                args.iter().for_each(|arg| self.visit(arg));
            }
            ExprKind::Tuple(fields) => fields.iter().for_each(|field| self.visit(field)),
            ExprKind::TupleGetItem { tuple, .. } => self.visit(tuple),
            ExprKind::Function(func) => {
                let introduced: Vec<Var> =
                    func.params.iter().filter(|p| self.scope.insert((*p).clone())).cloned().collect();
                self.visit(&func.body);
                introduced.iter().for_each(|p| {
                    self.scope.remove(p);
                });
            }
            ExprKind::Let { .. } => {
                let mut introduced = Vec::new();
                let mut cursor = expr;
                while let ExprKind::Let { var, value, body } = cursor.kind() {
                    self.visit(value);
                    if self.scope.insert(var.clone()) {
                        introduced.push(var.clone());
                    }
                    cursor = body;
                }
                self.visit(cursor);
                for var in &introduced {
                    self.scope.remove(var);
                }
            }
            ExprKind::If { cond, then_branch, else_branch } => {
                self.visit(cond);
                self.visit(then_branch);
                self.visit(else_branch);
            }
        }
    }
}

fn collect_bound(expr: &Expr, out: &mut Vec<Var>) {
    match expr.kind() {
        ExprKind::Var(_) | ExprKind::Constant(_) | ExprKind::Op(_) | ExprKind::GlobalVar(_) => {}
        ExprKind::Call { callee, args } => {
            collect_bound(callee, out);
            args.iter().for_each(|arg| collect_bound(arg, out));
        }
        ExprKind::Tuple(fields) => fields.iter().for_each(|field| collect_bound(field, out)),
        ExprKind::TupleGetItem { tuple, .. } => collect_bound(tuple, out),
        ExprKind::Function(func) => {
            out.extend(func.params.iter().cloned());
            collect_bound(&func.body, out);
        }
        ExprKind::Let { .. } => {
            let mut cursor = expr;
            while let ExprKind::Let { var, value, body } = cursor.kind() {
                out.push(var.clone());
                collect_bound(value, out);
                cursor = body;
            }
            collect_bound(cursor, out);
        }
        ExprKind::If { cond, then_branch, else_branch } => {
            collect_bound(cond, out);
            collect_bound(then_branch, out);
            collect_bound(else_branch, out);
        }
    }
}

/// Check that every variable of `func` is bound exactly once and only used in scope.
///
/// Nested functions may capture variables of the enclosing scopes.
pub fn check_well_formed(func: &Function) -> Result<()> {
    let mut checker = WellFormed::default();
    checker.function(func)
}

#[derive(Default)]
struct WellFormed {
    scope: HashSet<Var>,
    ever_bound: HashSet<Var>,
}

impl WellFormed {
    fn bind(&mut self, var: &Var) -> Result<()> {
        ensure!(self.ever_bound.insert(var.clone()), IllFormedSnafu { reason: format!("{var} is bound more than once") });
        self.scope.insert(var.clone());
        Ok(())
    }

    fn function(&mut self, func: &Function) -> Result<()> {
        for param in &func.params {
            self.bind(param)?;
        }
        self.expr(&func.body)?;
        for param in &func.params {
            self.scope.remove(param);
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<()> {
        match expr.kind() {
            ExprKind::Var(var) => {
                ensure!(self.scope.contains(var), IllFormedSnafu { reason: format!("{var} is used out of scope") });
                Ok(())
            }
            ExprKind::Constant(_) | ExprKind::Op(_) | ExprKind::GlobalVar(_) => Ok(()),
            ExprKind::Call { callee, args } => {
                self.expr(callee)?;
                args.iter().try_for_each(|arg| self.expr(arg))
            }
            ExprKind::Tuple(fields) => fields.iter().try_for_each(|field| self.expr(field)),
            ExprKind::TupleGetItem { tuple, .. } => self.expr(tuple),
            ExprKind::Function(func) => self.function(func),
            ExprKind::Let { .. } => {
                let mut introduced = Vec::new();
                let mut cursor = expr;
                while let ExprKind::Let { var, value, body } = cursor.kind() {
                    self.expr(value)?;
                    self.bind(var)?;
                    introduced.push(var);
                    cursor = body;
                }
                self.expr(cursor)?;
                for var in introduced {
                    self.scope.remove(var);
                }
                Ok(())
            }
            ExprKind::If { cond, then_branch, else_branch } => {
                self.expr(cond)?;
                self.expr(then_branch)?;
                self.expr(else_branch)
            }
        }
    }
}
