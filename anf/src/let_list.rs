//! Builders and views for let chains.
//!
//! [`LetList`] accumulates bindings while a pass constructs a new function
//! body; [`ExplicitLetList`] takes an existing body apart into its bindings
//! and trailing return variable.

use std::collections::HashSet;

use snafu::ensure;

use crate::error::*;
use crate::expr::{Expr, ExprKind, Type, Var};

/// Ordered accumulator of `let` bindings.
#[derive(Debug, Default)]
pub struct LetList {
    bindings: Vec<(Var, Expr)>,
    bound: HashSet<Var>,
}

impl LetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `let var = expr`. Returns `var` for fluent use.
    ///
    /// A variable can be bound at most once per list.
    pub fn push(&mut self, var: Var, expr: Expr) -> Result<Var> {
        ensure!(!self.bound.contains(&var), DuplicateBindingSnafu { var: var.to_string() });
        self.bound.insert(var.clone());
        self.bindings.push((var.clone(), expr));
        Ok(var)
    }

    /// Bind `expr` to a new variable.
    pub fn push_fresh(&mut self, name_hint: &str, ty: Type, expr: Expr) -> Var {
        let var = Var::new(name_hint, ty);
        self.bound.insert(var.clone());
        self.bindings.push((var.clone(), expr));
        var
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[(Var, Expr)] {
        &self.bindings
    }

    /// Close the list: every binding in push order, then `ret`.
    pub fn get(self, ret: Expr) -> Expr {
        self.bindings.into_iter().rev().fold(ret, |body, (var, value)| Expr::let_in(var, value, body))
    }

    /// Run `build` against a fresh list and wrap its result in the pushed bindings.
    pub fn with<F>(build: F) -> Result<Expr>
    where
        F: FnOnce(&mut LetList) -> Result<Expr>,
    {
        let mut list = LetList::new();
        let ret = build(&mut list)?;
        Ok(list.get(ret))
    }
}

/// A let chain split into parallel `vars`/`exprs` plus the returned variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitLetList {
    pub vars: Vec<Var>,
    pub exprs: Vec<Expr>,
    pub ret: Var,
}

impl ExplicitLetList {
    /// Destructure `body`, which must be `let`s terminated by a variable.
    pub fn make(body: &Expr) -> Result<Self> {
        let mut vars = Vec::new();
        let mut exprs = Vec::new();
        let mut seen = HashSet::new();

        let mut cursor = body;
        while let ExprKind::Let { var, value, body } = cursor.kind() {
            ensure!(seen.insert(var.clone()), MalformedAnfSnafu { reason: format!("{var} is bound twice") });
            vars.push(var.clone());
            exprs.push(value.clone());
            cursor = body;
        }

        let Some(ret) = cursor.as_var() else {
            return MalformedAnfSnafu { reason: format!("let chain must end in a variable, found `{cursor}`") }.fail();
        };
        Ok(Self { vars, exprs, ret: ret.clone() })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Position of the binding of `var`, if it is bound in this chain.
    pub fn position(&self, var: &Var) -> Option<usize> {
        self.vars.iter().position(|v| v == var)
    }

    /// Value bound to `var`, if it is bound in this chain.
    pub fn value_of(&self, var: &Var) -> Option<&Expr> {
        self.position(var).map(|i| &self.exprs[i])
    }

    pub fn into_expr(self) -> Expr {
        self.vars.into_iter().zip(self.exprs).rev().fold(Expr::from(self.ret), |body, (var, value)| {
            Expr::let_in(var, value, body)
        })
    }
}
