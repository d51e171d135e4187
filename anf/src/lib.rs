//! A-normal-form programs and module-level rewrite passes.
//!
//! Functions are immutable expression trees in which every intermediate value
//! is bound by a `let` before use. Passes transform whole [`Module`]s and never
//! modify their input; the [`SharedModule`] slot swaps in a pass result only
//! once it has been fully built.
//!
//! # Module Organization
//!
//! - [`expr`] - Types, variables, expressions and functions
//! - [`let_list`] - Building and destructuring let chains
//! - [`analysis`] - Free/bound variables and the well-formedness checker
//! - [`mutator`] - Structural rewriting with sharing of unchanged subtrees
//! - [`module`] - Immutable modules and the active-module slot
//! - [`pass`] - Pass trait, function rewrite driver and pipelines
//! - [`registry`] - Named pass registry
//! - [`passes`] - Built-in passes
//! - [`config`] - Pass pipeline settings
//! - [`error`] - Error types and result handling

pub mod analysis;
pub mod config;
pub mod error;
pub mod expr;
pub mod let_list;
pub mod module;
pub mod mutator;
pub mod pass;
pub mod passes;
mod printer;
pub mod registry;

#[cfg(test)]
mod test;

pub use config::PassContext;
pub use error::{Error, Result};
pub use expr::{Expr, ExprKind, Function, Literal, Type, Var};
pub use let_list::{ExplicitLetList, LetList};
pub use module::{BaseFunc, Module, SharedModule};
pub use mutator::ExprMutator;
pub use pass::{ModulePass, Sequential, run_on_function};
pub use passes::{CanonicalizeBackwardClosure, canonicalize_backward_closure};
pub use registry::PassRegistry;

pub use strata_dtype::ElementType;
