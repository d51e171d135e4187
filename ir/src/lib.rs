//! Intermediate representation for traced tensor computations.
//!
//! Tensor operations are recorded as immutable [`Node`]s in a [`Graph`]. Every
//! node carries a structural hash over its opcode, metadata, output shapes and
//! operand hashes, and the graph collapses structurally equal nodes onto one
//! canonical instance.
//!
//! # Module Organization
//!
//! - [`hash`] - Deterministic structural hashing and the order-sensitive combiner
//! - [`layout`] - Minor-to-major layouts and their builder
//! - [`shape`] - Array and tuple output shapes
//! - [`op`] - Opcodes and opcode-specific metadata
//! - [`node`] - Node, handle and operand edge types
//! - [`graph`] - Arena, deduplication, traversal and garbage collection
//! - [`infer`] - Shape-inference collaborator
//! - [`ops`] - Typed constructors for the built-in opcodes
//! - [`error`] - Error types and result handling

pub mod config;
pub mod error;
pub mod graph;
pub mod hash;
pub mod infer;
pub mod layout;
pub mod node;
pub mod op;
pub mod ops;
pub mod prelude;
pub mod shape;
mod tree;


pub use config::GraphConfig;
pub use error::{Error, Result, ShapeError};
pub use graph::{CacheStats, Graph};
pub use infer::{ShapeInference, StandardShapeInference};
pub use layout::{Layout, LayoutBuilder};
pub use node::{Node, NodeId, Output};
pub use op::{ConstValue, Metadata, OpKind, kinds};
pub use shape::Shape;

pub use strata_dtype::ElementType;
