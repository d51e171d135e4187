//! Common imports for building node graphs.
//!
//! ```rust,ignore
//! use strata_ir::prelude::*;
//! ```

pub use crate::graph::Graph;
pub use crate::layout::{Layout, LayoutBuilder};
pub use crate::node::{Node, NodeId, Output};
pub use crate::op::{ConstValue, Metadata, OpKind, kinds};
pub use crate::ops;
pub use crate::shape::Shape;

pub use strata_dtype::ElementType;
