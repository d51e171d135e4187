//! Immutable operation nodes.

use smallvec::SmallVec;

use crate::hash::{self, HashValue};
use crate::op::{Metadata, OpKind};
use crate::shape::Shape;

/// Stable handle of a node inside its [`Graph`](crate::Graph).
///
/// Handles are never reused: once a node is collected, its handle stays dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("%{_0}")]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Operand edge: a producer node plus the output it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Output {
    pub node: NodeId,
    pub index: usize,
}

impl Output {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.index == 0 { write!(f, "{}", self.node) } else { write!(f, "{}:{}", self.node, self.index) }
    }
}

/// A single recorded operation.
///
/// Nodes never change after construction. The structural hash covers the
/// opcode, metadata, output shapes and, for each operand, the producer's hash
/// and the output index read. Producer identities do not enter the hash.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) op: OpKind,
    pub(crate) operands: SmallVec<[Output; 4]>,
    /// Per-operand `combine(producer hash, output index)`, in operand order.
    pub(crate) operand_hashes: SmallVec<[HashValue; 4]>,
    pub(crate) metadata: Metadata,
    pub(crate) shapes: SmallVec<[Shape; 1]>,
    pub(crate) hash: HashValue,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn op(&self) -> &OpKind {
        &self.op
    }

    pub fn operands(&self) -> &[Output] {
        &self.operands
    }

    pub fn operand(&self, index: usize) -> Option<Output> {
        self.operands.get(index).copied()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn num_outputs(&self) -> usize {
        self.shapes.len()
    }

    /// Shape of output 0.
    pub fn shape(&self) -> &Shape {
        &self.shapes[0]
    }

    pub fn output_shape(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn hash(&self) -> HashValue {
        self.hash
    }

    /// `lower` flag of a Cholesky node.
    pub fn lower(&self) -> Option<bool> {
        match self.metadata {
            Metadata::Cholesky { lower } => Some(lower),
            _ => None,
        }
    }

    /// Reduction dimension of softmax-family nodes.
    pub fn dim(&self) -> Option<i64> {
        match self.metadata {
            Metadata::Softmax { dim } | Metadata::LogSoftmaxBackward { dim } => Some(dim),
            _ => None,
        }
    }

    /// Structural equality used to confirm a hash match.
    pub(crate) fn matches(
        &self,
        op: &OpKind,
        metadata: &Metadata,
        shapes: &[Shape],
        operand_hashes: &[HashValue],
        operands: &[Output],
    ) -> bool {
        self.op == *op
            && self.metadata == *metadata
            && self.shapes.as_slice() == shapes
            && self.operand_hashes.as_slice() == operand_hashes
            && self.operands.iter().map(|o| o.index).eq(operands.iter().map(|o| o.index))
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let [shape] = self.shapes.as_slice() {
            write!(f, "{shape}")?;
        } else {
            write!(f, "(")?;
            for (i, shape) in self.shapes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{shape}")?;
            }
            write!(f, ")")?;
        }
        write!(f, " {}(", self.op)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{operand}")?;
        }
        write!(f, ")")?;
        if self.shapes.len() > 1 {
            write!(f, ", num_outputs={}", self.shapes.len())?;
        }
        if !self.metadata.is_none() {
            write!(f, ", {}", self.metadata)?;
        }
        Ok(())
    }
}

pub(crate) fn operand_hash(producer: HashValue, index: usize) -> HashValue {
    hash::combine(producer, hash::hash_of(&(index as u64)))
}

pub(crate) fn structural_hash(
    op: &OpKind,
    metadata: &Metadata,
    shapes: &[Shape],
    operand_hashes: &[HashValue],
) -> HashValue {
    let head = hash::combine(op.hash_value(), metadata.hash_value());
    let head = hash::combine(head, hash::fold(shapes.iter().map(Shape::hash_value)));
    operand_hashes.iter().fold(head, |acc, &h| hash::combine(acc, h))
}
