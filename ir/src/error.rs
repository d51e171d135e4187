use snafu::Snafu;
use strata_dtype::ElementType;

use crate::node::NodeId;
use crate::op::OpKind;
use crate::shape::Shape;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Operand shapes are incompatible with the opcode's contract.
    #[snafu(display("shape inference failed for '{op}': {source}"))]
    ShapeInference { op: OpKind, source: ShapeError },

    /// Handle does not name a live node (never allocated or already collected).
    #[snafu(display("node {id} does not exist in this graph"))]
    DanglingNode { id: NodeId },

    #[snafu(display("node {id} has {num_outputs} output(s), output {index} requested"))]
    OutputIndexOutOfRange { id: NodeId, index: usize, num_outputs: usize },

    /// A multi-output node was used where a single output was expected.
    #[snafu(display("node {id} has {num_outputs} outputs; an explicit output index is required"))]
    AmbiguousOutput { id: NodeId, num_outputs: usize },

    #[snafu(display("cannot clone '{op}' with {actual} operand(s), original has {expected}"))]
    OperandArityMismatch { op: OpKind, expected: usize, actual: usize },

    /// Operand does not precede its consumer in the arena.
    #[snafu(display("node {id} references operand {operand} which is not older than itself"))]
    CycleDetected { id: NodeId, operand: NodeId },
}

/// Failures reported by a [`ShapeInference`](crate::infer::ShapeInference) collaborator.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum ShapeError {
    #[snafu(display("expected {expected} operand(s), got {actual}"))]
    OperandCount { expected: usize, actual: usize },

    #[snafu(display("operand {operand} must be an array shape, got {shape}"))]
    ExpectedArray { operand: usize, shape: Shape },

    #[snafu(display("operand {operand} must be a tuple shape, got {shape}"))]
    ExpectedTuple { operand: usize, shape: Shape },

    #[snafu(display("operand {operand} has rank {rank}, at least {min_rank} required"))]
    RankTooSmall { operand: usize, rank: usize, min_rank: usize },

    #[snafu(display("operand {operand} has non-square trailing dimensions {rows}x{cols}"))]
    NotSquare { operand: usize, rows: i64, cols: i64 },

    #[snafu(display("shape mismatch: {lhs} vs {rhs}"))]
    ShapeMismatch { lhs: Shape, rhs: Shape },

    #[snafu(display("element type mismatch: {lhs} vs {rhs}"))]
    ElementTypeMismatch { lhs: ElementType, rhs: ElementType },

    #[snafu(display("operand {operand} must have a floating element type, got {element_type}"))]
    NotFloating { operand: usize, element_type: ElementType },

    #[snafu(display("dimension {dim} is out of range for rank {rank}"))]
    DimOutOfRange { dim: i64, rank: usize },

    #[snafu(display("tuple index {index} out of bounds for {len} element(s)"))]
    TupleIndexOutOfBounds { index: usize, len: usize },

    #[snafu(display("metadata {metadata} does not match the opcode"))]
    UnexpectedMetadata { metadata: String },

    #[snafu(display("explicit output shapes must not be empty"))]
    NoOutputs,

    /// No inference rule exists for the opcode.
    #[snafu(display("no shape inference rule for this opcode"))]
    Unsupported,
}
