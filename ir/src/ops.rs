//! Typed node constructors for the built-in opcodes.
//!
//! Each constructor is a thin wrapper over [`Graph::create_node`] that fixes the
//! opcode and packs the opcode-specific fields into [`Metadata`].

use smallvec::SmallVec;
use strata_dtype::HasElementType;

use crate::error::Result;
use crate::graph::Graph;
use crate::node::{NodeId, Output};
use crate::op::{ConstValue, Metadata, OpKind, kinds};
use crate::shape::Shape;

const NO_OPERANDS: [Output; 0] = [];

/// Graph input number `index`.
pub fn parameter(graph: &mut Graph, index: usize, shape: Shape) -> Result<NodeId> {
    graph.create_node(kinds::PARAMETER, NO_OPERANDS, Metadata::Parameter { index, shape })
}

pub fn constant(graph: &mut Graph, value: ConstValue, shape: Shape) -> Result<NodeId> {
    graph.create_node(kinds::CONSTANT, NO_OPERANDS, Metadata::Constant { value, shape })
}

/// Rank-0 constant whose element type follows the Rust scalar type.
pub fn scalar<T: HasElementType + Into<ConstValue>>(graph: &mut Graph, value: T) -> Result<NodeId> {
    constant(graph, value.into(), Shape::scalar(T::ELEMENT_TYPE))
}

pub fn add(graph: &mut Graph, lhs: Output, rhs: Output) -> Result<NodeId> {
    graph.create_node(kinds::ADD, [lhs, rhs], Metadata::None)
}

pub fn mul(graph: &mut Graph, lhs: Output, rhs: Output) -> Result<NodeId> {
    graph.create_node(kinds::MUL, [lhs, rhs], Metadata::None)
}

pub fn tuple<I: IntoIterator<Item = Output>>(graph: &mut Graph, elements: I) -> Result<NodeId> {
    graph.create_node(kinds::TUPLE, elements, Metadata::None)
}

pub fn get_tuple_element(graph: &mut Graph, tuple: Output, index: usize) -> Result<NodeId> {
    graph.create_node(kinds::GET_TUPLE_ELEMENT, [tuple], Metadata::TupleIndex { index })
}

/// Cholesky factor of a batch of square matrices; `lower` selects the triangle.
pub fn cholesky(graph: &mut Graph, input: Output, lower: bool) -> Result<NodeId> {
    graph.create_node(kinds::CHOLESKY, [input], Metadata::Cholesky { lower })
}

pub fn log_softmax(graph: &mut Graph, input: Output, dim: i64) -> Result<NodeId> {
    graph.create_node(kinds::LOG_SOFTMAX, [input], Metadata::Softmax { dim })
}

/// Log-softmax gradient that also reads the forward input `self_`.
///
/// Operand order is `(grad_output, output, self_)`.
pub fn log_softmax_backward_use_in(
    graph: &mut Graph,
    grad_output: Output,
    output: Output,
    dim: i64,
    self_: Output,
) -> Result<NodeId> {
    graph.create_node(kinds::LOG_SOFTMAX_BACKWARD_USE_IN, [grad_output, output, self_], Metadata::LogSoftmaxBackward {
        dim,
    })
}

/// Operands of [`batch_norm`].
pub struct BatchNormInputs {
    pub input: Output,
    pub scale: Output,
    pub offset: Output,
    pub running_mean: Output,
    pub running_var: Output,
}

/// Batch normalization with outputs `(out, mean, var)`.
pub fn batch_norm(
    graph: &mut Graph,
    inputs: BatchNormInputs,
    epsilon: f64,
    momentum: f64,
    training: bool,
) -> Result<NodeId> {
    let BatchNormInputs { input, scale, offset, running_mean, running_var } = inputs;
    graph.create_node(kinds::BATCH_NORM, [input, scale, offset, running_mean, running_var], Metadata::BatchNorm {
        epsilon: ConstValue::Float(epsilon),
        momentum: ConstValue::Float(momentum),
        training,
    })
}

/// Opcode without an inference rule; the caller supplies the output shapes.
pub fn custom<I, S>(graph: &mut Graph, op: OpKind, operands: I, shapes: S) -> Result<NodeId>
where
    I: IntoIterator<Item = Output>,
    S: IntoIterator<Item = Shape>,
{
    let shapes: SmallVec<[Shape; 1]> = shapes.into_iter().collect();
    graph.create_node(op, operands, Metadata::Explicit { shapes })
}
