//! Shape inference collaborator.
//!
//! Node construction asks a [`ShapeInference`] implementation for the output
//! shapes of an opcode given its operand shapes and metadata. The IR ships
//! [`StandardShapeInference`] with rules for the built-in opcodes; embedders
//! with their own opcodes can wrap or replace it.

use smallvec::{SmallVec, smallvec};
use snafu::ensure;

use crate::error::*;
use crate::op::{Metadata, OpKind, kinds};
use crate::shape::Shape;

pub type InferredShapes = SmallVec<[Shape; 1]>;

pub trait ShapeInference: Send + Sync {
    fn infer(&self, op: &OpKind, operands: &[&Shape], metadata: &Metadata) -> Result<InferredShapes, ShapeError>;
}

/// Rules for the opcodes in [`kinds`].
///
/// Any opcode carrying [`Metadata::Explicit`] gets the supplied shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardShapeInference;

impl ShapeInference for StandardShapeInference {
    fn infer(&self, op: &OpKind, operands: &[&Shape], metadata: &Metadata) -> Result<InferredShapes, ShapeError> {
        if let Metadata::Explicit { shapes } = metadata {
            ensure!(!shapes.is_empty(), NoOutputsSnafu);
            return Ok(shapes.clone());
        }

        match (op.name(), metadata) {
            (name, Metadata::Parameter { shape, .. }) if name == kinds::PARAMETER.name() => {
                expect_operands(operands, 0)?;
                Ok(smallvec![shape.clone()])
            }
            (name, Metadata::Constant { shape, .. }) if name == kinds::CONSTANT.name() => {
                expect_operands(operands, 0)?;
                Ok(smallvec![shape.clone()])
            }
            (name, Metadata::None) if name == kinds::ADD.name() || name == kinds::MUL.name() => {
                expect_operands(operands, 2)?;
                expect_array(operands, 0)?;
                expect_array(operands, 1)?;
                expect_matching(operands, 0, 1)?;
                Ok(smallvec![operands[0].clone()])
            }
            (name, Metadata::None) if name == kinds::TUPLE.name() => {
                Ok(smallvec![Shape::tuple(operands.iter().map(|s| (*s).clone()))])
            }
            (name, Metadata::TupleIndex { index }) if name == kinds::GET_TUPLE_ELEMENT.name() => {
                expect_operands(operands, 1)?;
                let elements = operands[0]
                    .tuple_shapes()
                    .ok_or_else(|| ExpectedTupleSnafu { operand: 0usize, shape: operands[0].clone() }.build())?;
                let element = elements
                    .get(*index)
                    .ok_or_else(|| TupleIndexOutOfBoundsSnafu { index: *index, len: elements.len() }.build())?;
                Ok(smallvec![element.clone()])
            }
            (name, Metadata::Cholesky { .. }) if name == kinds::CHOLESKY.name() => infer_cholesky(operands),
            (name, Metadata::Softmax { dim }) if name == kinds::LOG_SOFTMAX.name() => {
                expect_operands(operands, 1)?;
                let rank = expect_array(operands, 0)?;
                expect_floating(operands, 0)?;
                normalize_dim(*dim, rank)?;
                Ok(smallvec![operands[0].clone()])
            }
            (name, Metadata::LogSoftmaxBackward { dim }) if name == kinds::LOG_SOFTMAX_BACKWARD_USE_IN.name() => {
                infer_log_softmax_backward(operands, *dim)
            }
            (name, Metadata::BatchNorm { .. }) if name == kinds::BATCH_NORM.name() => infer_batch_norm(operands),
            (name, other) if is_builtin(name) => UnexpectedMetadataSnafu { metadata: format!("{other:?}") }.fail(),
            _ => UnsupportedSnafu.fail(),
        }
    }
}

fn is_builtin(name: &str) -> bool {
    [
        kinds::PARAMETER,
        kinds::CONSTANT,
        kinds::ADD,
        kinds::MUL,
        kinds::TUPLE,
        kinds::GET_TUPLE_ELEMENT,
        kinds::CHOLESKY,
        kinds::LOG_SOFTMAX,
        kinds::LOG_SOFTMAX_BACKWARD_USE_IN,
        kinds::BATCH_NORM,
    ]
    .iter()
    .any(|kind| kind.name() == name)
}

fn expect_operands(operands: &[&Shape], expected: usize) -> Result<(), ShapeError> {
    ensure!(operands.len() == expected, OperandCountSnafu { expected, actual: operands.len() });
    Ok(())
}

/// Returns the rank of an array operand.
fn expect_array(operands: &[&Shape], operand: usize) -> Result<usize, ShapeError> {
    operands[operand].rank().ok_or_else(|| ExpectedArraySnafu { operand, shape: operands[operand].clone() }.build())
}

/// Element types are compared first so a dtype clash is reported as such.
fn expect_matching(operands: &[&Shape], lhs: usize, rhs: usize) -> Result<(), ShapeError> {
    let (a, b) = (operands[lhs], operands[rhs]);
    if let (Some(lhs), Some(rhs)) = (a.element_type(), b.element_type()) {
        ensure!(lhs == rhs, ElementTypeMismatchSnafu { lhs, rhs });
    }
    ensure!(a.compatible_with(b), ShapeMismatchSnafu { lhs: a.clone(), rhs: b.clone() });
    Ok(())
}

fn expect_floating(operands: &[&Shape], operand: usize) -> Result<(), ShapeError> {
    if let Some(element_type) = operands[operand].element_type() {
        ensure!(element_type.is_floating(), NotFloatingSnafu { operand, element_type });
    }
    Ok(())
}

/// Wrap a possibly negative dimension into `0..rank`.
pub fn normalize_dim(dim: i64, rank: usize) -> Result<usize, ShapeError> {
    let rank_i = rank as i64;
    let wrapped = if dim < 0 { dim + rank_i } else { dim };
    ensure!((0..rank_i).contains(&wrapped), DimOutOfRangeSnafu { dim, rank });
    Ok(wrapped as usize)
}

fn infer_cholesky(operands: &[&Shape]) -> Result<InferredShapes, ShapeError> {
    expect_operands(operands, 1)?;
    let rank = expect_array(operands, 0)?;
    ensure!(rank >= 2, RankTooSmallSnafu { operand: 0usize, rank, min_rank: 2usize });
    expect_floating(operands, 0)?;
    let dims = operands[0].dims().unwrap_or_default();
    let (rows, cols) = (dims[rank - 2], dims[rank - 1]);
    ensure!(rows == cols, NotSquareSnafu { operand: 0usize, rows, cols });
    Ok(smallvec![operands[0].clone()])
}

/// Operands are `(grad_output, output, self)`.
fn infer_log_softmax_backward(operands: &[&Shape], dim: i64) -> Result<InferredShapes, ShapeError> {
    expect_operands(operands, 3)?;
    let rank = expect_array(operands, 0)?;
    expect_array(operands, 1)?;
    expect_array(operands, 2)?;
    expect_matching(operands, 0, 1)?;
    normalize_dim(dim, rank)?;
    Ok(smallvec![operands[0].clone()])
}

/// Operands are `(input, scale, offset, running_mean, running_var)`; outputs
/// are `(out, mean, var)`.
fn infer_batch_norm(operands: &[&Shape]) -> Result<InferredShapes, ShapeError> {
    expect_operands(operands, 5)?;
    let rank = expect_array(operands, 0)?;
    ensure!(rank >= 2, RankTooSmallSnafu { operand: 0usize, rank, min_rank: 2usize });
    expect_floating(operands, 0)?;

    let input = operands[0];
    let channels = input.dims().unwrap_or_default()[1];
    let element_type = input.element_type().unwrap_or(strata_dtype::ElementType::F32);
    let per_channel = Shape::array(element_type, [channels]);

    for operand in 1..5 {
        expect_array(operands, operand)?;
        ensure!(
            operands[operand].compatible_with(&per_channel),
            ShapeMismatchSnafu { lhs: per_channel.clone(), rhs: operands[operand].clone() }
        );
    }

    Ok(smallvec![input.clone(), per_channel.clone(), per_channel])
}
