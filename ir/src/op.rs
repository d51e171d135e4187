//! Operator identities and opcode-specific metadata.
//!
//! An [`OpKind`] is a stable symbolic key; a node's behaviour beyond that key is
//! captured by its [`Metadata`]. Neither carries a kernel: the IR only records
//! what was traced.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::hash::{self, HashValue};
use crate::shape::Shape;

/// Symbolic operator identity.
///
/// Equality and hashing use the name only, so a statically known kind and a
/// kind built at runtime from the same name are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{_0}")]
pub struct OpKind(Cow<'static, str>);

impl OpKind {
    pub const fn new_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn hash_value(&self) -> HashValue {
        hash::hash_of(self.name())
    }
}

/// Built-in opcodes.
pub mod kinds {
    use super::OpKind;

    pub const PARAMETER: OpKind = OpKind::new_static("parameter");
    pub const CONSTANT: OpKind = OpKind::new_static("constant");
    pub const ADD: OpKind = OpKind::new_static("add");
    pub const MUL: OpKind = OpKind::new_static("mul");
    pub const TUPLE: OpKind = OpKind::new_static("tuple");
    pub const GET_TUPLE_ELEMENT: OpKind = OpKind::new_static("get_tuple_element");
    pub const CHOLESKY: OpKind = OpKind::new_static("cholesky");
    pub const LOG_SOFTMAX: OpKind = OpKind::new_static("log_softmax");
    pub const LOG_SOFTMAX_BACKWARD_USE_IN: OpKind = OpKind::new_static("log_softmax_backward_use_in");
    pub const BATCH_NORM: OpKind = OpKind::new_static("batch_norm");
}

/// Scalar literal carried by constant nodes.
#[derive(Debug, Clone, Copy)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

// Floats compare by bit pattern so that metadata equality agrees with hashing.
impl PartialEq for ConstValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for ConstValue {}

impl Hash for ConstValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match *self {
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::UInt(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
        }
    }
}

macro_rules! impl_const_value_from {
    ($($ty:ty => $variant:ident as $as:ty),* $(,)?) => {
        $(impl From<$ty> for ConstValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value as $as)
            }
        })*
    };
}

impl_const_value_from! {
    i8 => Int as i64, i16 => Int as i64, i32 => Int as i64, i64 => Int as i64,
    u8 => UInt as u64, u16 => UInt as u64, u32 => UInt as u64, u64 => UInt as u64,
    f32 => Float as f64, f64 => Float as f64,
}

impl From<bool> for ConstValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}u"),
            Self::Float(v) => write!(f, "{v:?}"),
        }
    }
}

/// Opcode-specific immutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Metadata {
    None,
    /// Graph input; `index` distinguishes otherwise identical parameters.
    Parameter { index: usize, shape: Shape },
    Constant { value: ConstValue, shape: Shape },
    Cholesky { lower: bool },
    Softmax { dim: i64 },
    LogSoftmaxBackward { dim: i64 },
    BatchNorm { epsilon: ConstValue, momentum: ConstValue, training: bool },
    TupleIndex { index: usize },
    /// Output shapes supplied by the caller instead of an inference rule.
    Explicit { shapes: SmallVec<[Shape; 1]> },
}

impl Metadata {
    pub fn hash_value(&self) -> HashValue {
        hash::hash_of(self)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Parameter { index, .. } => write!(f, "index={index}"),
            Self::Constant { value, .. } => write!(f, "value={value}"),
            Self::Cholesky { lower } => write!(f, "lower={lower}"),
            Self::Softmax { dim } | Self::LogSoftmaxBackward { dim } => write!(f, "dim={dim}"),
            Self::BatchNorm { epsilon, momentum, training } => {
                write!(f, "epsilon={epsilon}, momentum={momentum}, training={training}")
            }
            Self::TupleIndex { index } => write!(f, "index={index}"),
            Self::Explicit { .. } => write!(f, "explicit_shapes"),
        }
    }
}
