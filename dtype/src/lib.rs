//! Element types for tensor shapes.
//!
//! The IR never interprets tensor data; element types only flow through shape
//! inference, structural hashing and diagnostics.

use std::str::FromStr;

use snafu::Snafu;

pub mod ext;


pub use ext::HasElementType;

/// Primitive element type of an array shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumIter, strum::VariantArray, strum::FromRepr)]
pub enum ElementType {
    /// Boolean predicate.
    Pred = 0,

    S8 = 1,
    S16 = 2,
    S32 = 3,
    S64 = 4,
    U8 = 5,
    U16 = 6,
    U32 = 7,
    U64 = 8,

    F16 = 9,
    BF16 = 10,
    F32 = 11,
    F64 = 12,
}

impl ElementType {
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Pred | Self::S8 | Self::U8 => 1,
            Self::S16 | Self::U16 | Self::F16 | Self::BF16 => 2,
            Self::S32 | Self::U32 | Self::F32 => 4,
            Self::S64 | Self::U64 | Self::F64 => 8,
        }
    }

    pub const fn is_pred(&self) -> bool {
        matches!(self, Self::Pred)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::S8 | Self::S16 | Self::S32 | Self::S64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    pub const fn is_integral(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub const fn is_floating(&self) -> bool {
        matches!(self, Self::F16 | Self::BF16 | Self::F32 | Self::F64)
    }

    /// Short lowercase mnemonic used in shape strings (`f32[2,3]`).
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pred => "pred",
            Self::S8 => "s8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::S64 => "s64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("unknown element type '{name}'"))]
pub struct ParseElementTypeError {
    pub name: String,
}

impl FromStr for ElementType {
    type Err = ParseElementTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use strum::VariantArray;

        Self::VARIANTS
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| ParseElementTypeError { name: s.to_string() })
    }
}
