//! Output shape descriptors.
//!
//! A node records one [`Shape`] per output. Array shapes carry an element type,
//! concrete dimensions and an optional physical [`Layout`]; tuple shapes group
//! the shapes of multi-value results.

use smallvec::SmallVec;
use strata_dtype::ElementType;

use crate::hash::{self, HashValue};
use crate::layout::Layout;

pub type Dims = SmallVec<[i64; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Array { element_type: ElementType, dims: Dims, layout: Option<Layout> },
    Tuple(Vec<Shape>),
}

impl Shape {
    /// Array shape without an explicit layout.
    ///
    /// ```rust
    /// # use strata_ir::shape::Shape;
    /// # use strata_dtype::ElementType;
    /// let shape = Shape::array(ElementType::F32, [2, 3]);
    /// assert_eq!(shape.rank(), Some(2));
    /// assert_eq!(shape.to_string(), "f32[2,3]");
    /// ```
    pub fn array<I: IntoIterator<Item = i64>>(element_type: ElementType, dims: I) -> Self {
        Self::Array { element_type, dims: dims.into_iter().collect(), layout: None }
    }

    pub fn array_with_layout<I: IntoIterator<Item = i64>>(element_type: ElementType, dims: I, layout: Layout) -> Self {
        Self::Array { element_type, dims: dims.into_iter().collect(), layout: Some(layout) }
    }

    pub fn scalar(element_type: ElementType) -> Self {
        Self::array(element_type, [])
    }

    pub fn tuple<I: IntoIterator<Item = Shape>>(shapes: I) -> Self {
        Self::Tuple(shapes.into_iter().collect())
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Self::Tuple(_))
    }

    /// Number of dimensions, `None` for tuples.
    pub fn rank(&self) -> Option<usize> {
        self.dims().map(<[i64]>::len)
    }

    pub fn dims(&self) -> Option<&[i64]> {
        match self {
            Self::Array { dims, .. } => Some(dims),
            Self::Tuple(_) => None,
        }
    }

    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            Self::Array { element_type, .. } => Some(*element_type),
            Self::Tuple(_) => None,
        }
    }

    pub fn layout(&self) -> Option<&Layout> {
        match self {
            Self::Array { layout, .. } => layout.as_ref(),
            Self::Tuple(_) => None,
        }
    }

    pub fn tuple_shapes(&self) -> Option<&[Shape]> {
        match self {
            Self::Tuple(shapes) => Some(shapes),
            Self::Array { .. } => None,
        }
    }

    /// Number of elements of an array shape.
    pub fn element_count(&self) -> Option<i64> {
        self.dims().map(|dims| dims.iter().product())
    }

    /// Equal element types and dimensions; layouts are ignored.
    pub fn compatible_with(&self, other: &Shape) -> bool {
        match (self, other) {
            (Self::Array { element_type: a, dims: da, .. }, Self::Array { element_type: b, dims: db, .. }) => {
                a == b && da == db
            }
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.compatible_with(y))
            }
            _ => false,
        }
    }

    /// Structural hash: element type, dims and layout for arrays; the ordered
    /// fold of element hashes for tuples.
    pub fn hash_value(&self) -> HashValue {
        match self {
            Self::Array { element_type, dims, layout } => {
                let mut h = hash::combine(hash::hash_of(element_type.name()), hash::hash_seq(dims.iter()));
                if let Some(layout) = layout {
                    h = hash::combine(h, layout.hash_value());
                }
                h
            }
            Self::Tuple(shapes) => {
                hash::combine(hash::hash_of("tuple"), hash::fold(shapes.iter().map(Shape::hash_value)))
            }
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Array { element_type, dims, layout } => {
                write!(f, "{element_type}[")?;
                for (i, dim) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{dim}")?;
                }
                write!(f, "]")?;
                if let Some(layout) = layout {
                    write!(f, "{layout}")?;
                }
                Ok(())
            }
            Self::Tuple(shapes) => {
                write!(f, "(")?;
                for (i, shape) in shapes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{shape}")?;
                }
                write!(f, ")")
            }
        }
    }
}
