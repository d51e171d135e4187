//! Physical dimension ordering of array shapes.
//!
//! A [`Layout`] is immutable once built: it participates in shape hashes, and a
//! value used as a hash key must not change under the cache. Construction goes
//! through [`LayoutBuilder`].

use smallvec::SmallVec;

use crate::hash::{self, HashValue};

/// Mutable accumulator for a [`Layout`].
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    minor_to_major: SmallVec<[i64; 4]>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next-more-major dimension.
    pub fn add_minor_to_major(&mut self, dim: i64) -> &mut Self {
        self.minor_to_major.push(dim);
        self
    }

    pub fn extend<I: IntoIterator<Item = i64>>(&mut self, dims: I) -> &mut Self {
        self.minor_to_major.extend(dims);
        self
    }

    pub fn finish(&self) -> Layout {
        Layout { minor_to_major: self.minor_to_major.clone() }
    }
}

/// Minor-to-major dimension order of an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Layout {
    minor_to_major: SmallVec<[i64; 4]>,
}

impl Layout {
    /// Row-major layout for `rank` dimensions: `[rank-1, ..., 1, 0]`.
    pub fn default_for_rank(rank: usize) -> Self {
        Self { minor_to_major: (0..rank as i64).rev().collect() }
    }

    pub fn minor_to_major(&self) -> &[i64] {
        &self.minor_to_major
    }

    pub fn minor_to_major_at(&self, index: usize) -> Option<i64> {
        self.minor_to_major.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.minor_to_major.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minor_to_major.is_empty()
    }

    /// Whether the layout names every dimension of a `rank`-dimensional array exactly once.
    pub fn is_permutation_of_rank(&self, rank: usize) -> bool {
        if self.minor_to_major.len() != rank {
            return false;
        }
        let mut seen = vec![false; rank];
        for &dim in &self.minor_to_major {
            match usize::try_from(dim).ok().and_then(|d| seen.get_mut(d)) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }

    /// Order-sensitive structural hash of the minor-to-major entries.
    pub fn hash_value(&self) -> HashValue {
        hash::hash_seq(self.minor_to_major.iter())
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, dim) in self.minor_to_major.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "}}")
    }
}
