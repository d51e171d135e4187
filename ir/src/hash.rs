//! Deterministic structural hashing.
//!
//! Every hash produced here is a pure function of the hashed values: no pointer
//! identity, no per-process random seed. Node hashes and layout hashes can
//! therefore be used as keys for caches that outlive a process.

use std::hash::{Hash, Hasher};

use xxhash_rust::xxh64::Xxh64;

pub type HashValue = u64;

/// Seed of every sequence fold. Equal to `hash_of(&0u64)`.
pub fn seed() -> HashValue {
    hash_of(&0u64)
}

/// Hash a value with xxh64 (seed 0).
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> HashValue {
    let mut hasher = Xxh64::new(0);
    value.hash(&mut hasher);
    hasher.finish()
}

/// Order-sensitive combiner.
///
/// `combine(a, b) != combine(b, a)` in general, so folding a sequence with it
/// distinguishes permutations of the same elements.
#[inline]
pub const fn combine(h1: HashValue, h2: HashValue) -> HashValue {
    h1 ^ h2.wrapping_add(0x9e37_79b9_7f4a_7c15).wrapping_add(h1 << 6).wrapping_add(h1 >> 2)
}

/// Fold a sequence of already-computed hashes, starting from [`seed`].
pub fn fold<I>(hashes: I) -> HashValue
where
    I: IntoIterator<Item = HashValue>,
{
    hashes.into_iter().fold(seed(), combine)
}

/// Fold the hashes of every element of a sequence.
pub fn hash_seq<'a, T, I>(items: I) -> HashValue
where
    T: Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    fold(items.into_iter().map(hash_of))
}
