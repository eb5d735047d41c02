//! Utility functions for deriving short identifiers from hashes
use std::hash::{DefaultHasher, Hash, Hasher};

pub(crate) fn calculate_hash<T: Hash + ?Sized>(t: &T) -> u64 {
    let mut s = DefaultHasher::new();
    t.hash(&mut s);
    s.finish()
}

/// Hex encoded hash, truncated to `width` characters (at most 16)
pub(crate) fn short_hex_hash<T: Hash + ?Sized>(t: &T, width: usize) -> String {
    let mut hex = format!("{:016x}", calculate_hash(t));
    hex.truncate(width.min(16));
    hex
}
