// ABOUTME: Shared utility functions for Docket
// ABOUTME: ID generation and order-preserving de-duplication

use std::collections::HashSet;
use std::hash::Hash;

/// Generate a prefixed unique ID, e.g. `req-V1StGXR8_Z5jdHi6B-myT`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}

/// Remove duplicates by key, keeping the first occurrence of each
pub fn dedup_preserving_order<T, K, F>(values: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(key(value)))
        .collect()
}
