//! Utility function(s).

use super::directed::ArenaIndex;
use itertools::Itertools;

/// Reorders a vector such that `result[k] = data[order[k]]` in O(n).
/// Indices missing from `order` are dropped.
pub fn permute<T>(data: Vec<T>, order: &[ArenaIndex]) -> Vec<T> {
    let mut slots = data.into_iter().map(Some).collect_vec();
    order.iter().filter_map(|index| slots[index.0].take()).collect()
}
