use crate::variable::VariableId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A half-open range `[start, end)` of variable ids owned by one worker.
///
/// Shards produced by [`Shard::partition`] are disjoint, contiguous, sorted
/// by worker index and cover `[0, n_variables)` exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shard {
    start: VariableId,
    end: VariableId,
}

impl Shard {
    pub fn new(start: VariableId, end: VariableId) -> Self {
        assert!(start <= end, "shard start {start} is past its end {end}");
        Shard { start, end }
    }

    /// Split `[0, n_variables)` into `n_shards` near-equal contiguous shards.
    ///
    /// Every shard has `n_variables / n_shards` ids except the last, which
    /// also takes the remainder.
    pub fn partition(n_variables: usize, n_shards: usize) -> Vec<Shard> {
        (0..n_shards)
            .map(|i| Shard::nth(n_variables, n_shards, i))
            .collect()
    }

    /// The `i`-th shard of [`Shard::partition`].
    pub fn nth(n_variables: usize, n_shards: usize, i: usize) -> Shard {
        assert!(i < n_shards, "shard index {i} out of range for {n_shards} shards");
        let size = n_variables / n_shards;
        let start = size * i;
        let end = if i + 1 == n_shards {
            n_variables
        } else {
            start + size
        };
        Shard { start, end }
    }

    pub fn start(&self) -> VariableId {
        self.start
    }

    pub fn end(&self) -> VariableId {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, id: VariableId) -> bool {
        self.start <= id && id < self.end
    }

    /// Ids in increasing order.
    pub fn ids(&self) -> Range<VariableId> {
        self.start..self.end
    }
}
