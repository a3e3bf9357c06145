//! One grouping dimension of the digest.

use std::collections::BTreeMap;

use super::totals::ValueTotals;

/// Mapping from a partial key to merged totals.
///
/// Grows monotonically while records stream in. Keys iterate in sorted order,
/// so output built from an accumulator is deterministic.
#[derive(Debug, Clone)]
pub struct GroupingAccumulator<K> {
    totals: BTreeMap<K, ValueTotals>,
}

impl<K: Ord> Default for GroupingAccumulator<K> {
    fn default() -> Self {
        Self {
            totals: BTreeMap::new(),
        }
    }
}

impl<K: Ord> GroupingAccumulator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `values` into the total for `key`.
    pub fn merge(&mut self, key: K, values: &ValueTotals) {
        self.totals
            .entry(key)
            .and_modify(|total| total.merge(values))
            .or_insert_with(|| values.clone());
    }

    pub fn get(&self, key: &K) -> Option<&ValueTotals> {
        self.totals.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &ValueTotals)> {
        self.totals.iter()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
