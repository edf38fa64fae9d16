//! The learned merge table: an ordered set of byte-pair merge rules.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, TokenizerError};

/// Integer identifier for a byte (0..=255) or a learned byte sequence (>255).
pub type TokenId = u32;

/// A pair of adjacent token IDs, keyed left-to-right.
pub type Pair = (TokenId, TokenId);

/// The smallest ID a merge rule may produce; below this the ID space is the
/// raw byte alphabet.
pub const BASE_VOCAB: TokenId = 256;

/// Immutable collection of merge rules with pair lookup.
///
/// Result IDs are assigned in creation order, so the numeric value of a
/// rule's result is also its priority: lower result = learned earlier =
/// merged first.
#[derive(Debug, Clone)]
pub struct MergeTable {
    merges: HashMap<Pair, TokenId>,
}

impl MergeTable {
    /// Build a table from `((left, right), result)` entries.
    ///
    /// Fails with [`TokenizerError::Format`] if a result is in the byte
    /// range (<= 255) or duplicated across rules. A later entry with the
    /// same `(left, right)` key silently overwrites the earlier one, and
    /// the overwritten rule's result leaves the table with it; this matches
    /// the permissive load behavior of the original format.
    pub fn new(entries: impl IntoIterator<Item = (Pair, TokenId)>) -> Result<Self> {
        let mut merges = HashMap::new();
        let mut results = HashSet::new();

        for (pair, result) in entries {
            if result < BASE_VOCAB {
                return Err(TokenizerError::Format(format!(
                    "merge result {} collides with the byte alphabet (must be > 255)",
                    result
                )));
            }
            if let Some(replaced) = merges.insert(pair, result) {
                results.remove(&replaced);
            }
            if !results.insert(result) {
                return Err(TokenizerError::Format(format!(
                    "duplicate merge result id: {}",
                    result
                )));
            }
        }

        Ok(Self { merges })
    }

    /// Look up the rule for an adjacent pair.
    ///
    /// Returns `(priority, result)`; the two are numerically equal because
    /// result IDs are handed out in creation order, which makes the result
    /// itself a valid total order for "earliest merge wins".
    #[inline]
    pub fn lookup(&self, left: TokenId, right: TokenId) -> Option<(u32, TokenId)> {
        self.merges.get(&(left, right)).map(|&id| (id, id))
    }

    /// Iterate over all `(pair, result)` rules in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Pair, TokenId)> + '_ {
        self.merges.iter().map(|(&pair, &result)| (pair, result))
    }

    /// Number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    /// True if the table holds no rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_present_and_absent() {
        let table = MergeTable::new([((104, 105), 256), ((256, 33), 257)]).unwrap();
        assert_eq!(table.lookup(104, 105), Some((256, 256)));
        assert_eq!(table.lookup(256, 33), Some((257, 257)));
        assert_eq!(table.lookup(105, 104), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn rejects_result_in_byte_range() {
        let err = MergeTable::new([((1, 2), 255)]).unwrap_err();
        assert!(matches!(err, TokenizerError::Format(_)));
    }

    #[test]
    fn rejects_duplicate_result() {
        let err = MergeTable::new([((1, 2), 256), ((3, 4), 256)]).unwrap_err();
        assert!(matches!(err, TokenizerError::Format(_)));
    }

    #[test]
    fn later_duplicate_pair_overwrites() {
        let table = MergeTable::new([((1, 2), 256), ((1, 2), 300)]).unwrap();
        assert_eq!(table.lookup(1, 2), Some((300, 300)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn overwritten_result_is_released() {
        // 256 is freed when (1,2) is overwritten, so a later rule may use it.
        let table = MergeTable::new([((1, 2), 256), ((1, 2), 300), ((3, 4), 256)]).unwrap();
        assert_eq!(table.lookup(3, 4), Some((256, 256)));
        assert_eq!(table.len(), 2);
    }
}
