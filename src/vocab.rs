//! Vocabulary reconstruction: token ID to raw byte sequence.

use std::collections::HashMap;

use crate::error::{Result, TokenizerError};
use crate::merges::{MergeTable, TokenId};

/// Derived mapping from every known token ID to its concrete byte sequence.
///
/// Built once from a [`MergeTable`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entries: HashMap<TokenId, Vec<u8>>,
}

impl Vocabulary {
    /// Seed the 256 single-byte entries, then replay the merge rules in
    /// ascending result order so that `vocab[result]` is always the
    /// concatenation of two already-defined entries.
    ///
    /// Ascending order is what makes the replay well-founded: a rule's
    /// result is numerically greater than any ID that existed when it was
    /// learned. A rule referencing an ID that is still undefined fails with
    /// [`TokenizerError::Inconsistent`].
    pub fn build(table: &MergeTable) -> Result<Self> {
        let mut entries: HashMap<TokenId, Vec<u8>> =
            (0u32..256).map(|id| (id, vec![id as u8])).collect();

        let mut rules: Vec<_> = table.iter().collect();
        rules.sort_by_key(|&(_, result)| result);

        for ((left, right), result) in rules {
            let merged = {
                let left_bytes = entries
                    .get(&left)
                    .ok_or(TokenizerError::Inconsistent(left))?;
                let right_bytes = entries
                    .get(&right)
                    .ok_or(TokenizerError::Inconsistent(right))?;
                let mut bytes = Vec::with_capacity(left_bytes.len() + right_bytes.len());
                bytes.extend_from_slice(left_bytes);
                bytes.extend_from_slice(right_bytes);
                bytes
            };
            entries.insert(result, merged);
        }

        Ok(Self { entries })
    }

    /// Byte sequence for a token ID, or `None` if the ID was never defined.
    #[inline]
    pub fn bytes(&self, id: TokenId) -> Option<&[u8]> {
        self.entries.get(&id).map(|b| b.as_slice())
    }

    /// Number of defined token IDs (256 base bytes plus one per rule).
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the 256 base entries always exist.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_bytes_map_to_themselves() {
        let table = MergeTable::new([]).unwrap();
        let vocab = Vocabulary::build(&table).unwrap();
        assert_eq!(vocab.len(), 256);
        assert_eq!(vocab.bytes(0), Some(&[0u8][..]));
        assert_eq!(vocab.bytes(104), Some(&b"h"[..]));
        assert_eq!(vocab.bytes(255), Some(&[255u8][..]));
        assert_eq!(vocab.bytes(256), None);
    }

    #[test]
    fn merged_entries_concatenate() {
        let table = MergeTable::new([((104, 105), 256), ((256, 33), 257)]).unwrap();
        let vocab = Vocabulary::build(&table).unwrap();
        assert_eq!(vocab.bytes(256), Some(&b"hi"[..]));
        assert_eq!(vocab.bytes(257), Some(&b"hi!"[..]));
        assert_eq!(vocab.len(), 258);
    }

    #[test]
    fn build_is_idempotent() {
        let table = MergeTable::new([((104, 105), 256), ((256, 256), 257)]).unwrap();
        let a = Vocabulary::build(&table).unwrap();
        let b = Vocabulary::build(&table).unwrap();
        assert_eq!(a.len(), b.len());
        for id in 0..258 {
            assert_eq!(a.bytes(id), b.bytes(id));
        }
    }

    #[test]
    fn undefined_reference_is_inconsistent() {
        // 300 is never defined, so the rule cannot be replayed.
        let table = MergeTable::new([((300, 65), 256)]).unwrap();
        let err = Vocabulary::build(&table).unwrap_err();
        assert!(matches!(err, TokenizerError::Inconsistent(300)));
    }
}
