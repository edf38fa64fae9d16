//! Tokenizer: greedy priority-ordered encode, concatenating decode.
//!
//! Encoding works on the raw UTF-8 bytes of the input, each byte an initial
//! token. Merges apply strictly in the order they were learned (lowest
//! result ID first), leftmost occurrence first within one rule.
//!
//! The merge loop uses a min-heap over a linked-list skip structure for
//! O(n log n) instead of rescanning the sequence per pass. The observable
//! merge order is identical to the naive rescan: the heap pops by
//! (rank, position), and any pair formed by a merge has a strictly greater
//! rank than the rule that formed it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::Path;

use crate::error::{Result, TokenizerError};
use crate::format::MergesFile;
use crate::merges::{MergeTable, TokenId};
use crate::vocab::Vocabulary;

/// A constructed tokenizer: merge table plus its derived vocabulary.
///
/// Immutable after construction; encode and decode take `&self` and carry
/// no per-call state, so a single instance is freely shared across threads.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    merges: MergeTable,
    vocab: Vocabulary,
    vocab_size: u32,
    description: Option<String>,
}

impl Tokenizer {
    /// Build a tokenizer from a merge table, deriving the vocabulary once.
    ///
    /// `vocab_size` is informational metadata carried through save; it is
    /// not validated against the table.
    pub fn new(merges: MergeTable, vocab_size: u32) -> Result<Self> {
        let vocab = Vocabulary::build(&merges)?;
        Ok(Self {
            merges,
            vocab,
            vocab_size,
            description: None,
        })
    }

    /// Load a tokenizer from a persisted merge-table JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = MergesFile::load(path)?;
        let description = file.description.clone();
        let vocab_size = file.vocab_size;
        let merges = file.into_merge_table()?;
        let vocab = Vocabulary::build(&merges)?;
        Ok(Self {
            merges,
            vocab,
            vocab_size,
            description,
        })
    }

    /// Save the merge table back to the persisted JSON format.
    pub fn save(&self, path: &Path) -> Result<()> {
        MergesFile::from_merge_table(&self.merges, self.vocab_size, self.description.clone())
            .save(path)
    }

    /// Encode text into token IDs via its UTF-8 byte sequence.
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        self.encode_bytes(text.as_bytes())
    }

    /// Encode a raw byte sequence into token IDs.
    ///
    /// Deterministic for a given (input, merge table) pair; the empty input
    /// encodes to an empty sequence and a single byte to its own ID.
    pub fn encode_bytes(&self, piece: &[u8]) -> Vec<TokenId> {
        let n = piece.len();
        let mut ids: Vec<TokenId> = piece.iter().map(|&b| TokenId::from(b)).collect();
        if n < 2 {
            return ids;
        }

        // Linked list for O(1) neighbor traversal after merges.
        let mut next: Vec<usize> = (1..=n).collect();
        let mut prev: Vec<usize> = (0..n).map(|i| i.wrapping_sub(1)).collect();
        let mut alive = vec![true; n];

        // Generation counters to cheaply invalidate stale heap entries.
        let mut gen: Vec<u32> = vec![0; n];

        // Min-heap of (rank, position, generation_at_push). Position breaks
        // rank ties leftmost-first.
        let mut heap: BinaryHeap<Reverse<(u32, usize, u32)>> = BinaryHeap::with_capacity(n);

        let pair_rank = |i: usize, ids: &[TokenId], next: &[usize]| -> Option<u32> {
            let j = next[i];
            if j >= n {
                return None;
            }
            self.merges.lookup(ids[i], ids[j]).map(|(rank, _)| rank)
        };

        for i in 0..n - 1 {
            if let Some(rank) = pair_rank(i, &ids, &next) {
                heap.push(Reverse((rank, i, 0)));
            }
        }

        while let Some(Reverse((rank, i, g))) = heap.pop() {
            if !alive[i] || gen[i] != g {
                continue;
            }
            let j = next[i];
            if j >= n || !alive[j] {
                continue;
            }

            // Verify the rank is still current (either slot may have been
            // merged into since this entry was pushed).
            let (current_rank, new_id) = match self.merges.lookup(ids[i], ids[j]) {
                Some(r) => r,
                None => continue,
            };
            if current_rank != rank {
                continue;
            }

            // Merge: slot i takes the new token, j leaves the list.
            ids[i] = new_id;
            gen[i] += 1;
            alive[j] = false;
            let k = next[j];
            next[i] = k;
            if k < n {
                prev[k] = i;
            }

            // Re-evaluate (prev[i], i) — i's content changed.
            if prev[i] != usize::MAX && alive[prev[i]] {
                let p = prev[i];
                if let Some(r) = pair_rank(p, &ids, &next) {
                    heap.push(Reverse((r, p, gen[p])));
                }
            }
            // Re-evaluate (i, next[i]).
            if next[i] < n {
                if let Some(r) = pair_rank(i, &ids, &next) {
                    heap.push(Reverse((r, i, gen[i])));
                }
            }
        }

        // Collect survivors in order. Slot 0 is never removed: merges only
        // drop the right-hand slot.
        let mut out = Vec::new();
        let mut i = 0;
        while i < n {
            out.push(ids[i]);
            i = next[i];
        }
        out
    }

    /// Decode token IDs back into text.
    ///
    /// Byte sequences are concatenated first and only then interpreted as
    /// UTF-8, so a multi-byte character split across tokens decodes intact.
    /// Malformed byte subsequences degrade to U+FFFD rather than failing;
    /// an ID with no vocabulary entry is an [`TokenizerError::UnknownToken`]
    /// error.
    pub fn decode(&self, ids: &[TokenId]) -> Result<String> {
        let mut bytes = Vec::new();
        for &id in ids {
            let piece = self
                .vocab
                .bytes(id)
                .ok_or(TokenizerError::UnknownToken(id))?;
            bytes.extend_from_slice(piece);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Informational vocabulary size carried in the persisted artifact.
    pub fn vocab_size(&self) -> u32 {
        self.vocab_size
    }

    /// Number of merge rules in the table.
    pub fn num_merges(&self) -> usize {
        self.merges.len()
    }

    /// Read access to the merge table.
    pub fn merge_table(&self) -> &MergeTable {
        &self.merges
    }

    /// Read access to the derived vocabulary.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }
}
