//! Byte-pair encoding tokenizer: a reversible, deterministic mapping between
//! UTF-8 text and integer token IDs, driven by a learned table of pairwise
//! merges.
//!
//! IDs 0..=255 are the raw byte alphabet; every ID above that is a synthetic
//! token created by a merge rule, and its numeric value doubles as the rule's
//! priority (lower = learned earlier = merged first).
//!
//! ```no_run
//! use bpetok::Tokenizer;
//!
//! let tok = Tokenizer::from_file("merges.json".as_ref())?;
//! let ids = tok.encode("हम होंगे कामयाब");
//! assert_eq!(tok.decode(&ids)?, "हम होंगे कामयाब");
//! # Ok::<(), bpetok::TokenizerError>(())
//! ```

mod error;
mod format;
mod merges;
mod tokenizer;
mod vocab;

pub use error::{Result, TokenizerError};
pub use format::MergesFile;
pub use merges::{MergeTable, Pair, TokenId};
pub use tokenizer::Tokenizer;
pub use vocab::Vocabulary;
