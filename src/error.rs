//! Error types for the tokenizer library.

use std::path::PathBuf;
use thiserror::Error;

use crate::merges::TokenId;

/// Main error type for tokenizer operations.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Malformed persisted merge table: bad key syntax, non-integer value,
    /// a result ID in the byte range, a duplicated result, or JSON that
    /// does not parse at all.
    #[error("malformed merge table: {0}")]
    Format(String),

    /// Decode received a token ID with no vocabulary entry.
    #[error("unknown token id: {0}")]
    UnknownToken(TokenId),

    /// Input that cannot be interpreted at the API boundary.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A merge rule referenced a token ID that was not yet defined while
    /// building the vocabulary. Unreachable for tables produced by a real
    /// training run.
    #[error("merge table references undefined token id: {0}")]
    Inconsistent(TokenId),

    /// I/O failure with file context.
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
