//! The persisted merge-table artifact.
//!
//! A JSON record of the shape
//!
//! ```json
//! {
//!   "merges": { "104,105": 256, "256,33": 257 },
//!   "vocab_size": 5000,
//!   "num_merges": 2,
//!   "description": "optional free text"
//! }
//! ```
//!
//! Each key is `"<left>,<right>"`, two decimal integers and one comma with
//! no whitespace. `vocab_size` and `num_merges` are informational and not
//! validated against the entry count. Entries are applied in file iteration
//! order, so a later duplicate key overwrites an earlier one.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TokenizerError};
use crate::merges::{MergeTable, Pair, TokenId};

fn default_vocab_size() -> u32 {
    5000
}

/// In-memory form of the merge-table JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergesFile {
    /// `"<left>,<right>"` -> result token ID. Kept as a raw JSON map so
    /// that iteration follows the file and malformed entries surface as
    /// [`TokenizerError::Format`] with the offending key, not as an opaque
    /// deserialization failure.
    pub merges: Map<String, Value>,
    /// Informational total vocabulary size.
    #[serde(default = "default_vocab_size")]
    pub vocab_size: u32,
    /// Informational rule count; refreshed from the live table on save.
    #[serde(default)]
    pub num_merges: usize,
    /// Optional free-text provenance note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MergesFile {
    /// Parse the JSON text of a merges artifact.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| TokenizerError::Format(format!("invalid merges JSON: {e}")))
    }

    /// Serialize back to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TokenizerError::Format(format!("cannot serialize merges: {e}")))
    }

    /// Read and parse an artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| TokenizerError::Io {
            path: path.to_path_buf(),
            err,
        })?;
        Self::from_json(&text)
    }

    /// Write the artifact to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_json()?;
        fs::write(path, text).map_err(|err| TokenizerError::Io {
            path: path.to_path_buf(),
            err,
        })
    }

    /// Validate every entry and build the in-memory [`MergeTable`],
    /// preserving file iteration order.
    pub fn into_merge_table(self) -> Result<MergeTable> {
        let mut entries = Vec::with_capacity(self.merges.len());
        for (key, value) in &self.merges {
            let pair = parse_pair_key(key)?;
            let result = value.as_u64().ok_or_else(|| {
                TokenizerError::Format(format!("merge value for \"{key}\" is not an integer"))
            })?;
            let result = TokenId::try_from(result).map_err(|_| {
                TokenizerError::Format(format!("merge result for \"{key}\" out of range"))
            })?;
            entries.push((pair, result));
        }
        MergeTable::new(entries)
    }

    /// Serialize a table into the artifact shape, rules in ascending
    /// result order so the output is deterministic.
    pub fn from_merge_table(
        table: &MergeTable,
        vocab_size: u32,
        description: Option<String>,
    ) -> Self {
        let mut rules: Vec<(Pair, TokenId)> = table.iter().collect();
        rules.sort_by_key(|&(_, result)| result);

        let mut merges = Map::new();
        for ((left, right), result) in rules {
            merges.insert(format!("{left},{right}"), Value::from(result));
        }

        Self {
            merges,
            vocab_size,
            num_merges: table.len(),
            description,
        }
    }
}

/// Parse a `"<left>,<right>"` key into a token pair.
fn parse_pair_key(key: &str) -> Result<Pair> {
    let (left, right) = key.split_once(',').ok_or_else(|| {
        TokenizerError::Format(format!("merge key \"{key}\" is not \"<left>,<right>\""))
    })?;
    let left = left.parse::<TokenId>().map_err(|_| {
        TokenizerError::Format(format!("merge key \"{key}\" has a non-integer left id"))
    })?;
    let right = right.parse::<TokenId>().map_err(|_| {
        TokenizerError::Format(format!("merge key \"{key}\" has a non-integer right id"))
    })?;
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pair_keys() {
        assert_eq!(parse_pair_key("104,105").unwrap(), (104, 105));
        assert_eq!(parse_pair_key("0,255").unwrap(), (0, 255));
    }

    #[test]
    fn rejects_malformed_keys() {
        for key in ["104", "104;105", "a,105", "104,b", ",", "", "1,2,3"] {
            assert!(
                matches!(parse_pair_key(key), Err(TokenizerError::Format(_))),
                "key {key:?} should not parse"
            );
        }
    }

    #[test]
    fn loads_minimal_artifact() {
        let file = MergesFile::from_json(r#"{"merges": {"104,105": 256}}"#).unwrap();
        assert_eq!(file.vocab_size, 5000);
        assert_eq!(file.description, None);
        let table = file.into_merge_table().unwrap();
        assert_eq!(table.lookup(104, 105), Some((256, 256)));
    }

    #[test]
    fn rejects_non_integer_value() {
        let file = MergesFile::from_json(r#"{"merges": {"104,105": "256"}}"#).unwrap();
        assert!(matches!(
            file.into_merge_table(),
            Err(TokenizerError::Format(_))
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            MergesFile::from_json("{not json"),
            Err(TokenizerError::Format(_))
        ));
    }

    #[test]
    fn later_duplicate_key_wins_in_file_order() {
        // "01,2" parses to the same pair as "1,2"; the later entry wins.
        let file =
            MergesFile::from_json(r#"{"merges": {"1,2": 256, "01,2": 300}}"#).unwrap();
        let table = file.into_merge_table().unwrap();
        assert_eq!(table.lookup(1, 2), Some((300, 300)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn save_load_round_trip() {
        let table = MergeTable::new([((104, 105), 256), ((256, 33), 257)]).unwrap();
        let file = MergesFile::from_merge_table(&table, 5000, Some("test".to_string()));
        assert_eq!(file.num_merges, 2);

        let reloaded = MergesFile::from_json(&file.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.vocab_size, 5000);
        assert_eq!(reloaded.num_merges, 2);
        assert_eq!(reloaded.description.as_deref(), Some("test"));

        let table2 = reloaded.into_merge_table().unwrap();
        assert_eq!(table2.len(), table.len());
        for ((l, r), result) in table.iter() {
            assert_eq!(table2.lookup(l, r), Some((result, result)));
        }
    }

    #[test]
    fn round_trip_ignores_key_order() {
        let shuffled = r#"{"merges": {"256,33": 257, "104,105": 256}, "vocab_size": 300}"#;
        let table = MergesFile::from_json(shuffled)
            .unwrap()
            .into_merge_table()
            .unwrap();
        assert_eq!(table.lookup(104, 105), Some((256, 256)));
        assert_eq!(table.lookup(256, 33), Some((257, 257)));
    }
}
