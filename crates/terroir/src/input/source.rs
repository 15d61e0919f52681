//! Provenance of a loaded sheet.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::table::RowTable;

/// What was loaded, from where, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without directories.
    pub file: String,
    /// `sha256:<hex>` of the raw bytes.
    pub hash: String,
    pub size_bytes: u64,
    /// `csv`, `tsv`, ...
    pub format: String,
    /// Member rows kept after skipping blank lines.
    pub row_count: usize,
    /// Columns including the identifier column.
    pub column_count: usize,
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Describe a sheet from its raw bytes and the table read from them.
    pub fn describe(path: &Path, contents: &[u8], delimiter: u8, table: &RowTable) -> Self {
        Self {
            file: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            hash: content_hash(contents),
            size_bytes: contents.len() as u64,
            format: format_name(delimiter).to_string(),
            row_count: table.len(),
            column_count: table.column_count() + 1,
            loaded_at: Utc::now(),
        }
    }
}

pub fn content_hash(contents: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(contents))
}

/// Short name for a delimiter, as shown in summaries.
pub fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b',' => "csv",
        b'\t' => "tsv",
        b';' => "ssv",
        b'|' => "psv",
        _ => "delimited",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MemberId;

    #[test]
    fn test_describe() {
        let table = RowTable::new(vec![MemberId(1), MemberId(2)]).unwrap();
        let meta = SourceMetadata::describe(Path::new("/tmp/2024/vineyard.csv"), b"abc", b'\t', &table);

        assert_eq!(meta.file, "vineyard.csv");
        assert_eq!(meta.format, "tsv");
        assert_eq!(meta.row_count, 2);
        assert_eq!(meta.column_count, 1);
        assert_eq!(meta.size_bytes, 3);
        assert_eq!(
            meta.hash,
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
