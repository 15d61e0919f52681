//! CSV/TSV loader with delimiter detection.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::source::SourceMetadata;
use super::table::{is_null_value, MemberId, RowTable, Value};
use crate::error::{Result, TerroirError};

const CANDIDATES: &[u8] = &[b',', b'\t', b';', b'|'];

/// Non-blank lines inspected when sniffing.
const SNIFF_LINES: usize = 10;

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Field delimiter; sniffed from the file when unset.
    pub delimiter: Option<u8>,
    /// Header of the member identifier column.
    pub identifier_column: String,
    /// Stop after this many member rows.
    pub max_rows: Option<usize>,
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            identifier_column: "Membership Number".to_string(),
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Loads a delimited export of one survey sheet.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read a sheet export from disk, sniffing the delimiter unless configured.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(RowTable, SourceMetadata)> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|source| TerroirError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => sniff_delimiter(&contents, self.config.quote)?,
        };
        let table = self.parse_bytes(&contents, delimiter)?;
        let metadata = SourceMetadata::describe(path, &contents, delimiter, &table);

        Ok((table, metadata))
    }

    /// Read a sheet from memory with a known delimiter.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<RowTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers = dedupe_headers(reader.headers()?.iter().map(|h| h.trim()));
        if headers.is_empty() {
            return Err(TerroirError::EmptyData("No columns found".to_string()));
        }

        let id_col = headers
            .iter()
            .position(|h| *h == self.config.identifier_column)
            .ok_or_else(|| TerroirError::missing_column(&self.config.identifier_column))?;

        let mut ids = Vec::new();
        let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if ids.len() >= max {
                    break;
                }
            }

            let record = result?;
            // Trailing blank rows are common in spreadsheet exports
            if record.iter().all(is_null_value) {
                continue;
            }

            let raw_id = record.get(id_col).unwrap_or("");
            ids.push(MemberId::parse(raw_id, row_idx + 1)?);

            for (col_idx, column) in cells.iter_mut().enumerate() {
                column.push(Value::parse(record.get(col_idx).unwrap_or("")));
            }
        }

        if ids.is_empty() {
            return Err(TerroirError::EmptyData("No data rows found".to_string()));
        }

        let mut table = RowTable::new(ids)?;
        for (col_idx, (name, values)) in headers.into_iter().zip(cells).enumerate() {
            if col_idx != id_col {
                table.insert_column(name, values)?;
            }
        }

        Ok(table)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Rename repeated headers to `name.1`, `name.2`, ... in order of appearance,
/// skipping any suffix another header already uses.
///
/// The survey sheets repeat headers such as "Solar" and "Applied" across
/// sections; the checks address the later copies by their suffixed names.
fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let headers: Vec<&str> = headers.collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut next_suffix: HashMap<&str, usize> = HashMap::new();

    headers
        .into_iter()
        .map(|h| {
            let mut name = h.to_string();
            if taken.contains(&name) {
                let suffix = next_suffix.entry(h).or_insert(0);
                loop {
                    *suffix += 1;
                    name = format!("{}.{}", h, suffix);
                    if !taken.contains(&name) {
                        break;
                    }
                }
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

/// Pick the candidate that splits the opening lines into the same number
/// of fields on every line, preferring more fields, then tab.
fn sniff_delimiter(bytes: &[u8], quote: u8) -> Result<u8> {
    let sample: Vec<&[u8]> = bytes
        .split(|&b| b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .take(SNIFF_LINES)
        .collect();
    if sample.is_empty() {
        return Err(TerroirError::EmptyData("No lines to analyze".to_string()));
    }
    let sample = sample.join(&b'\n');

    let best = CANDIDATES
        .iter()
        .filter_map(|&delimiter| {
            let widths = field_counts(&sample, delimiter, quote);
            let header = *widths.first()?;
            if header < 2 {
                return None;
            }
            let consistent = widths.iter().all(|&w| w == header);
            Some(((consistent, header, delimiter == b'\t'), delimiter))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, delimiter)| delimiter);

    Ok(best.unwrap_or(b','))
}

/// Fields per record when `sample` is split on `delimiter`.
fn field_counts(sample: &[u8], delimiter: u8, quote: u8) -> Vec<usize> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(quote)
        .has_headers(false)
        .flexible(true)
        .from_reader(sample)
        .records()
        .map_while(|record| record.ok().map(|r| r.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_comma() {
        let data = b"Membership Number,Solar,Wind\n1,2,3\n4,5,6";
        assert_eq!(sniff_delimiter(data, b'"').unwrap(), b',');
    }

    #[test]
    fn test_sniff_tab_with_commas_in_header() {
        let data = b"Membership Number\tOther, please specify\n1\tNetting\n2\t\n";
        assert_eq!(sniff_delimiter(data, b'"').unwrap(), b'\t');
    }

    #[test]
    fn test_sniff_ignores_quoted_delimiters() {
        let data = b"Membership Number,\"Mulch; straw\"\n1,2\n";
        assert_eq!(sniff_delimiter(data, b'"').unwrap(), b',');
    }

    #[test]
    fn test_sniff_empty_input() {
        assert!(matches!(
            sniff_delimiter(b"\n  \n", b'"'),
            Err(TerroirError::EmptyData(_))
        ));
    }

    #[test]
    fn test_parse_sheet() {
        let parser = Parser::new();
        let data = b"Membership Number,GI Region,Red grapes\n42,Orange,12.5\n7,Riverland,\n";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.ids(), &[MemberId(42), MemberId(7)]);
        assert!(!table.has_column("Membership Number"));
        assert_eq!(table.get(0, "Red grapes"), Some(&Value::Number(12.5)));
        assert_eq!(table.get(1, "Red grapes"), Some(&Value::Missing));
        assert_eq!(
            table.get(1, "GI Region"),
            Some(&Value::Text("Riverland".to_string()))
        );
    }

    #[test]
    fn test_repeated_headers_get_suffixes() {
        let headers = dedupe_headers(["Solar", "Wind", "Solar", "Solar"].into_iter());
        assert_eq!(headers, vec!["Solar", "Wind", "Solar.1", "Solar.2"]);
    }

    #[test]
    fn test_repeated_headers_avoid_existing_suffixes() {
        let headers = dedupe_headers(["Solar", "Solar.1", "Solar"].into_iter());
        assert_eq!(headers, vec!["Solar", "Solar.1", "Solar.2"]);
    }

    #[test]
    fn test_sheet_with_colliding_suffix_loads() {
        let parser = Parser::new();
        let data = b"Membership Number,Solar,Solar.1,Solar\n1,5,6,7\n";
        let table = parser.parse_bytes(data, b',').unwrap();
        assert_eq!(table.get(0, "Solar.1"), Some(&Value::Number(6.0)));
        assert_eq!(table.get(0, "Solar.2"), Some(&Value::Number(7.0)));
    }

    #[test]
    fn test_blank_rows_skipped() {
        let parser = Parser::new();
        let data = b"Membership Number,Solar\n1,5\n,\n";
        let table = parser.parse_bytes(data, b',').unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_identifier_column() {
        let parser = Parser::new();
        let err = parser.parse_bytes(b"id,Solar\n1,5\n", b',').unwrap_err();
        assert!(matches!(err, TerroirError::MissingColumn { .. }));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let parser = Parser::new();
        let err = parser
            .parse_bytes(b"Membership Number,Solar\n1,5\n1,6\n", b',')
            .unwrap_err();
        assert!(matches!(err, TerroirError::DuplicateIdentifier(1)));
    }
}
