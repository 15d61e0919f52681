//! Report and table sinks.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::problem::{CheckColumn, ProblemReport};
use crate::error::{Result, TerroirError};
use crate::input::{RowTable, Value};
use crate::section::Section;
use crate::validation::Flag;

/// Header of the identifier column in written files.
pub const ID_HEADER: &str = "Membership Number";

/// Output format of a report or table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Tsv => "tsv",
            ReportFormat::Json => "json",
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            ReportFormat::Tsv => b'\t',
            _ => b',',
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "tsv" | "tab" => Ok(ReportFormat::Tsv),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv, tsv, or json.", s)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    section: Section,
    generated_at: DateTime<Utc>,
    checks: &'a [CheckColumn],
    rows: Vec<IndexMap<&'a str, JsonCell<'a>>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonCell<'a> {
    Key(&'a str),
    Flag(Flag),
}

/// Write a problems report. Delimited output has one header row and empty
/// cells for checks that did not flag the member.
pub fn write_report<W: Write>(report: &ProblemReport, format: ReportFormat, writer: W) -> Result<()> {
    match format {
        ReportFormat::Csv | ReportFormat::Tsv => {
            let mut out = csv::WriterBuilder::new()
                .delimiter(format.delimiter())
                .from_writer(writer);

            let mut header = vec![ID_HEADER];
            header.extend(report.column_names());
            out.write_record(&header)?;

            for row in &report.rows {
                let mut record = Vec::with_capacity(row.cells.len() + 1);
                record.push(row.key.clone());
                record.extend(
                    row.cells
                        .iter()
                        .map(|c| c.map(|f| f.to_string()).unwrap_or_default()),
                );
                out.write_record(&record)?;
            }
            out.flush().map_err(csv::Error::from)?;
        }
        ReportFormat::Json => {
            let rows = report
                .rows
                .iter()
                .map(|row| {
                    let mut cells = IndexMap::new();
                    cells.insert(ID_HEADER, JsonCell::Key(&row.key));
                    for (column, cell) in report.columns.iter().zip(&row.cells) {
                        if let Some(flag) = cell {
                            cells.insert(column.name.as_str(), JsonCell::Flag(*flag));
                        }
                    }
                    cells
                })
                .collect();

            let doc = JsonReport {
                section: report.section,
                generated_at: Utc::now(),
                checks: &report.columns,
                rows,
            };
            serde_json::to_writer_pretty(writer, &doc)?;
        }
    }
    Ok(())
}

/// Write a table with its identifier column first.
pub fn write_table<W: Write>(table: &RowTable, format: ReportFormat, writer: W) -> Result<()> {
    match format {
        ReportFormat::Csv | ReportFormat::Tsv => {
            let mut out = csv::WriterBuilder::new()
                .delimiter(format.delimiter())
                .from_writer(writer);

            let mut header = vec![ID_HEADER];
            header.extend(table.column_names());
            out.write_record(&header)?;

            for (id, values) in table.rows() {
                let mut record = Vec::with_capacity(values.len() + 1);
                record.push(id.to_string());
                record.extend(values.iter().map(|v| v.to_string()));
                out.write_record(&record)?;
            }
            out.flush().map_err(csv::Error::from)?;
        }
        ReportFormat::Json => {
            let names: Vec<&str> = table.column_names().collect();
            let rows: Vec<IndexMap<&str, &Value>> = table
                .rows()
                .map(|(_, values)| names.iter().copied().zip(values).collect())
                .collect();
            let ids: Vec<u64> = table.ids().iter().map(|id| id.0).collect();

            #[derive(Serialize)]
            struct JsonTable<'a> {
                ids: Vec<u64>,
                rows: Vec<IndexMap<&'a str, &'a Value>>,
            }
            serde_json::to_writer_pretty(writer, &JsonTable { ids, rows })?;
        }
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let io_err = |e| TerroirError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    Ok(BufWriter::new(File::create(path).map_err(io_err)?))
}

/// Write a report to a file, creating parent directories as needed.
pub fn save_report(report: &ProblemReport, format: ReportFormat, path: impl AsRef<Path>) -> Result<()> {
    write_report(report, format, create(path.as_ref())?)
}

/// Write a table to a file, creating parent directories as needed.
pub fn save_table(table: &RowTable, format: ReportFormat, path: impl AsRef<Path>) -> Result<()> {
    write_table(table, format, create(path.as_ref())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MemberId;
    use crate::report::DEFAULT_ID_WIDTH;
    use crate::validation::{CheckKind, CheckOutcome};

    fn report() -> ProblemReport {
        let outcomes = vec![
            CheckOutcome {
                name: "Unusual ml/ha".to_string(),
                kind: CheckKind::Outlier,
                description: String::new(),
                flags: [(MemberId(42), Flag::Value(12.5))].into_iter().collect(),
            },
            CheckOutcome {
                name: "No irrigation".to_string(),
                kind: CheckKind::Predicate,
                description: String::new(),
                flags: [(MemberId(7), Flag::Yes)].into_iter().collect(),
            },
        ];
        ProblemReport::build(Section::Vineyard, &outcomes, DEFAULT_ID_WIDTH)
    }

    #[test]
    fn test_csv_report() {
        let mut buf = Vec::new();
        write_report(&report(), ReportFormat::Csv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Membership Number,Unusual ml/ha,No irrigation\n00007,,Yes\n00042,12.5,\n"
        );
    }

    #[test]
    fn test_tsv_report() {
        let mut buf = Vec::new();
        write_report(&report(), ReportFormat::Tsv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Membership Number\tUnusual ml/ha\tNo irrigation\n"));
        assert!(text.contains("00042\t12.5\t\n"));
    }

    #[test]
    fn test_json_report() {
        let mut buf = Vec::new();
        write_report(&report(), ReportFormat::Json, &mut buf).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(doc["section"], "vineyard");
        assert_eq!(doc["checks"][0]["kind"], "outlier");
        assert_eq!(doc["rows"][0]["Membership Number"], "00007");
        assert_eq!(doc["rows"][0]["No irrigation"], "Yes");
        assert!(doc["rows"][0].get("Unusual ml/ha").is_none());
        assert_eq!(doc["rows"][1]["Unusual ml/ha"], 12.5);
    }

    #[test]
    fn test_write_table() {
        let table = RowTable::new(vec![MemberId(3)])
            .unwrap()
            .with_column("t/ha", vec![Value::Number(4.0)])
            .unwrap()
            .with_column("Climate", vec![Value::Text("Hot Dry".into())])
            .unwrap()
            .with_column("ml/ha", vec![Value::Missing])
            .unwrap();
        let mut buf = Vec::new();
        write_table(&table, ReportFormat::Csv, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Membership Number,t/ha,Climate,ml/ha\n3,4,Hot Dry,\n"
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("TSV".parse::<ReportFormat>().unwrap(), ReportFormat::Tsv);
        assert!("xlsx".parse::<ReportFormat>().is_err());
        assert_eq!(
            ReportFormat::from_path(Path::new("out/problems.json")),
            Some(ReportFormat::Json)
        );
    }
}
