//! Integration tests for the survey audit.

use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

use terroir::derive::{vineyard, winery};
use terroir::report::write_report;
use terroir::{Auditor, Flag, ReportFormat, Section, TerroirError, Value};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// Build a sheet export: one header per column, empty cells unless set.
fn sheet(columns: &[&str], rows: &[(u64, Vec<(&str, &str)>)], delimiter: char) -> String {
    let mut header: Vec<&str> = vec!["Membership Number"];
    for column in columns {
        if !header.contains(column) {
            header.push(column);
        }
    }

    // Survey headers can contain the delimiter
    let field = |s: &str| {
        if s.contains(delimiter) {
            format!("\"{}\"", s)
        } else {
            s.to_string()
        }
    };
    let join = |fields: Vec<String>| fields.join(&delimiter.to_string());

    let mut out = join(header.iter().map(|h| field(*h)).collect());
    out.push('\n');
    for (id, cells) in rows {
        let cells: HashMap<&str, &str> = cells.iter().copied().collect();
        let line = header
            .iter()
            .map(|h| {
                if *h == "Membership Number" {
                    id.to_string()
                } else {
                    field(cells.get(h).copied().unwrap_or(""))
                }
            })
            .collect();
        out.push_str(&join(line));
        out.push('\n');
    }
    out
}

fn vineyard_columns() -> Vec<&'static str> {
    let mut columns = vineyard::check_input_columns();
    columns.extend(vineyard::sustainability_input_columns());
    columns
}

/// A typical Barossa member: 10 ha, 50 t, 20 ML, fully drip irrigated.
fn typical_vineyard(harvested: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("GI Region", "Barossa Valley"),
        ("Red grapes", "10"),
        ("Grapes harvested", harvested),
        ("River water", "20"),
        ("Irrigation type - Dripper", "10"),
        ("Diesel (L)", "100"),
        ("Slashing", "We perform"),
        ("Annual cover crop", "10"),
        ("Electricity from the grid", "1000"),
        ("Electricity", "1"),
    ]
}

fn vineyard_sheet() -> String {
    let mut rows: Vec<(u64, Vec<(&str, &str)>)> = (1001..=1011)
        .map(|id| (id, typical_vineyard("50")))
        .collect();
    // Harvest ten times the regional yield
    rows.push((1012, typical_vineyard("5000")));

    // Water without irrigation, electric pump without grid electricity
    let mut member = typical_vineyard("50");
    member.retain(|(c, _)| *c != "Irrigation type - Dripper" && *c != "Electricity from the grid");
    rows.push((7, member));

    sheet(&vineyard_columns(), &rows, ',')
}

fn winery_sheet() -> String {
    let medium = |full: &'static str| {
        vec![
            ("Tonnes crushed", "1000"),
            ("Full winemaking", full),
            ("Water used", "3000"),
            ("Wastewater generated", "1500"),
            ("Electricity from the grid", "50000"),
            ("Diesel (L)", "200"),
            ("Refrigerant", "1"),
        ]
    };
    let mut rows: Vec<(u64, Vec<(&str, &str)>)> = (1..=12).map(|id| (id, medium("700"))).collect();
    rows.push((13, medium("7000")));
    // Large winery, same intensities, no refrigerant reported
    rows.push((
        14,
        vec![
            ("Tonnes crushed", "20000"),
            ("Full winemaking", "14000"),
            ("Water used", "60000"),
            ("Wastewater generated", "30000"),
            ("Electricity from the grid", "1000000"),
            ("Diesel (L)", "4000"),
        ],
    ));

    sheet(&winery::check_input_columns(), &rows, ',')
}

// =============================================================================
// Vineyard Audit Tests
// =============================================================================

#[test]
fn test_vineyard_audit_end_to_end() {
    let file = create_test_file(&vineyard_sheet());

    let result = Auditor::new()
        .audit_file(file.path(), Section::Vineyard)
        .expect("Audit failed");

    let source = result.source.as_ref().expect("source metadata");
    assert_eq!(source.row_count, 13);
    assert_eq!(source.format, "csv");
    assert!(source.hash.starts_with("sha256:"));

    let report = &result.report;
    assert_eq!(report.columns.len(), 26);

    let keys: Vec<&str> = report.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["00007", "01012"]);

    assert_eq!(report.cell("01012", "Unusual t/ha"), Some(Flag::Value(500.0)));
    assert_eq!(report.cell("01012", "Unusual ml/ha"), None);

    for check in [
        "Using water without irrigation",
        "No irrigation",
        "Electric irrigation and no electricity from grid used",
        "No electricity from the grid and no Solar",
    ] {
        assert_eq!(report.cell("00007", check), Some(Flag::Yes), "{}", check);
    }
    assert_eq!(report.cell("00007", "Unusual t/ha"), None);
    assert_eq!(report.cell("00007", "No fuel and No contractors"), None);

    assert_eq!(result.summary.members, 13);
    assert_eq!(result.summary.flagged_members, 2);
    assert_eq!(result.summary.flags_by_check["No irrigation"], 1);
}

#[test]
fn test_report_is_idempotent() {
    let file = create_test_file(&vineyard_sheet());
    let auditor = Auditor::new();

    let render = || {
        let result = auditor
            .audit_file(file.path(), Section::Vineyard)
            .expect("Audit failed");
        let mut buf = Vec::new();
        write_report(&result.report, ReportFormat::Csv, &mut buf).expect("Write failed");
        buf
    };

    let first = render();
    assert_eq!(first, render());

    let text = String::from_utf8(first).unwrap();
    assert!(text.starts_with("Membership Number,Unusual t/ha,"));
    assert!(text.contains("\n00007,"));
    assert!(text.contains("\n01012,500,"));
}

#[test]
fn test_vineyard_tsv_input() {
    let rows = vec![(42, typical_vineyard("50"))];
    let file = create_test_file(&sheet(&vineyard_columns(), &rows, '\t'));

    let result = Auditor::new()
        .audit_file(file.path(), Section::Vineyard)
        .expect("Audit failed");
    assert_eq!(result.source.as_ref().map(|s| s.format.as_str()), Some("tsv"));
    // One consistent member: nothing to report
    assert!(result.report.is_empty());
}

#[test]
fn test_missing_column_is_fatal() {
    let mut columns = vineyard_columns();
    columns.retain(|c| *c != "Groundwater");
    let rows = vec![(1, typical_vineyard("50"))];
    let file = create_test_file(&sheet(&columns, &rows, ','));

    let err = Auditor::new()
        .audit_file(file.path(), Section::Vineyard)
        .unwrap_err();
    assert!(matches!(err, TerroirError::MissingColumn { ref column } if column == "Groundwater"));
}

#[test]
fn test_id_width_is_configurable() {
    let mut config = terroir::AuditConfig::default();
    config.id_width = 8;
    let file = create_test_file(&vineyard_sheet());

    let result = Auditor::with_config(config)
        .audit_file(file.path(), Section::Vineyard)
        .expect("Audit failed");
    assert_eq!(result.report.rows[0].key, "00000007");
}

// =============================================================================
// Winery Audit Tests
// =============================================================================

#[test]
fn test_winery_audit_end_to_end() {
    let file = create_test_file(&winery_sheet());

    let result = Auditor::new()
        .audit_file(file.path(), Section::Winery)
        .expect("Audit failed");
    let report = &result.report;

    assert_eq!(report.columns.len(), 10);
    assert_eq!(
        report.cell("00013", "Unusual % Extraction (both)"),
        Some(Flag::Value(7.0))
    );
    assert_eq!(
        report.cell("00014", "No Refrigerants (Medium+ size)"),
        Some(Flag::Yes)
    );
    assert_eq!(report.cell("00014", "Unusual % Extraction (both)"), None);
    assert!(report.row(terroir::MemberId(1)).is_none());
    assert_eq!(result.summary.flags_by_check["No fuel"], 0);
}

#[test]
fn test_winery_json_report() {
    let file = create_test_file(&winery_sheet());
    let result = Auditor::new()
        .audit_file(file.path(), Section::Winery)
        .expect("Audit failed");

    let mut buf = Vec::new();
    write_report(&result.report, ReportFormat::Json, &mut buf).expect("Write failed");
    let doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(doc["section"], "winery");
    assert_eq!(doc["checks"].as_array().map(|c| c.len()), Some(10));
    assert!(doc["generated_at"].is_string());
}

// =============================================================================
// Metrics Tests
// =============================================================================

#[test]
fn test_vineyard_metrics_export() {
    let file = create_test_file(&vineyard_sheet());

    let (table, source) = Auditor::new()
        .metrics_file(file.path(), Section::Vineyard)
        .expect("Metrics failed");
    assert_eq!(table.len(), source.row_count);

    let row = table.row_of(terroir::MemberId(1001)).unwrap();
    assert_eq!(table.get(row, "t/ha"), Some(&Value::Number(5.0)));
    assert_eq!(table.get(row, "Electricity kg CO2e"), Some(&Value::Number(510.0)));
    assert_eq!(
        table.get(row, "Climate"),
        Some(&Value::Text("Warm Very Dry".to_string()))
    );
    assert_eq!(table.get(row, "Vineyard Size"), Some(&Value::Number(2.0)));
}

#[test]
fn test_winery_metrics_export() {
    let file = create_test_file(&winery_sheet());

    let (table, _) = Auditor::new()
        .metrics_file(file.path(), Section::Winery)
        .expect("Metrics failed");
    let row = table.row_of(terroir::MemberId(14)).unwrap();
    assert_eq!(table.get(row, "Size"), Some(&Value::Text("Large".to_string())));
    assert_eq!(table.get(row, "% Extraction"), Some(&Value::Number(0.7)));
}
