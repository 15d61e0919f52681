//! Merging check outcomes into one table keyed by member.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::input::MemberId;
use crate::section::Section;
use crate::validation::{CheckKind, CheckOutcome, Flag};

/// Width identifiers are zero-padded to.
pub const DEFAULT_ID_WIDTH: usize = 5;

/// One report column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckColumn {
    pub name: String,
    pub kind: CheckKind,
    pub description: String,
    /// Number of members flagged.
    pub flagged: usize,
}

/// A member with at least one flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub id: MemberId,
    /// Zero-padded identifier.
    pub key: String,
    /// One cell per report column, in column order.
    pub cells: Vec<Option<Flag>>,
}

impl ReportRow {
    pub fn flag_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// The per-section problems table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemReport {
    pub section: Section,
    pub id_width: usize,
    pub columns: Vec<CheckColumn>,
    /// Rows ordered by identifier.
    pub rows: Vec<ReportRow>,
}

impl ProblemReport {
    /// Align the outcomes by member and keep members flagged at least once.
    pub fn build(section: Section, outcomes: &[CheckOutcome], id_width: usize) -> Self {
        let columns = outcomes
            .iter()
            .map(|o| CheckColumn {
                name: o.name.clone(),
                kind: o.kind,
                description: o.description.clone(),
                flagged: o.flagged(),
            })
            .collect();

        let ids: BTreeSet<MemberId> = outcomes
            .iter()
            .flat_map(|o| o.flags.keys().copied())
            .collect();

        let rows = ids
            .into_iter()
            .map(|id| ReportRow {
                id,
                key: id.padded(id_width),
                cells: outcomes.iter().map(|o| o.flags.get(&id).copied()).collect(),
            })
            .filter(|row| row.flag_count() > 0)
            .collect();

        Self {
            section,
            id_width,
            columns,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Total number of flagged cells.
    pub fn flag_count(&self) -> usize {
        self.rows.iter().map(ReportRow::flag_count).sum()
    }

    /// The row for a member, if flagged.
    pub fn row(&self, id: MemberId) -> Option<&ReportRow> {
        self.rows
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Cell by padded identifier and column name.
    pub fn cell(&self, key: &str, column: &str) -> Option<Flag> {
        let col = self.columns.iter().position(|c| c.name == column)?;
        self.rows
            .iter()
            .find(|r| r.key == key)
            .and_then(|r| r.cells[col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Verdicts;

    fn outcome(name: &str, flags: &[(u64, Flag)]) -> CheckOutcome {
        let flags: Verdicts = flags.iter().map(|(id, f)| (MemberId(*id), *f)).collect();
        CheckOutcome {
            name: name.to_string(),
            kind: CheckKind::Pairwise,
            description: String::new(),
            flags,
        }
    }

    #[test]
    fn test_outer_union_sorted_and_padded() {
        let outcomes = vec![
            outcome("Unusual t/ha", &[(420, Flag::Value(31.5))]),
            outcome("No irrigation", &[(42, Flag::Yes), (420, Flag::Yes)]),
            outcome("No fuel", &[]),
        ];
        let report = ProblemReport::build(Section::Vineyard, &outcomes, DEFAULT_ID_WIDTH);

        assert_eq!(report.columns.len(), 3);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].key, "00042");
        assert_eq!(report.rows[0].cells, vec![None, Some(Flag::Yes), None]);
        assert_eq!(report.rows[1].key, "00420");
        assert_eq!(report.cell("00420", "Unusual t/ha"), Some(Flag::Value(31.5)));
        assert_eq!(report.flag_count(), 3);
        assert_eq!(report.columns[2].flagged, 0);
    }

    #[test]
    fn test_no_flags_gives_empty_report() {
        let outcomes = vec![outcome("No fuel", &[])];
        let report = ProblemReport::build(Section::Winery, &outcomes, DEFAULT_ID_WIDTH);
        assert!(report.is_empty());
        assert_eq!(report.column_names().collect::<Vec<_>>(), vec!["No fuel"]);
    }

    #[test]
    fn test_row_lookup() {
        let outcomes = vec![outcome("x", &[(7, Flag::Yes), (3, Flag::Yes)])];
        let report = ProblemReport::build(Section::Winery, &outcomes, 3);
        assert_eq!(report.row(MemberId(7)).map(|r| r.key.as_str()), Some("007"));
        assert!(report.row(MemberId(5)).is_none());
    }
}
