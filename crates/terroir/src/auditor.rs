//! Main Auditor struct and public API.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::derive::{derive_all, prepare_for_audit};
use crate::error::{Result, TerroirError};
use crate::input::{Parser, ParserConfig, RowTable, SourceMetadata};
use crate::report::{ProblemReport, DEFAULT_ID_WIDTH};
use crate::section::Section;
use crate::validation::{checks_for, Check, CheckEngine, OutlierConfig};

/// Configuration for an audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Loader configuration.
    pub parser: ParserConfig,
    /// Grouped outlier settings.
    pub outlier: OutlierConfig,
    /// Width identifiers are zero-padded to in the report.
    pub id_width: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            outlier: OutlierConfig::default(),
            id_width: DEFAULT_ID_WIDTH,
        }
    }
}

impl AuditConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TerroirError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AuditConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no audit can run with.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.outlier.threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(TerroirError::Config(format!(
                "outlier threshold must be a positive number, got {}",
                threshold
            )));
        }
        if self.id_width == 0 {
            return Err(TerroirError::Config(
                "identifier width must be at least 1".to_string(),
            ));
        }
        if self.parser.identifier_column.trim().is_empty() {
            return Err(TerroirError::Config(
                "identifier column name is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of auditing one survey sheet.
#[derive(Debug, Clone)]
pub struct AuditResult {
    /// Metadata about the source file, when audited from disk.
    pub source: Option<SourceMetadata>,
    pub section: Section,
    /// The problems table.
    pub report: ProblemReport,
    /// Summary statistics.
    pub summary: AuditSummary,
}

/// Summary of the audit results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditSummary {
    /// Members in the sheet.
    pub members: usize,
    /// Members with at least one flag.
    pub flagged_members: usize,
    /// Total flagged cells.
    pub total_flags: usize,
    /// Members flagged per check, in report column order.
    pub flags_by_check: IndexMap<String, usize>,
}

impl AuditSummary {
    fn from_report(members: usize, report: &ProblemReport) -> Self {
        Self {
            members,
            flagged_members: report.rows.len(),
            total_flags: report.flag_count(),
            flags_by_check: report
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.flagged))
                .collect(),
        }
    }

    /// Share of members flagged at least once (0.0-1.0).
    pub fn flagged_share(&self) -> f64 {
        if self.members == 0 {
            0.0
        } else {
            self.flagged_members as f64 / self.members as f64
        }
    }
}

/// Runs the survey audit pipeline.
pub struct Auditor {
    config: AuditConfig,
    parser: Parser,
}

impl Auditor {
    /// Create a new Auditor with default configuration.
    pub fn new() -> Self {
        Self::with_config(AuditConfig::default())
    }

    /// Create an Auditor with custom configuration.
    pub fn with_config(config: AuditConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        Self { config, parser }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// The checks run for a section, in report column order.
    pub fn checks(&self, section: Section) -> Vec<Box<dyn Check>> {
        checks_for(section, &self.config.outlier)
    }

    /// Load a sheet export and audit it.
    pub fn audit_file(&self, path: impl AsRef<Path>, section: Section) -> Result<AuditResult> {
        let (table, source) = self.parser.parse_file(path)?;
        let mut result = self.audit_table(table, section)?;
        result.source = Some(source);
        Ok(result)
    }

    /// Audit an already loaded sheet.
    pub fn audit_table(&self, mut table: RowTable, section: Section) -> Result<AuditResult> {
        if table.is_empty() {
            return Err(TerroirError::EmptyData(format!("{} sheet has no members", section)));
        }

        prepare_for_audit(&mut table, section)?;

        let engine = CheckEngine::new(self.checks(section));
        let outcomes = engine.run(&table)?;
        let report = ProblemReport::build(section, &outcomes, self.config.id_width);
        let summary = AuditSummary::from_report(table.len(), &report);

        Ok(AuditResult {
            source: None,
            section,
            report,
            summary,
        })
    }

    /// Load a sheet export and add every derived metric column.
    pub fn metrics_file(
        &self,
        path: impl AsRef<Path>,
        section: Section,
    ) -> Result<(RowTable, SourceMetadata)> {
        let (table, source) = self.parser.parse_file(path)?;
        Ok((self.metrics_table(table, section)?, source))
    }

    pub fn metrics_table(&self, mut table: RowTable, section: Section) -> Result<RowTable> {
        derive_all(&mut table, section)?;
        Ok(table)
    }
}

impl Default for Auditor {
    fn default() -> Self {
        Self::new()
    }
}
