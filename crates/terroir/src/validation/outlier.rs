//! Grouped z-score outlier detection.
//!
//! A column is standardized twice: within a fine-grained partition (e.g. GI
//! region) restricted to partitions with enough members, and within a coarse
//! partition (e.g. climate zone) with no population gate. A row is an
//! outlier when either pass puts it beyond the threshold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::check::{Check, CheckKind, Flag, Verdicts};
use crate::error::Result;
use crate::input::{MemberId, RowTable, Value};

/// Absolute z-score a value must exceed to be flagged.
pub const DEFAULT_THRESHOLD: f64 = 2.5;

/// Fine-grained partitions need strictly more than this many values.
pub const DEFAULT_MIN_POPULATION: usize = 5;

/// Outlier detection settings shared by every grouped check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub threshold: f64,
    pub min_population: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_population: DEFAULT_MIN_POPULATION,
        }
    }
}

/// How rows are partitioned before standardizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    /// Partition by the values of a categorical column; rows with a missing
    /// key belong to no partition.
    Column(String),
    /// One partition holding every row.
    All,
}

impl Grouping {
    pub fn column(name: impl Into<String>) -> Self {
        Grouping::Column(name.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Grouping::Column(name) => name,
            Grouping::All => "all members",
        }
    }

    /// Row indices per partition key, in key order.
    fn partition(&self, table: &RowTable) -> Result<BTreeMap<String, Vec<usize>>> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        match self {
            Grouping::All => {
                groups.insert(String::new(), (0..table.len()).collect());
            }
            Grouping::Column(name) => {
                for (row, key) in table.column(name)?.iter().enumerate() {
                    if let Value::Missing = key {
                        continue;
                    }
                    groups.entry(key.to_string()).or_default().push(row);
                }
            }
        }
        Ok(groups)
    }
}

/// Which pass flagged a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Fine,
    Coarse,
}

/// A value judged unusual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierHit {
    /// The original column value.
    pub value: f64,
    pub z_score: f64,
    pub pass: Pass,
}

/// Mean and sample deviation of one partition, accumulated with Welford's
/// algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupStats {
    pub count: usize,
    pub mean: f64,
    m2: f64,
}

impl GroupStats {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut stats = Self::default();
        for v in values {
            stats.add(v);
        }
        stats
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Sample standard deviation (n - 1 denominator); `None` below two values.
    pub fn std(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        Some((self.m2 / (self.count - 1) as f64).sqrt())
    }

    /// Standardized score, undefined when the deviation is zero or unknown.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        let std = self.std()?;
        if std == 0.0 || !std.is_finite() {
            return None;
        }
        Some((value - self.mean) / std)
    }
}

/// Detects grouped outliers in one numeric column.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupedOutlierDetector {
    config: OutlierConfig,
}

impl GroupedOutlierDetector {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    /// Standardize `column` within each partition of `grouping` and return
    /// the rows beyond the threshold. With `gated`, partitions holding
    /// `min_population` values or fewer are skipped.
    pub fn pass(
        &self,
        table: &RowTable,
        column: &str,
        grouping: &Grouping,
        gated: bool,
    ) -> Result<BTreeMap<MemberId, (f64, f64)>> {
        let values = table.numbers(column)?;
        let groups = grouping.partition(table)?;
        let ids = table.ids();
        let mut hits = BTreeMap::new();

        for rows in groups.values() {
            let present: Vec<(usize, f64)> = rows
                .iter()
                .filter_map(|&row| values[row].map(|v| (row, v)))
                .collect();
            if gated && present.len() <= self.config.min_population {
                continue;
            }

            let stats = GroupStats::from_values(present.iter().map(|(_, v)| *v));
            for (row, value) in present {
                if let Some(z) = stats.z_score(value) {
                    if z.abs() > self.config.threshold {
                        hits.insert(ids[row], (value, z));
                    }
                }
            }
        }

        Ok(hits)
    }

    /// Combine the gated fine pass with the ungated coarse pass. When both
    /// flag a row, the coarse result is kept.
    pub fn detect(
        &self,
        table: &RowTable,
        column: &str,
        fine: &Grouping,
        coarse: &Grouping,
    ) -> Result<BTreeMap<MemberId, OutlierHit>> {
        let mut hits: BTreeMap<MemberId, OutlierHit> = self
            .pass(table, column, fine, true)?
            .into_iter()
            .map(|(id, (value, z_score))| {
                (
                    id,
                    OutlierHit {
                        value,
                        z_score,
                        pass: Pass::Fine,
                    },
                )
            })
            .collect();

        for (id, (value, z_score)) in self.pass(table, column, coarse, false)? {
            hits.insert(
                id,
                OutlierHit {
                    value,
                    z_score,
                    pass: Pass::Coarse,
                },
            );
        }

        Ok(hits)
    }
}

/// Report column for one outlier-checked metric.
pub struct OutlierCheck {
    name: String,
    column: String,
    fine: Grouping,
    coarse: Grouping,
    detector: GroupedOutlierDetector,
}

impl OutlierCheck {
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        fine: Grouping,
        coarse: Grouping,
        config: OutlierConfig,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            fine,
            coarse,
            detector: GroupedOutlierDetector::new(config),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Hits with their z-scores and flagging pass.
    pub fn hits(&self, table: &RowTable) -> Result<BTreeMap<MemberId, OutlierHit>> {
        self.detector
            .detect(table, &self.column, &self.fine, &self.coarse)
    }
}

impl Check for OutlierCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CheckKind {
        CheckKind::Outlier
    }

    fn description(&self) -> String {
        format!(
            "'{}' more than {} standard deviations from the mean of its {} (groups over {} members) or {}",
            self.column,
            self.detector.config.threshold,
            self.fine.label(),
            self.detector.config.min_population,
            self.coarse.label()
        )
    }

    fn evaluate(&self, table: &RowTable) -> Result<Verdicts> {
        Ok(self
            .hits(table)?
            .into_iter()
            .map(|(id, hit)| (id, Flag::Value(hit.value)))
            .collect())
    }
}
