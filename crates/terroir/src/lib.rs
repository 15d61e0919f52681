//! Terroir: data-quality audit for vineyard and winery sustainability surveys.
//!
//! Terroir reads a delimited export of one survey sheet, derives intensity
//! and emissions metrics per member, and produces a problems report flagging
//! members whose figures are statistically unusual or internally
//! inconsistent, for human review.
//!
//! # Core Principles
//!
//! - **Grouped outliers**: values are standardized within a fine grouping
//!   (GI region, winery size) and a coarse one (climate zone, whole sheet)
//! - **Declarative rules**: consistency checks are a table of parameterized
//!   pair and predicate rules
//! - **Flag, don't fix**: the source data is never modified
//!
//! # Example
//!
//! ```no_run
//! use terroir::{Auditor, Section};
//!
//! let auditor = Auditor::new();
//! let result = auditor.audit_file("vineyard.csv", Section::Vineyard).unwrap();
//!
//! println!("Members: {}", result.summary.members);
//! println!("Flagged: {}", result.summary.flagged_members);
//! ```

pub mod classify;
pub mod derive;
pub mod error;
pub mod input;
pub mod report;
pub mod section;
pub mod validation;

mod auditor;

pub use crate::auditor::{AuditConfig, AuditResult, AuditSummary, Auditor};
pub use error::{Result, TerroirError};
pub use input::{MemberId, RowTable, SourceMetadata, Value};
pub use report::{ProblemReport, ReportFormat};
pub use section::Section;
pub use validation::{Check, CheckKind, Flag, OutlierConfig};
