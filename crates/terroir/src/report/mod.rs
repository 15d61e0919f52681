//! Problem report assembly and output.

mod problem;
pub mod writer;

pub use problem::{CheckColumn, ProblemReport, ReportRow, DEFAULT_ID_WIDTH};
pub use writer::{save_report, save_table, write_report, write_table, ReportFormat};
