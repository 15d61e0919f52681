//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use terroir::{ReportFormat, Section};

/// Terroir: sustainability survey audit
#[derive(Parser)]
#[command(name = "terroir")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit a survey sheet and write the problems report
    Audit(AuditArgs),

    /// Write the sheet with every derived metric column
    Metrics {
        /// Path to the sheet export (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Survey section the sheet belongs to (vineyard, winery)
        #[arg(short, long)]
        section: Section,

        /// Output path (default: <file>_metrics.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (csv, tsv, json); inferred from the output path if omitted
        #[arg(short, long)]
        format: Option<ReportFormat>,
    },

    /// List the checks run for a section
    Checks {
        /// Survey section (vineyard, winery)
        #[arg(short, long)]
        section: Section,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct AuditArgs {
    /// Path to the sheet export (CSV/TSV)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Survey section the sheet belongs to (vineyard, winery)
    #[arg(short, long)]
    pub section: Section,

    /// Output path for the report (default: problems_<section>.<format> next to FILE)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format (csv, tsv, json); inferred from the output path if omitted
    #[arg(short, long)]
    pub format: Option<ReportFormat>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Absolute z-score above which a value is unusual
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Fine groups need more than this many values to be standardized
    #[arg(long)]
    pub min_population: Option<usize>,

    /// Width member identifiers are zero-padded to
    #[arg(long)]
    pub id_width: Option<usize>,

    /// Header of the member identifier column
    #[arg(long)]
    pub id_column: Option<String>,
}
