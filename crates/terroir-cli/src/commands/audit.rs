//! Audit command - run the checks for a sheet and write the problems report.

use std::path::PathBuf;

use colored::Colorize;
use terroir::report::save_report;
use terroir::{AuditConfig, Auditor, CheckKind, ReportFormat};

use crate::cli::AuditArgs;

pub fn run(args: AuditArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let AuditArgs {
        file,
        section,
        output,
        format,
        config,
        threshold,
        min_population,
        id_width,
        id_column,
    } = args;

    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    // Config file first, flags override it
    let mut config = match config {
        Some(path) => AuditConfig::load(&path)?,
        None => AuditConfig::default(),
    };
    if let Some(t) = threshold {
        config.outlier.threshold = t;
    }
    if let Some(n) = min_population {
        config.outlier.min_population = n;
    }
    if let Some(w) = id_width {
        config.id_width = w;
    }
    if let Some(c) = id_column {
        config.parser.identifier_column = c;
    }
    config.validate()?;

    println!(
        "{} {} ({} sheet)",
        "Auditing".cyan().bold(),
        file.display().to_string().white(),
        section
    );

    let auditor = Auditor::with_config(config);
    let result = auditor.audit_file(&file, section)?;

    if verbose {
        if let Some(ref source) = result.source {
            println!();
            println!("{}", "Source:".yellow().bold());
            println!("  {:12} {}", "format", source.format);
            println!("  {:12} {}", "members", source.row_count);
            println!("  {:12} {}", "columns", source.column_count);
            println!("  {:12} {}", "hash", source.hash);
        }

        println!();
        println!("{}", "Checks:".yellow().bold());
        for column in &result.report.columns {
            let kind = match column.kind {
                CheckKind::Outlier => column.kind.label().magenta(),
                CheckKind::Pairwise => column.kind.label().blue(),
                CheckKind::Predicate => column.kind.label().cyan(),
            };
            let count = if column.flagged == 0 {
                column.flagged.to_string().dimmed()
            } else {
                column.flagged.to_string().yellow().bold()
            };
            println!("  {:>5}  {:10} {}", count, kind, column.name);
        }
        println!();
    }

    let summary = &result.summary;
    println!(
        "Flagged {} of {} members ({} flags, {:.0}%)",
        summary.flagged_members.to_string().white().bold(),
        summary.members,
        summary.total_flags.to_string().yellow(),
        summary.flagged_share() * 100.0
    );

    let format = format
        .or_else(|| output.as_deref().and_then(ReportFormat::from_path))
        .unwrap_or_default();
    let output_path = output.unwrap_or_else(|| default_output(&file, &section.report_stem(), format));

    save_report(&result.report, format, &output_path)?;

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().white()
    );

    if result.report.is_empty() {
        println!("{}", "No problems found - sheet looks clean!".green());
    }

    Ok(())
}

/// `<dir of file>/<stem>.<ext>`
pub fn default_output(file: &std::path::Path, stem: &str, format: ReportFormat) -> PathBuf {
    file.with_file_name(format!("{}.{}", stem, format.extension()))
}
