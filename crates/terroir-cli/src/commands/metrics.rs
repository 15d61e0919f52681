//! Metrics command - export the sheet with derived metrics.

use std::path::PathBuf;

use colored::Colorize;
use terroir::report::save_table;
use terroir::{Auditor, ReportFormat, Section};

use super::audit::default_output;

pub fn run(
    file: PathBuf,
    section: Section,
    output: Option<PathBuf>,
    format: Option<ReportFormat>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    println!(
        "{} {} ({} sheet)",
        "Deriving metrics for".cyan().bold(),
        file.display().to_string().white(),
        section
    );

    let (table, source) = Auditor::new().metrics_file(&file, section)?;
    let added = (table.column_count() + 1).saturating_sub(source.column_count);

    println!(
        "Added {} derived columns for {} members",
        added.to_string().white().bold(),
        table.len()
    );

    if verbose {
        println!();
        println!("{}", "Derived columns:".yellow().bold());
        for name in table.column_names().skip(source.column_count - 1) {
            println!("  {}", name);
        }
    }

    let format = format
        .or_else(|| output.as_deref().and_then(ReportFormat::from_path))
        .unwrap_or_default();
    let output_path = output.unwrap_or_else(|| {
        let stem = file.file_stem().unwrap_or_default().to_string_lossy();
        default_output(&file, &format!("{}_metrics", stem), format)
    });

    save_table(&table, format, &output_path)?;

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().white()
    );

    Ok(())
}
