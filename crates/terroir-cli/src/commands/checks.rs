//! Checks command - list the checks run for a section.

use colored::Colorize;
use terroir::{Auditor, Section};

pub fn run(section: Section, json_output: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let auditor = Auditor::new();
    let checks = auditor.checks(section);

    if json_output {
        let entries: Vec<_> = checks
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name(),
                    "kind": c.kind(),
                    "description": c.description(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{} {} checks for the {} sheet",
        "Listing".cyan().bold(),
        checks.len().to_string().white().bold(),
        section
    );
    println!();

    for (i, check) in checks.iter().enumerate() {
        println!(
            "{:>3}. {} {}",
            i + 1,
            format!("[{}]", check.kind().label()).dimmed(),
            check.name().white()
        );
        if verbose {
            println!("     {}", check.description());
        }
    }

    if verbose {
        let outlier = auditor.config().outlier;
        println!();
        println!(
            "Outlier threshold {} (fine groups need more than {} values)",
            outlier.threshold, outlier.min_population
        );
    }

    Ok(())
}
