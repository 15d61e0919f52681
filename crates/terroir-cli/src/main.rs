//! Terroir CLI - sustainability survey audit.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Audit(args) => commands::audit::run(args, cli.verbose),

        Commands::Metrics {
            file,
            section,
            output,
            format,
        } => commands::metrics::run(file, section, output, format, cli.verbose),

        Commands::Checks { section, json } => commands::checks::run(section, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
