//! mdc CLI - Markdown to Confluence XHTML converter.
//!
//! Provides commands for:
//! - `convert`: Convert markdown files to XHTML
//! - `styles`: List syntax highlighting styles

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConvertArgs, StylesArgs};
use output::Output;

/// mdc - Markdown to Confluence XHTML converter.
#[derive(Parser)]
#[command(name = "mdc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert markdown files to XHTML.
    Convert(ConvertArgs),
    /// List syntax highlighting styles.
    Styles(StylesArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Convert(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    // Converted documents may go to stdout
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(),
        Commands::Styles(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
