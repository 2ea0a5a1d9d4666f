//! mdwiki CLI - Markdown documentation sites with resilient Mermaid diagrams.
//!
//! Provides commands for:
//! - `build`: Render the Markdown tree into a static site
//! - `check`: Report diagrams likely to fail rendering
//! - `normalize`: Print the normalized (or recovered) form of one diagram

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CheckArgs, NormalizeArgs};
use output::Output;

/// mdwiki - Markdown documentation site generator.
#[derive(Parser)]
#[command(name = "mdwiki", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the static site.
    Build(BuildArgs),
    /// Lint every diagram in the documentation tree.
    Check(CheckArgs),
    /// Normalize a single diagram read from a file or stdin.
    Normalize(NormalizeArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Check(args) => args.execute(),
        Commands::Normalize(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_normalize_recover() {
        let cli = Cli::try_parse_from(["mdwiki", "normalize", "--recover", "diagram.mmd"]).unwrap();
        assert!(matches!(cli.command, Commands::Normalize(_)));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_global_verbose() {
        let cli = Cli::try_parse_from(["mdwiki", "build", "--no-cache", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
