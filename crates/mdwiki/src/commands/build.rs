//! `mdwiki build` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use mdwiki_config::{CliSettings, Config};
use mdwiki_site::{BuildOptions, FsStorage, SiteBuilder, Storage};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover mdwiki.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for the generated site (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Kroki server URL; renders diagrams at build time (overrides config).
    #[arg(long, env = "MDWIKI_KROKI_URL")]
    kroki_url: Option<String>,

    /// Disable the diagram cache.
    #[arg(long)]
    no_cache: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            cache_enabled: self.no_cache.then_some(false),
            kroki_url: self.kroki_url,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(config = ?config.config_path, "Configuration loaded");

        let source_dir = config.docs_resolved.source_dir.clone();
        let output_dir = config.docs_resolved.output_dir.clone();
        output.info(&format!("Source: {}", source_dir.display()));
        output.info(&format!("Output: {}", output_dir.display()));

        let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(source_dir));
        let builder = SiteBuilder::new(storage, BuildOptions::from_config(&config));
        let report = builder.build(&output_dir)?;

        for failure in &report.failures {
            output.warning(&format!("Skipped {}: {}", failure.slug, failure.message));
        }
        if report.warnings > 0 {
            output.warning(&format!(
                "{} diagram warning(s); run with --verbose for details",
                report.warnings
            ));
        }

        output.success(&format!(
            "Built {} page(s) to {}",
            report.pages,
            output_dir.display()
        ));
        Ok(())
    }
}
