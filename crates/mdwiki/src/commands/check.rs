//! `mdwiki check` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdwiki_config::{CliSettings, Config};
use mdwiki_diagrams::Severity;
use mdwiki_site::{FsStorage, check_corpus};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover mdwiki.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Also list info-level findings.
    #[arg(long)]
    all: bool,
}

impl CheckArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(config = ?config.config_path, "Configuration loaded");
        let storage = FsStorage::new(config.docs_resolved.source_dir.clone());
        let report = check_corpus(&storage)?;

        for (path, reason) in &report.unreadable {
            output.error(&format!("{}: {reason}", path.display()));
        }
        for finding in &report.findings {
            match finding.issue.severity {
                Severity::Error => output.error(&finding.to_string()),
                Severity::Warning => output.warning(&finding.to_string()),
                Severity::Info if self.all => output.detail(&finding.to_string()),
                Severity::Info => {}
            }
        }

        let errors = report.count(Severity::Error) + report.unreadable.len();
        let summary = format!(
            "Checked {} diagram(s) in {} document(s): {} error(s), {} warning(s)",
            report.diagrams,
            report.documents,
            errors,
            report.count(Severity::Warning)
        );

        if report.has_errors() {
            return Err(CliError::Validation(summary));
        }
        output.success(&summary);
        Ok(())
    }
}
