//! CLI error types.

use mdwiki_config::ConfigError;
use mdwiki_site::{BuildError, StorageError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Validation(String),
}
