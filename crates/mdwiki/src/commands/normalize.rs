//! `mdwiki normalize` command implementation.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use console::Term;
use mdwiki_diagrams::{normalize, recover};

use crate::error::CliError;

/// Arguments for the normalize command.
#[derive(Args)]
pub(crate) struct NormalizeArgs {
    /// Diagram file (default: read stdin).
    file: Option<PathBuf>,

    /// Apply the recovery rewrites instead.
    #[arg(long)]
    recover: bool,
}

impl NormalizeArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let raw = read_source(self.file.as_deref())?;
        let text = rewrite(&raw, self.recover);
        Term::stdout().write_line(&text)?;
        Ok(())
    }
}

fn read_source(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            CliError::Validation(format!("Cannot read {}: {e}", path.display()))
        }),
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}

fn rewrite(raw: &str, recovery: bool) -> String {
    if recovery { recover(raw) } else { normalize(raw) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_read_source_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("diagram.mmd");
        std::fs::write(&path, "A -> B").unwrap();

        assert_eq!(read_source(Some(&path)).unwrap(), "A -> B");
    }

    #[test]
    fn test_read_source_missing_file() {
        let err = read_source(Some(Path::new("/nonexistent/diagram.mmd"))).unwrap_err();
        assert!(err.to_string().starts_with("Cannot read /nonexistent/diagram.mmd"));
    }

    #[test]
    fn test_rewrite_modes() {
        let raw = "graph TD A[Start] --> B[End]";
        assert_eq!(rewrite(raw, true), "graph TD\nA[Start]\nA --> B[End]");
        assert_eq!(rewrite("A -> B", false), "flowchart TD\nA --> B");
    }
}
