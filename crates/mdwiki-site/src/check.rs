//! Diagram checks across a document corpus.

use std::fmt;
use std::path::{Path, PathBuf};

use mdwiki_diagrams::{LintIssue, Severity, diagrams, lint};

use crate::storage::{Storage, StorageError};

/// One lint issue located in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: PathBuf,
    /// 1-based line of the diagram's opening delimiter.
    pub line: usize,
    /// Position of the diagram within its document.
    pub diagram: usize,
    pub issue: LintIssue,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} (diagram {}): {}: {}",
            self.path.display(),
            self.line,
            self.diagram,
            self.issue.severity,
            self.issue.message
        )
    }
}

/// Result of checking every document.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub documents: usize,
    pub diagrams: usize,
    pub findings: Vec<Finding>,
    /// Documents that could not be read, with the reason.
    pub unreadable: Vec<(PathBuf, String)>,
}

impl CheckReport {
    /// Whether the corpus has error-level issues or unreadable documents.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.unreadable.is_empty()
            || self
                .findings
                .iter()
                .any(|finding| finding.issue.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.issue.severity == severity)
            .count()
    }
}

/// Lint every diagram of one document.
pub fn check_document(path: &Path, raw: &str) -> Vec<Finding> {
    diagrams(raw)
        .into_iter()
        .flat_map(|block| {
            let line = raw[..block.span.start].matches('\n').count() + 1;
            lint(&block.raw_text).into_iter().map(move |issue| Finding {
                path: path.to_path_buf(),
                line,
                diagram: block.sequence_index,
                issue,
            })
        })
        .collect()
}

/// Lint every diagram in the corpus.
pub fn check_corpus(storage: &dyn Storage) -> Result<CheckReport, StorageError> {
    let mut report = CheckReport::default();

    for entry in storage.scan()? {
        let raw = match storage.read(&entry.slug) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "Cannot check document");
                report.unreadable.push((entry.path, e.to_string()));
                continue;
            }
        };

        report.documents += 1;
        report.diagrams += diagrams(&raw).len();
        report.findings.extend(check_document(&entry.path, &raw));
    }

    Ok(report)
}
