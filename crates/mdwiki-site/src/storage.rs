//! Document discovery and retrieval.
//!
//! All slug parameters are URL slugs, not file paths:
//! - `"guide"` maps to `guide.md`, or `guide/index.md` when that is missing
//! - `"core/agi-loop"` maps to `core/agi-loop.md`
//!
//! Implementations handle the mapping from slugs to their own layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A discovered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    /// `/`-separated path relative to the source root, without `.md`.
    pub slug: String,
    /// Source path relative to the source root, for diagnostics.
    pub path: PathBuf,
}

/// Error returned by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .0.display())]
    InvalidUtf8(PathBuf),
}

/// Source of Markdown documents.
pub trait Storage: Send + Sync {
    /// List every document, ordered by slug.
    fn scan(&self) -> Result<Vec<DocumentEntry>, StorageError>;

    /// Read the document addressed by `slug`.
    fn read(&self, slug: &str) -> Result<String, StorageError>;
}

/// Markdown tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStorage {
    source_dir: PathBuf,
}

impl FsStorage {
    #[must_use]
    pub fn new(source_dir: PathBuf) -> Self {
        Self { source_dir }
    }

    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    fn scan_directory(
        &self,
        dir: &Path,
        prefix: &str,
        entries: &mut Vec<DocumentEntry>,
    ) -> Result<(), StorageError> {
        let read_dir = fs::read_dir(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in read_dir.filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let path = entry.path();
            let relative = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };

            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                self.scan_directory(&path, &relative, entries)?;
            } else if let Some(slug) = relative.strip_suffix(".md") {
                if name == "README.md" {
                    continue;
                }
                entries.push(DocumentEntry {
                    slug: slug.to_owned(),
                    path: PathBuf::from(&relative),
                });
            }
        }
        Ok(())
    }

    fn candidates(&self, slug: &str) -> [PathBuf; 2] {
        let base = self.source_dir.join(slug);
        // Appending keeps dots already in the last segment.
        let mut file = base.clone().into_os_string();
        file.push(".md");
        [PathBuf::from(file), base.join("index.md")]
    }
}

impl Storage for FsStorage {
    fn scan(&self) -> Result<Vec<DocumentEntry>, StorageError> {
        let mut entries = Vec::new();
        if self.source_dir.exists() {
            self.scan_directory(&self.source_dir, "", &mut entries)?;
        }
        entries.sort_by(|a, b| a.slug.cmp(&b.slug));
        tracing::debug!(count = entries.len(), dir = %self.source_dir.display(), "Scanned documents");
        Ok(entries)
    }

    fn read(&self, slug: &str) -> Result<String, StorageError> {
        if slug.split('/').any(|segment| segment == ".." || segment.is_empty()) {
            return Err(StorageError::NotFound(slug.to_owned()));
        }

        let Some(path) = self.candidates(slug).into_iter().find(|p| p.is_file()) else {
            return Err(StorageError::NotFound(slug.to_owned()));
        };

        let bytes = fs::read(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|_| StorageError::InvalidUtf8(path))
    }
}

/// In-memory storage for tests.
#[derive(Debug, Default)]
pub struct MockStorage {
    /// `None` marks a document that fails to decode.
    documents: BTreeMap<String, Option<String>>,
}

impl MockStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document under `slug`.
    #[must_use]
    pub fn with_document(mut self, slug: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.insert(slug.into(), Some(content.into()));
        self
    }

    /// Add a document that is listed but cannot be decoded.
    #[must_use]
    pub fn with_invalid_document(mut self, slug: impl Into<String>) -> Self {
        self.documents.insert(slug.into(), None);
        self
    }
}

impl Storage for MockStorage {
    fn scan(&self) -> Result<Vec<DocumentEntry>, StorageError> {
        Ok(self
            .documents
            .keys()
            .map(|slug| DocumentEntry {
                slug: slug.clone(),
                path: PathBuf::from(format!("{slug}.md")),
            })
            .collect())
    }

    fn read(&self, slug: &str) -> Result<String, StorageError> {
        match self.documents.get(slug) {
            Some(Some(content)) => Ok(content.clone()),
            Some(None) => Err(StorageError::InvalidUtf8(PathBuf::from(format!("{slug}.md")))),
            None => Err(StorageError::NotFound(slug.to_owned())),
        }
    }
}
