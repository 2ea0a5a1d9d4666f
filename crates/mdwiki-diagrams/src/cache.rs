//! Content-addressed SVG cache for server-side rendering.
//!
//! Entries live under `{root}/{hash}.svg`, where the hash covers everything
//! that affects the output. A `VERSION` file guards against stale entries
//! written by an older build: on mismatch the whole directory is wiped.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::engine::{DiagramEngine, EngineError, Graphic};
use crate::kroki::KROKI_ENDPOINT;

/// Diagram parameters for cache key computation.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    /// Canonical diagram source.
    pub source: &'a str,
    /// Engine endpoint (e.g. `mermaid`).
    pub endpoint: &'a str,
    /// Output format.
    pub format: &'a str,
}

impl DiagramKey<'_> {
    /// SHA-256 of `"{endpoint}:{format}:{source}"`, hex-encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!("{}:{}:{}", self.endpoint, self.format, self.source);
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Directory of rendered SVGs keyed by [`DiagramKey`].
#[derive(Debug, Clone)]
pub struct SvgCache {
    root: PathBuf,
}

impl SvgCache {
    /// Open the cache at `root`, wiping it when `version` differs from the
    /// stored one. Errors are logged and never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root }
    }

    fn path_for(&self, key: &DiagramKey<'_>) -> PathBuf {
        self.root.join(format!("{}.svg", key.compute_hash()))
    }

    #[must_use]
    pub fn get(&self, key: &DiagramKey<'_>) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    /// Store an SVG. Write failures only cost a future cache miss.
    pub fn put(&self, key: &DiagramKey<'_>, svg: &str) {
        if let Err(e) = fs::create_dir_all(&self.root) {
            tracing::debug!(error = %e, "Failed to create diagram cache directory");
            return;
        }
        if let Err(e) = fs::write(self.path_for(key), svg) {
            tracing::debug!(error = %e, "Failed to write diagram cache entry");
        }
    }
}

fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => return,
        Ok(stored) => {
            tracing::info!(old = %stored, new = %version, "Diagram cache version changed, clearing");
        }
        Err(_) => {}
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!(error = %e, path = %root.display(), "Failed to clear diagram cache");
        return;
    }
    if let Err(e) = fs::create_dir_all(root).and_then(|()| fs::write(&version_file, version)) {
        tracing::warn!(error = %e, path = %root.display(), "Failed to initialize diagram cache");
    }
}

/// [`DiagramEngine`] that serves repeated sources from an [`SvgCache`].
///
/// Only successful renders are stored; failures always reach the inner
/// engine again.
pub struct CachedEngine<E> {
    inner: E,
    cache: SvgCache,
}

impl<E: DiagramEngine> CachedEngine<E> {
    pub fn new(inner: E, cache: SvgCache) -> Self {
        Self { inner, cache }
    }
}

impl<E: DiagramEngine> DiagramEngine for CachedEngine<E> {
    fn render(&self, id: &str, source: &str) -> Result<Graphic, EngineError> {
        let key = DiagramKey {
            source,
            endpoint: KROKI_ENDPOINT,
            format: "svg",
        };

        if let Some(svg) = self.cache.get(&key) {
            tracing::debug!(id, "Diagram cache hit");
            return Ok(Graphic::svg(svg));
        }

        let graphic = self.inner.render(id, source)?;
        if graphic.script.is_none() {
            self.cache.put(&key, &graphic.svg);
        }
        Ok(graphic)
    }
}
