//! Static site builder.
//!
//! Renders every document of a [`Storage`] in parallel and writes
//! `docs/{slug}/index.html` per page, plus `index.html` and `404.html`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mdwiki_config::{Config, RenderMode};
use mdwiki_diagrams::{CachedEngine, DiagramMode, KrokiEngine, SvgCache};
use mdwiki_renderer::page_url;
use rayon::prelude::*;

use crate::pipeline::{Page, load_page};
use crate::route::output_path;
use crate::storage::{Storage, StorageError};
use crate::template::{
    IndexEntry, NavItemData, PageData, TocData, render_index, render_not_found, render_page,
};

/// Cache version; a new release discards previously rendered diagrams.
const CACHE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error returned by the static site builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Storage(#[from] StorageError),
}

/// A document that produced no page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    pub slug: String,
    pub message: String,
}

/// Summary of a finished build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Pages written.
    pub pages: usize,
    /// Documents skipped because they could not be rendered.
    pub failures: Vec<BuildFailure>,
    /// Non-fatal rendering warnings across all pages.
    pub warnings: usize,
}

/// Site-wide build settings.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub site_title: String,
    pub mode: DiagramMode,
    pub mermaid_url: String,
}

impl BuildOptions {
    /// Derive build settings from configuration.
    ///
    /// Kroki mode renders at build time, through the SVG cache when caching
    /// is enabled.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let diagrams = &config.diagrams_resolved;
        let mode = match (diagrams.mode, diagrams.kroki_url.as_deref()) {
            (RenderMode::Kroki, Some(url)) => {
                let engine = KrokiEngine::new(url, diagrams.timeout());
                if config.docs_resolved.cache_enabled {
                    let cache = SvgCache::new(config.docs_resolved.cache_dir(), CACHE_VERSION);
                    DiagramMode::Server(Arc::new(CachedEngine::new(engine, cache)))
                } else {
                    DiagramMode::Server(Arc::new(engine))
                }
            }
            (RenderMode::Kroki, None) => {
                tracing::warn!("Kroki mode without kroki_url, rendering diagrams in the browser");
                DiagramMode::Client
            }
            (RenderMode::Client, _) => DiagramMode::Client,
        };

        Self {
            site_title: config.site.title.clone(),
            mode,
            mermaid_url: diagrams.mermaid_url.clone(),
        }
    }
}

/// Builds a static site from a storage backend.
pub struct SiteBuilder {
    storage: Arc<dyn Storage>,
    options: BuildOptions,
}

impl SiteBuilder {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, options: BuildOptions) -> Self {
        Self { storage, options }
    }

    /// Render every document and write the site to `output_dir`.
    ///
    /// A document that fails to render is logged and reported, and the
    /// build continues without it.
    pub fn build(&self, output_dir: &Path) -> Result<BuildReport, BuildError> {
        let entries = self.storage.scan()?;
        tracing::info!(documents = entries.len(), "Building site");

        let results: Vec<_> = entries
            .par_iter()
            .map(|entry| load_page(self.storage.as_ref(), &entry.slug, &self.options.mode))
            .collect();

        let mut report = BuildReport::default();
        let mut pages = Vec::with_capacity(results.len());
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(page) => pages.push(page),
                Err(e) => {
                    tracing::warn!(slug = %entry.slug, error = %e, "Skipping document");
                    report.failures.push(BuildFailure {
                        slug: entry.slug.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        pages.sort_by_cached_key(|page| page.title.to_lowercase());

        create_dir(output_dir)?;
        pages
            .par_iter()
            .try_for_each(|page| self.write_page(output_dir, page, &pages))?;

        let index: Vec<IndexEntry> = pages
            .iter()
            .map(|page| IndexEntry {
                title: page.title.clone(),
                url: page_url(&page.slug),
                excerpt: page.excerpt.clone(),
            })
            .collect();
        write_file(
            &output_dir.join("index.html"),
            &render_index(&self.options.site_title, &index),
        )?;
        write_file(
            &output_dir.join("404.html"),
            &render_not_found(&self.options.site_title),
        )?;

        report.pages = pages.len();
        report.warnings = pages.iter().map(|p| p.document.warnings.len()).sum();
        tracing::info!(
            pages = report.pages,
            failed = report.failures.len(),
            "Site built"
        );
        Ok(report)
    }

    fn write_page(
        &self,
        output_dir: &Path,
        page: &Page,
        pages: &[Page],
    ) -> Result<(), BuildError> {
        let mermaid_url = matches!(self.options.mode, DiagramMode::Client)
            .then(|| self.options.mermaid_url.clone());

        let data = PageData {
            site_title: self.options.site_title.clone(),
            title: page.title.clone(),
            html_content: page.document.html.clone(),
            toc: page
                .document
                .toc
                .iter()
                .map(|entry| TocData {
                    level: entry.level,
                    title: entry.title.clone(),
                    id: entry.id.clone(),
                })
                .collect(),
            navigation: build_navigation(pages, &page.slug),
            mermaid_url,
        };

        let path = output_dir.join(output_path(&page.slug));
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        write_file(&path, &render_page(&data))
    }
}

/// Navigation for `active_slug`: top-level documents plus one section per
/// first path segment, in page order.
pub fn build_navigation(pages: &[Page], active_slug: &str) -> Vec<NavItemData> {
    let mut items: Vec<NavItemData> = Vec::new();

    for page in pages {
        let item = NavItemData {
            title: page.title.clone(),
            path: page_url(&page.slug),
            children: Vec::new(),
            is_active: page.slug == active_slug,
        };

        let Some((section, _)) = page.slug.split_once('/') else {
            items.push(item);
            continue;
        };

        let section_title = section.replace('-', " ");
        match items
            .iter_mut()
            .find(|existing| existing.path.is_empty() && existing.title == section_title)
        {
            Some(existing) => existing.children.push(item),
            None => items.push(NavItemData {
                title: section_title,
                path: String::new(),
                children: vec![item],
                is_active: false,
            }),
        }
    }

    items
}

fn create_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    fs::write(path, contents).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}
