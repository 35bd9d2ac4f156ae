//! The final report and the renderers that consume it.
//!
//! - [`html`] — inventory HTML document, one table per scope.
//! - [`json`] — machine-readable serialization of the [`Report`].
//! - [`terminal`] — colored console summary; not a file renderer.
//!
//! [`dispatch`] runs every configured file renderer concurrently against one
//! shared, immutable report and isolates their failures.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::config::RendererConfig;
use crate::error::RenderError;
use crate::models::{Outcome, Verdict};

pub mod html;
pub mod json;
pub mod terminal;

/// Counters for everything skipped, collapsed or recovered during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub input_dependencies: usize,
    pub duplicates_collapsed: usize,
    pub filtered_out: usize,
    pub imported_records: usize,
    pub imported_records_skipped: usize,
    pub import_files_failed: usize,
    pub merged: usize,
    pub imported_only: usize,
    pub online_lookups: usize,
    pub online_lookup_failures: usize,
    pub unresolved_licenses: usize,
    pub rejected_aliases: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub project: String,
    /// RFC 3339.
    pub generated_at: String,
    pub generator: String,
    pub warnings: Vec<String>,
    pub stats: RunStats,
}

impl ReportMetadata {
    pub fn new(project: &str, generated_at: chrono::DateTime<chrono::Utc>) -> Self {
        ReportMetadata {
            project: project.to_string(),
            generated_at: generated_at.to_rfc3339(),
            generator: concat!("dep-license-report ", env!("CARGO_PKG_VERSION")).to_string(),
            warnings: Vec::new(),
            stats: RunStats::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub allowed: usize,
    pub violations: usize,
    pub unknown: usize,
}

/// Verdicts of one scope, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub scope: String,
    pub verdicts: Vec<Verdict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: Summary,
    pub sections: Vec<Section>,
}

impl Report {
    /// Group `verdicts` by scope; sections appear in order of first occurrence.
    pub fn build(metadata: ReportMetadata, verdicts: Vec<Verdict>) -> Report {
        let mut summary = Summary::default();
        let mut sections: Vec<Section> = Vec::new();

        for verdict in verdicts {
            summary.total += 1;
            match verdict.outcome {
                Outcome::Allowed => summary.allowed += 1,
                Outcome::Violation { .. } => summary.violations += 1,
                Outcome::Unknown => summary.unknown += 1,
            }

            match sections.iter_mut().find(|s| s.scope == verdict.dependency.scope) {
                Some(section) => section.verdicts.push(verdict),
                None => sections.push(Section {
                    scope: verdict.dependency.scope.clone(),
                    verdicts: vec![verdict],
                }),
            }
        }

        Report {
            metadata,
            summary,
            sections,
        }
    }

    pub fn verdicts(&self) -> impl Iterator<Item = &Verdict> {
        self.sections.iter().flat_map(|s| s.verdicts.iter())
    }
}

// ---------------------------------------------------------------------------
// Renderer dispatch
// ---------------------------------------------------------------------------

/// A pure consumer of [`Report`] writing one artifact.
pub trait Renderer: Send + Sync {
    fn name(&self) -> &str;
    fn render(&self, report: &Report) -> Result<Artifact, RenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub renderer: String,
    pub path: PathBuf,
    pub bytes: usize,
}

#[derive(Debug)]
pub struct RenderFailure {
    pub renderer: String,
    pub error: RenderError,
}

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<RenderFailure>,
}

pub fn from_config(configs: &[RendererConfig]) -> Vec<Arc<dyn Renderer>> {
    configs
        .iter()
        .map(|config| -> Arc<dyn Renderer> {
            match config {
                RendererConfig::InventoryHtml { output, title } => {
                    Arc::new(html::InventoryHtmlRenderer::new(output, title.clone()))
                }
                RendererConfig::Json { output, pretty } => Arc::new(json::JsonRenderer::new(output, *pretty)),
            }
        })
        .collect()
}

/// Run every renderer on its own blocking task against the shared report.
///
/// Results keep the renderers' order. A failing or panicking renderer is
/// recorded in [`DispatchOutcome::failures`]; the others still complete.
pub async fn dispatch(report: Arc<Report>, renderers: &[Arc<dyn Renderer>]) -> DispatchOutcome {
    let tasks = renderers.iter().map(|renderer| {
        let renderer = Arc::clone(renderer);
        let report = Arc::clone(&report);
        tokio::task::spawn_blocking(move || renderer.render(&report))
    });
    let results = join_all(tasks).await;

    let mut outcome = DispatchOutcome::default();
    for (renderer, result) in renderers.iter().zip(results) {
        let error = match result {
            Ok(Ok(artifact)) => {
                tracing::debug!(renderer = renderer.name(), path = %artifact.path.display(), "artifact written");
                outcome.artifacts.push(artifact);
                continue;
            }
            Ok(Err(err)) => err,
            Err(join_err) => RenderError::Panicked(join_err.to_string()),
        };
        tracing::warn!(renderer = renderer.name(), "renderer failed: {error}");
        outcome.failures.push(RenderFailure {
            renderer: renderer.name().to_string(),
            error,
        });
    }
    outcome
}

/// Write `contents` to `path`, creating parent directories as needed.
pub(crate) fn write_artifact(renderer: &str, path: &Path, contents: &[u8]) -> Result<Artifact, RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)?;
    Ok(Artifact {
        renderer: renderer.to_string(),
        path: path.to_path_buf(),
        bytes: contents.len(),
    })
}
