//! High-level operations shared by doc-toc commands.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use doc_toc_config::{Config, ConfigError};
use doc_toc_dom::Document;
use doc_toc_format::{
    BuildReport, OutputFormat, PageReport, PageStatus, PlanEntry, PlanReport, Renderer,
    SkippedEntry, VerifyFinding, VerifyReport,
};
use doc_toc_parser::ParserContext;
use doc_toc_utils::{atomic_write, parallel_map, unified_diff};
use thiserror::Error;

mod anchors;
mod scan;
pub mod toc;

pub use anchors::{element_ids, normalize_anchor_fragment};
pub use scan::{ScanOptions, IGNORE_FILE_NAME};
pub use toc::{AnchorTarget, NavEntry, SkipReason, SkippedHeading, TocPlan};

/// Errors surfaced by operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

/// How `build` treats pages whose output differs from the file on disk.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TocMode {
    /// Report pages that would change.
    #[default]
    Check,
    /// Write rebuilt pages in place.
    Update,
    /// Report pages that would change along with a unified diff.
    Diff,
}

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub scan: ScanOptions,
    pub mode: TocMode,
    pub format: OutputFormat,
    pub quiet: bool,
}

#[derive(Clone, Debug)]
pub struct BuildOutcome {
    pub report: BuildReport,
    pub rendered: String,
    pub exit_code: i32,
}

#[derive(Clone, Debug)]
pub struct PlanOptions {
    pub path: PathBuf,
    pub format: OutputFormat,
}

#[derive(Clone, Debug)]
pub struct PlanOutcome {
    pub report: PlanReport,
    pub rendered: String,
    pub exit_code: i32,
}

#[derive(Clone, Debug, Default)]
pub struct VerifyOptions {
    pub scan: ScanOptions,
    pub format: OutputFormat,
}

#[derive(Clone, Debug)]
pub struct VerifyOutcome {
    pub report: VerifyReport,
    pub rendered: String,
    pub exit_code: i32,
}

/// Operation bundle wired from resolved configuration.
pub struct Operations {
    config: Config,
    parser: ParserContext,
}

impl Operations {
    pub fn new(config: Config) -> Self {
        let parser = ParserContext::new(config.clone());
        Self { config, parser }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the table of contents of every in-scope page.
    pub fn build(&self, options: BuildOptions) -> Result<BuildOutcome, OperationError> {
        let targets = scan::collect_targets(&self.parser, &options.scan)?;
        let mode = options.mode;
        let pages = parallel_map(targets, |relative| self.build_page(&relative, mode))
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let report = BuildReport { pages };
        let exit_code = match mode {
            TocMode::Update => 0,
            TocMode::Check | TocMode::Diff if report.changed() > 0 => 1,
            TocMode::Check | TocMode::Diff => 0,
        };
        let rendered = Renderer::new().build(&report, options.format, options.quiet)?;

        Ok(BuildOutcome {
            report,
            rendered,
            exit_code,
        })
    }

    /// Plan the table of contents of a single page without writing anything.
    pub fn plan(&self, options: PlanOptions) -> Result<PlanOutcome, OperationError> {
        let document = self.read_document(&options.path)?;
        let relative = self
            .parser
            .relative_path(&self.parser.absolute_path(&options.path));

        let report = match toc::plan(&document, &self.config.toc) {
            Some(plan) => PlanReport {
                path: relative,
                regions_found: true,
                destinations: plan.destinations.len(),
                entries: plan
                    .entries
                    .iter()
                    .map(|entry| PlanEntry {
                        text: entry.text.clone(),
                        href: entry.href(),
                        rank: entry.rank,
                        class: entry.class.clone(),
                    })
                    .collect(),
                skipped: skipped_entries(&plan),
            },
            None => PlanReport {
                path: relative,
                regions_found: false,
                destinations: 0,
                entries: Vec::new(),
                skipped: Vec::new(),
            },
        };
        let rendered = Renderer::new().plan(&report, options.format)?;

        Ok(PlanOutcome {
            report,
            rendered,
            exit_code: 0,
        })
    }

    /// Check navigation links and element ids of already built pages.
    pub fn verify(&self, options: VerifyOptions) -> Result<VerifyOutcome, OperationError> {
        let targets = scan::collect_targets(&self.parser, &options.scan)?;
        let files_scanned = targets.len();
        let per_file = parallel_map(targets, |relative| self.verify_page(&relative))
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let report = VerifyReport {
            files_scanned,
            findings: per_file.into_iter().flatten().collect(),
        };
        let exit_code = if report.findings.is_empty() { 0 } else { 1 };
        let rendered = Renderer::new().verify(&report, options.format)?;

        Ok(VerifyOutcome {
            report,
            rendered,
            exit_code,
        })
    }

    fn build_page(&self, relative: &Path, mode: TocMode) -> Result<PageReport, OperationError> {
        let absolute = self.parser.absolute_path(relative);
        let original = fs::read_to_string(&absolute).map_err(|source| OperationError::Io {
            path: absolute.clone(),
            source,
        })?;
        let mut document = self.parser.document_from_str(&original);

        let Some(plan) = toc::build(&mut document, &self.config.toc) else {
            return Ok(page_report(relative, PageStatus::NoToc, None, None));
        };
        if plan.is_empty() {
            return Ok(page_report(relative, PageStatus::Unchanged, Some(&plan), None));
        }

        let rebuilt = document.to_html();
        if rebuilt == original {
            return Ok(page_report(relative, PageStatus::Unchanged, Some(&plan), None));
        }

        match mode {
            TocMode::Check => Ok(page_report(
                relative,
                PageStatus::WouldChange,
                Some(&plan),
                None,
            )),
            TocMode::Diff => {
                let diff = unified_diff(&original, &rebuilt, &relative.to_string_lossy());
                Ok(page_report(
                    relative,
                    PageStatus::WouldChange,
                    Some(&plan),
                    diff,
                ))
            }
            TocMode::Update => {
                atomic_write(&absolute, &rebuilt).map_err(|source| OperationError::Io {
                    path: absolute.clone(),
                    source,
                })?;
                log::info!(
                    "wrote {} ({} entries)",
                    relative.display(),
                    plan.entries.len()
                );
                Ok(page_report(relative, PageStatus::Updated, Some(&plan), None))
            }
        }
    }

    fn verify_page(&self, relative: &Path) -> Result<Vec<VerifyFinding>, OperationError> {
        let document = self.read_document(relative)?;
        Ok(anchors::verify_document(
            &document,
            &self.config.toc,
            relative,
        ))
    }

    fn read_document(&self, path: &Path) -> Result<Document, OperationError> {
        self.parser
            .document_for_path(path)
            .map_err(|source| OperationError::Io {
                path: self.parser.absolute_path(path),
                source,
            })?
            .ok_or_else(|| {
                OperationError::InvalidInput(format!(
                    "path '{}' is outside the project scope",
                    path.display()
                ))
            })
    }
}

fn page_report(
    relative: &Path,
    status: PageStatus,
    plan: Option<&TocPlan>,
    diff: Option<String>,
) -> PageReport {
    PageReport {
        path: relative.to_path_buf(),
        status,
        entries: plan.map_or(0, |plan| plan.entries.len()),
        skipped: plan.map(skipped_entries).unwrap_or_default(),
        diff,
    }
}

fn skipped_entries(plan: &TocPlan) -> Vec<SkippedEntry> {
    plan.skipped
        .iter()
        .map(|skipped| SkippedEntry {
            text: skipped.text.clone(),
            reason: skipped.reason.to_string(),
        })
        .collect()
}
