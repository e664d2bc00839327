//! Report types and output formatters for doc-toc commands.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Output flavour requested by the caller.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

/// Outcome for a single page processed by `build`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageStatus {
    /// Nothing to inject, or the rebuilt page is identical.
    Unchanged,
    /// The page differs from what a build would produce (check/diff modes).
    WouldChange,
    /// The rebuilt page was written to disk.
    Updated,
    /// No content root or no destination container.
    NoToc,
}

impl PageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PageStatus::Unchanged => "unchanged",
            PageStatus::WouldChange => "would-change",
            PageStatus::Updated => "updated",
            PageStatus::NoToc => "no-toc",
        }
    }

    pub fn is_change(self) -> bool {
        matches!(self, PageStatus::WouldChange | PageStatus::Updated)
    }
}

/// Heading left out of the table of contents.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub text: String,
    pub reason: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PageReport {
    pub path: PathBuf,
    pub status: PageStatus,
    pub entries: usize,
    pub skipped: Vec<SkippedEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BuildReport {
    pub pages: Vec<PageReport>,
}

impl BuildReport {
    /// Pages that changed or would change.
    pub fn changed(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| page.status.is_change())
            .count()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlanEntry {
    pub text: String,
    pub href: String,
    pub rank: usize,
    pub class: String,
}

/// Planned table of contents for one page, without any modification applied.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlanReport {
    pub path: PathBuf,
    /// Whether both a content root and a destination were found.
    pub regions_found: bool,
    pub destinations: usize,
    pub entries: Vec<PlanEntry>,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    BrokenAnchor,
    DuplicateAnchor,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::BrokenAnchor => "broken-anchor",
            FindingKind::DuplicateAnchor => "duplicate-anchor",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct VerifyFinding {
    pub kind: FindingKind,
    pub path: PathBuf,
    pub fragment: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct VerifyReport {
    pub files_scanned: usize,
    pub findings: Vec<VerifyFinding>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a T,
}

/// Renders reports as plain text or JSON. JSON output is stamped with the
/// renderer's timestamp.
#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    generated_at: DateTime<Utc>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Renderer stamped with the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(generated_at: DateTime<Utc>) -> Self {
        Self { generated_at }
    }

    /// Render a build report. With `quiet`, pages that need no change are
    /// omitted and a run without changes renders as an empty string.
    pub fn build(
        &self,
        report: &BuildReport,
        format: OutputFormat,
        quiet: bool,
    ) -> serde_json::Result<String> {
        if format == OutputFormat::Json {
            return self.json(report);
        }

        let changed = report.changed();
        if quiet && changed == 0 {
            return Ok(String::new());
        }

        let mut out = String::new();
        for page in &report.pages {
            let path = page.path.display();
            match page.status {
                PageStatus::WouldChange => {
                    let _ = writeln!(
                        out,
                        "{path}: table of contents out of date ({} entries)",
                        page.entries
                    );
                }
                PageStatus::Updated => {
                    let _ = writeln!(out, "{path}: updated ({} entries)", page.entries);
                }
                PageStatus::Unchanged if !quiet => {
                    let _ = writeln!(out, "{path}: up to date");
                }
                PageStatus::NoToc if !quiet => {
                    let _ = writeln!(out, "{path}: no content root or toc container");
                }
                _ => continue,
            }
            write_skipped(&mut out, &page.skipped);
            if let Some(diff) = &page.diff {
                out.push_str(diff);
                if !diff.ends_with('\n') {
                    out.push('\n');
                }
            }
        }

        let _ = writeln!(
            out,
            "{changed} of {} page(s) changed",
            report.pages.len()
        );
        Ok(out)
    }

    pub fn plan(&self, report: &PlanReport, format: OutputFormat) -> serde_json::Result<String> {
        if format == OutputFormat::Json {
            return self.json(report);
        }

        let mut out = String::new();
        let path = report.path.display();
        if !report.regions_found {
            let _ = writeln!(out, "{path}: no content root or toc container");
            return Ok(out);
        }

        let _ = writeln!(
            out,
            "{path}: {} entries, {} destination(s)",
            report.entries.len(),
            report.destinations
        );
        for entry in &report.entries {
            let indent = "  ".repeat(entry.rank + 1);
            let _ = writeln!(out, "{indent}- {} ({})", entry.text, entry.href);
        }
        write_skipped(&mut out, &report.skipped);
        Ok(out)
    }

    pub fn verify(
        &self,
        report: &VerifyReport,
        format: OutputFormat,
    ) -> serde_json::Result<String> {
        if format == OutputFormat::Json {
            return self.json(report);
        }

        let mut out = String::new();
        if report.findings.is_empty() {
            let _ = writeln!(
                out,
                "No anchor problems found in {} file(s).",
                report.files_scanned
            );
            return Ok(out);
        }

        for finding in &report.findings {
            let _ = writeln!(
                out,
                "{}: [{}] {}",
                finding.path.display(),
                finding.kind.as_str(),
                finding.message
            );
        }
        let _ = writeln!(
            out,
            "{} problem(s) in {} file(s)",
            report.findings.len(),
            report.files_scanned
        );
        Ok(out)
    }

    fn json<T: Serialize>(&self, report: &T) -> serde_json::Result<String> {
        let envelope = Envelope {
            generated_at: self.generated_at,
            report,
        };
        let mut rendered = serde_json::to_string_pretty(&envelope)?;
        rendered.push('\n');
        Ok(rendered)
    }
}

fn write_skipped(out: &mut String, skipped: &[SkippedEntry]) {
    for entry in skipped {
        let _ = writeln!(out, "  skipped '{}': {}", entry.text, entry.reason);
    }
}
