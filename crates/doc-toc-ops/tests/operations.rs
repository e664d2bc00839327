use std::fs;
use std::path::PathBuf;

use doc_toc_format::{OutputFormat, PageStatus};
use doc_toc_ops::{BuildOptions, OperationError, Operations, PlanOptions, ScanOptions, TocMode};
use doc_toc_test_support::{load_config, page, write_file};
use tempfile::TempDir;

fn build_options(mode: TocMode, respect_ignore: bool) -> BuildOptions {
    BuildOptions {
        scan: ScanOptions {
            paths: Vec::new(),
            respect_ignore,
        },
        mode,
        format: OutputFormat::Plain,
        quiet: false,
    }
}

fn status_of(outcome: &doc_toc_ops::BuildOutcome, path: &str) -> Option<PageStatus> {
    outcome
        .report
        .pages
        .iter()
        .find(|page| page.path == PathBuf::from(path))
        .map(|page| page.status)
}

#[test]
fn build_respects_ignore_file() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path(), ".doc-toc-ignore", "ignored.html\n");
    write_file(temp.path(), "ignored.html", &page("<h2>Ignored</h2>"));
    write_file(temp.path(), "kept.html", &page("<h2>Kept</h2>"));

    let ops = Operations::new(load_config(temp.path()));

    let outcome = ops
        .build(build_options(TocMode::Check, true))
        .expect("build with ignore");
    assert_eq!(status_of(&outcome, "kept.html"), Some(PageStatus::WouldChange));
    assert_eq!(
        status_of(&outcome, "ignored.html"),
        None,
        "ignored.html should be filtered when respect_ignore is true"
    );

    let outcome = ops
        .build(build_options(TocMode::Check, false))
        .expect("build without ignore");
    assert_eq!(
        status_of(&outcome, "ignored.html"),
        Some(PageStatus::WouldChange),
        "ignored.html should be processed when respect_ignore is false"
    );
}

#[test]
fn check_reports_without_writing() {
    let temp = TempDir::new().expect("tempdir");
    let original = page("<h2>Getting Started</h2>");
    write_file(temp.path(), "docs/index.html", &original);
    write_file(temp.path(), "docs/plain.html", "<p>No regions.</p>\n");
    write_file(temp.path(), "docs/notes.txt", "<h2>Not a page</h2>");

    let ops = Operations::new(load_config(temp.path()));
    let outcome = ops
        .build(build_options(TocMode::Check, true))
        .expect("check run");

    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.report.pages.len(), 2);
    assert_eq!(
        status_of(&outcome, "docs/index.html"),
        Some(PageStatus::WouldChange)
    );
    assert_eq!(status_of(&outcome, "docs/plain.html"), Some(PageStatus::NoToc));
    assert!(outcome.rendered.contains("docs/index.html: table of contents out of date"));
    assert_eq!(
        fs::read_to_string(temp.path().join("docs/index.html")).unwrap(),
        original
    );
}

#[test]
fn update_writes_pages_and_skip_policy_makes_rerun_clean() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path(), ".doc-toc.toml", "[build]\nreentry = \"skip\"\n");
    write_file(
        temp.path(),
        "guide.html",
        &page("<h2>Install</h2>\n<h3>From Source</h3>"),
    );

    let ops = Operations::new(load_config(temp.path()));
    let outcome = ops
        .build(build_options(TocMode::Update, true))
        .expect("update run");

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(status_of(&outcome, "guide.html"), Some(PageStatus::Updated));
    let written = fs::read_to_string(temp.path().join("guide.html")).unwrap();
    assert!(written.contains(r#"<div id="install" style="transform: translateY(-3rem)"></div>"#));
    assert!(written.contains(r##"<li class="nav-item ps-3"><a href="#from-source">From Source</a></li>"##));

    let rerun = ops
        .build(build_options(TocMode::Check, true))
        .expect("check after update");
    assert_eq!(rerun.exit_code, 0);
    assert_eq!(status_of(&rerun, "guide.html"), Some(PageStatus::Unchanged));
}

#[test]
fn repeat_policy_keeps_reporting_changes_after_update() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path(), "index.html", &page("<h2>Overview</h2>"));

    let ops = Operations::new(load_config(temp.path()));
    ops.build(build_options(TocMode::Update, true))
        .expect("update run");
    let rerun = ops
        .build(build_options(TocMode::Check, true))
        .expect("check after update");

    assert_eq!(rerun.exit_code, 1);
    assert_eq!(status_of(&rerun, "index.html"), Some(PageStatus::WouldChange));
}

#[test]
fn diff_mode_includes_unified_diff() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path(), "index.html", &page("<h2>Overview</h2>"));

    let ops = Operations::new(load_config(temp.path()));
    let outcome = ops
        .build(build_options(TocMode::Diff, true))
        .expect("diff run");

    let page_report = &outcome.report.pages[0];
    let diff = page_report.diff.as_deref().expect("diff present");
    assert!(diff.contains("--- a/index.html"));
    assert!(diff.contains(r#"+<div id="overview" style="transform: translateY(-3rem)"></div>"#));
    assert!(outcome.rendered.contains("+++ b/index.html"));
}

#[test]
fn explicit_paths_limit_the_scan() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path(), "a/one.html", &page("<h2>One</h2>"));
    write_file(temp.path(), "b/two.html", &page("<h2>Two</h2>"));

    let ops = Operations::new(load_config(temp.path()));
    let mut options = build_options(TocMode::Check, true);
    options.scan.paths = vec![PathBuf::from("b")];
    let outcome = ops.build(options).expect("scoped run");

    let paths: Vec<_> = outcome.report.pages.iter().map(|p| p.path.clone()).collect();
    assert_eq!(paths, vec![PathBuf::from("b/two.html")]);

    let mut missing = build_options(TocMode::Check, true);
    missing.scan.paths = vec![PathBuf::from("nowhere")];
    let err = ops.build(missing).err().expect("missing path rejected");
    assert!(matches!(err, OperationError::InvalidInput(_)), "{err}");
}

#[test]
fn quiet_check_without_changes_renders_nothing() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path(), "index.html", "<main data-content><p>x</p></main>\n");

    let ops = Operations::new(load_config(temp.path()));
    let mut options = build_options(TocMode::Check, true);
    options.quiet = true;
    let outcome = ops.build(options).expect("quiet run");

    assert_eq!(outcome.exit_code, 0);
    assert!(outcome.rendered.is_empty());
}

#[test]
fn plan_lists_entries_without_writing() {
    let temp = TempDir::new().expect("tempdir");
    let original = page("<h2>Install</h2>\n<h3>***</h3>\n<h3>Verify</h3>");
    write_file(temp.path(), "guide.html", &original);

    let ops = Operations::new(load_config(temp.path()));
    let outcome = ops
        .plan(PlanOptions {
            path: PathBuf::from("guide.html"),
            format: OutputFormat::Plain,
        })
        .expect("plan");

    assert!(outcome.report.regions_found);
    let hrefs: Vec<&str> = outcome
        .report
        .entries
        .iter()
        .map(|entry| entry.href.as_str())
        .collect();
    assert_eq!(hrefs, vec!["#install", "#verify"]);
    assert_eq!(outcome.report.skipped.len(), 1);
    assert!(outcome.rendered.contains("- Install (#install)"));
    assert_eq!(
        fs::read_to_string(temp.path().join("guide.html")).unwrap(),
        original
    );
}

#[test]
fn plan_of_missing_file_is_an_io_error() {
    let temp = TempDir::new().expect("tempdir");
    let ops = Operations::new(load_config(temp.path()));

    let err = ops
        .plan(PlanOptions {
            path: PathBuf::from("absent.html"),
            format: OutputFormat::Plain,
        })
        .err()
        .expect("missing file");

    assert!(matches!(err, OperationError::Io { .. }), "{err}");
}

#[test]
fn plan_rejects_pages_outside_the_project_scope() {
    let temp = TempDir::new().expect("tempdir");
    write_file(
        temp.path(),
        "node_modules/pkg/index.html",
        &page("<h2>Vendored</h2>"),
    );
    let ops = Operations::new(load_config(temp.path()));

    let err = ops
        .plan(PlanOptions {
            path: PathBuf::from("node_modules/pkg/index.html"),
            format: OutputFormat::Plain,
        })
        .err()
        .expect("excluded page");

    assert!(matches!(err, OperationError::InvalidInput(_)), "{err}");
    assert!(err.to_string().contains("outside the project scope"));
}
