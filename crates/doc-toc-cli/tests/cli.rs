use std::fs;
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PAGE: &str = "<main data-content>\n<h2>Getting Started</h2>\n<h3>HTTPRequest</h3>\n</main>\n<aside data-toc></aside>\n";

fn setup_file(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    let mut file = fs::File::create(&path).expect("create file");
    file.write_all(contents.as_bytes()).expect("write file");
}

fn doc_toc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("doc-toc").expect("binary");
    cmd.current_dir(dir);
    cmd
}

#[test]
fn slug_prints_one_line_per_argument() {
    let temp = TempDir::new().expect("tempdir");

    doc_toc(temp.path())
        .args(["slug", "Getting Started", "HTTPRequest"])
        .assert()
        .success()
        .stdout("getting-started\nhttp-request\n");
}

#[test]
fn build_check_fails_when_pages_would_change() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "docs/index.html", PAGE);

    doc_toc(temp.path())
        .args(["build", "--check"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "docs/index.html: table of contents out of date (2 entries)",
        ));

    let untouched = fs::read_to_string(temp.path().join("docs/index.html")).expect("read page");
    assert_eq!(untouched, PAGE);
}

#[test]
fn build_update_rewrites_pages() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "docs/index.html", PAGE);

    doc_toc(temp.path())
        .args(["build", "--update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docs/index.html: updated (2 entries)"));

    let written = fs::read_to_string(temp.path().join("docs/index.html")).expect("read page");
    assert!(written.contains(r##"<a class="heading-link" href="#getting-started">"##));
    assert!(written.contains(r##"<li class="nav-item ps-3"><a href="#http-request">HTTPRequest</a></li>"##));
}

#[test]
fn build_json_reports_page_status() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "index.html", PAGE);

    let output = doc_toc(temp.path())
        .args(["build", "--format", "json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).expect("stdout utf8");
    assert!(stdout.contains("\"generated_at\""));
    assert!(stdout.contains("\"status\": \"would-change\""));
    assert!(stdout.contains("\"path\": \"index.html\""));
}

#[test]
fn plan_prints_entries() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "index.html", PAGE);

    doc_toc(temp.path())
        .args(["plan", "index.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("index.html: 2 entries, 1 destination(s)"))
        .stdout(predicate::str::contains("    - HTTPRequest (#http-request)"));
}

#[test]
fn verify_reports_broken_anchor() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(
        temp.path(),
        "index.html",
        r##"<main data-content><div id="intro"></div><h2>Intro</h2></main><aside data-toc><a href="#intor">Intro</a></aside>"##,
    );

    doc_toc(temp.path())
        .args(["verify"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[broken-anchor] Missing anchor '#intor'"));
}

#[test]
fn invalid_config_exits_with_config_code() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), ".doc-toc.toml", "[headings]\nranks = [\"section\"]\n");

    doc_toc(temp.path())
        .args(["build"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'section' is not a heading tag"));
}

#[test]
fn missing_plan_file_exits_with_io_code() {
    let temp = TempDir::new().expect("tempdir");

    doc_toc(temp.path())
        .args(["plan", "absent.html"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("I/O error on"));
}

#[test]
fn override_config_changes_markup() {
    let temp = TempDir::new().expect("tempdir");
    setup_file(temp.path(), "index.html", PAGE);
    setup_file(
        temp.path(),
        "site.toml",
        "[render]\nlist_class = \"toc\"\n",
    );

    doc_toc(temp.path())
        .args(["--config", "site.toml", "build", "--update", "--quiet"])
        .assert()
        .success();

    let written = fs::read_to_string(temp.path().join("index.html")).expect("read page");
    assert!(written.contains(r#"<ul class="toc">"#));
}
