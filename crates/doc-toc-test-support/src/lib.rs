//! Shared test harness utilities for doc-toc crates.

use std::fs;
use std::path::Path;

use doc_toc_config::{Config, LoadOptions};

/// Returns a baseline configuration for tests.
pub fn test_config() -> Config {
    Config::from_toml_str("", ".").unwrap_or_else(|err| panic!("built-in defaults: {err}"))
}

/// Defaults with `contents` layered on top, as if read from a config file.
pub fn config_with(contents: &str) -> Config {
    Config::from_toml_str(contents, ".").unwrap_or_else(|err| panic!("test config: {err}"))
}

/// Load configuration for a temporary workspace the way the CLI does.
pub fn load_config(dir: &Path) -> Config {
    let working_dir = fs::canonicalize(dir).expect("canonicalize working dir");
    Config::load(LoadOptions::default().with_working_dir(working_dir)).expect("load config")
}

/// Write `contents` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(path, contents).expect("write file");
}

/// Minimal rendered documentation page with a content region holding `body`
/// and an empty TOC container.
pub fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<body>\n<main data-content>\n{body}\n</main>\n<aside data-toc></aside>\n</body>\n</html>\n"
    )
}
