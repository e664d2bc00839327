//! Shared utilities for doc-toc crates.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use similar::TextDiff;
use tempfile::Builder;

/// Map `func` over `items` in parallel, keeping the input order in the output.
pub fn parallel_map<T, R, F>(items: T, func: F) -> Vec<R>
where
    T: IntoParallelIterator,
    R: Send,
    F: Fn(T::Item) -> R + Send + Sync,
{
    items.into_par_iter().map(func).collect()
}

/// Atomically write the provided string to `path`, ensuring readers never observe
/// partial content. The write is performed via a temporary file in the same
/// directory followed by an atomic rename.
pub fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    fs::create_dir_all(&parent)?;

    let mut tmp = Builder::new().prefix(".doc-toc").tempfile_in(&parent)?;

    tmp.as_file_mut().write_all(contents.as_bytes())?;
    tmp.as_file_mut().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let perm = metadata.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    tmp.persist(path).map(|_| ()).map_err(|err| err.error)
}

/// Unified diff between two versions of a file, or `None` when they match.
pub fn unified_diff(original: &str, modified: &str, path: &str) -> Option<String> {
    if original == modified {
        return None;
    }

    let diff = TextDiff::from_lines(original, modified);
    let header_old = format!("a/{path}");
    let header_new = format!("b/{path}");
    let rendered = diff
        .unified_diff()
        .header(&header_old, &header_new)
        .to_string();
    Some(rendered)
}
