use std::path::{Path, PathBuf};

use doc_toc_parser::ParserContext;
use ignore::WalkBuilder;

use crate::OperationError;

/// Name of the per-directory ignore file honoured while walking.
pub const IGNORE_FILE_NAME: &str = ".doc-toc-ignore";

/// Which files an operation should visit.
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Files or directories to process; empty means the project root.
    pub paths: Vec<PathBuf>,
    /// Honour `.doc-toc-ignore` and git ignore files.
    pub respect_ignore: bool,
}

/// Resolve scan targets to project-relative paths of in-scope pages, sorted
/// and without duplicates.
pub(crate) fn collect_targets(
    parser: &ParserContext,
    options: &ScanOptions,
) -> Result<Vec<PathBuf>, OperationError> {
    let root = parser.config().project.root.clone();
    let requested = if options.paths.is_empty() {
        vec![root.clone()]
    } else {
        options
            .paths
            .iter()
            .map(|path| parser.absolute_path(path))
            .collect()
    };

    let mut targets = Vec::new();
    for path in requested {
        if path.is_file() {
            if parser.is_path_in_scope(&path) {
                targets.push(parser.relative_path(&path));
            }
        } else if path.is_dir() {
            walk_directory(parser, &path, options.respect_ignore, &mut targets)?;
        } else {
            return Err(OperationError::InvalidInput(format!(
                "path '{}' does not exist",
                path.display()
            )));
        }
    }

    targets.sort();
    targets.dedup();
    log::debug!("{} page(s) selected under {}", targets.len(), root.display());
    Ok(targets)
}

fn walk_directory(
    parser: &ParserContext,
    dir: &Path,
    respect_ignore: bool,
    targets: &mut Vec<PathBuf>,
) -> Result<(), OperationError> {
    let mut builder = WalkBuilder::new(dir);
    if respect_ignore {
        builder.add_custom_ignore_filename(IGNORE_FILE_NAME);
    } else {
        builder
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false);
    }

    for entry in builder.build() {
        let entry = entry.map_err(|err| OperationError::Io {
            path: dir.to_path_buf(),
            source: err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
        })?;
        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }
        let path = entry.path();
        if parser.is_path_in_scope(path) {
            targets.push(parser.relative_path(path));
        }
    }
    Ok(())
}
