//! Page loading and heading discovery for the doc-toc toolkit.
//!
//! The parser bridges the document tree in `doc-toc-dom` with the settings
//! resolved by `doc-toc-config`. It decides which files are in scope, locates
//! content roots and TOC destinations, and lists the tracked headings of a page
//! together with their rank and slug.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use doc_toc_config::{Config, PatternList, TocSettings};
use doc_toc_dom::{Document, NodeId};
use globset::GlobMatcher;

mod slug;

pub use slug::{slugify, tokenize};

/// High-level parser context configured with resolved settings.
#[derive(Clone, Debug)]
pub struct ParserContext {
    config: Config,
}

impl ParserContext {
    /// Construct a new parser context from the provided configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Return a reference to the underlying configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Determine whether the given path should be processed based on the
    /// project include/exclude patterns.
    pub fn is_path_in_scope(&self, path: &Path) -> bool {
        let absolute = self.absolute_path(path);
        let relative = self.relative_path(&absolute);

        if matches_patterns(&self.config.project.exclude, &relative) {
            return false;
        }

        self.config.project.include.is_empty()
            || matches_patterns(&self.config.project.include, &relative)
    }

    /// Read and parse the page at `path`. Paths outside the configured scope
    /// return `Ok(None)`.
    pub fn document_for_path(&self, path: &Path) -> io::Result<Option<Document>> {
        if !self.is_path_in_scope(path) {
            return Ok(None);
        }
        let contents = fs::read_to_string(self.absolute_path(path))?;
        Ok(Some(Document::parse(&contents)))
    }

    /// Parse a page held in memory.
    pub fn document_from_str(&self, contents: &str) -> Document {
        Document::parse(contents)
    }

    /// Locate content roots, destinations and tracked headings of `document`.
    ///
    /// Returns `None` when the page has no content root or no destination.
    pub fn outline(&self, document: &Document) -> Option<PageOutline> {
        PageOutline::discover(document, &self.config.toc)
    }

    pub fn absolute_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.project.root.join(path)
        }
    }

    pub fn relative_path(&self, absolute: &Path) -> PathBuf {
        match absolute.strip_prefix(&self.config.project.root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            Ok(_) => PathBuf::from("."),
            Err(_) => absolute.to_path_buf(),
        }
    }
}

/// Regions of a page relevant to TOC generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageOutline {
    /// Outermost content roots, in document order.
    pub content_roots: Vec<NodeId>,
    /// Containers that receive the navigation list, in document order.
    pub destinations: Vec<NodeId>,
    pub headings: Vec<HeadingNode>,
}

impl PageOutline {
    pub fn discover(document: &Document, settings: &TocSettings) -> Option<Self> {
        let content_roots = outermost(document, settings.content.select(document, document.root()));
        if content_roots.is_empty() {
            return None;
        }
        let destinations = settings.destination.select(document, document.root());
        if destinations.is_empty() {
            return None;
        }

        Some(PageOutline {
            headings: discover_headings(document, &content_roots, settings),
            content_roots,
            destinations,
        })
    }
}

/// Heading tracked by the configured rank list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadingNode {
    pub node: NodeId,
    pub tag: String,
    /// Position of `tag` in the rank list; 0 is the major rank.
    pub rank: usize,
    /// Text content with whitespace runs collapsed to single spaces.
    pub text: String,
    pub slug: String,
    /// Zero-based position among the tracked headings of the page.
    pub order: usize,
}

/// Collect tracked headings below `roots` in document order.
///
/// Roots nested inside another root are ignored, so every heading is
/// reported once.
pub fn discover_headings(
    document: &Document,
    roots: &[NodeId],
    settings: &TocSettings,
) -> Vec<HeadingNode> {
    let roots = outermost(document, roots.to_vec());
    let mut headings = Vec::new();

    for root in roots {
        for node in document.descendants(root) {
            let Some(tag) = document.tag_name(node) else {
                continue;
            };
            let Some(rank) = settings.rank_of(tag) else {
                continue;
            };
            let text = collapse_whitespace(&document.text_content(node));
            headings.push(HeadingNode {
                node,
                tag: tag.to_string(),
                rank,
                slug: slugify(&text),
                text,
                order: headings.len(),
            });
        }
    }

    headings
}

/// Drop matches nested inside another match.
fn outermost(document: &Document, matches: Vec<NodeId>) -> Vec<NodeId> {
    matches
        .iter()
        .copied()
        .filter(|id| !matches.iter().any(|other| document.is_ancestor(*other, *id)))
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn matches_patterns(patterns: &PatternList, path: &Path) -> bool {
    patterns.iter().any(|pattern| {
        let matcher: GlobMatcher = pattern.glob().compile_matcher();
        matcher.is_match(path)
    })
}
