use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::node::{Document, NodeId};

/// Small CSS selector subset used to locate page regions.
///
/// Supported: type (`main`), universal (`*`), id (`#content`), class
/// (`.article-content`), attribute presence (`[data-toc]`), equality
/// (`[role="main"]`) and prefix (`[href^="#"]`) tests, compounds of those (`div.doc[data-content]`) and the
/// descendant combinator (`#main-body .article-content`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    steps: Vec<Compound>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    filters: Vec<Filter>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Filter {
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
    AttributePrefix { name: String, prefix: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,
    #[error("unexpected character '{found}' at offset {offset} in selector '{selector}'")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },
    #[error("unterminated attribute filter in selector '{selector}'")]
    Unterminated { selector: String },
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }

        let steps = source
            .split_whitespace()
            .map(|step| parse_compound(source, step))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Selector {
            source: source.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the element `id` satisfies the selector.
    pub fn matches(&self, document: &Document, id: NodeId) -> bool {
        let Some((last, ancestors)) = self.steps.split_last() else {
            return false;
        };
        if !last.matches(document, id) {
            return false;
        }

        let mut remaining = ancestors.iter().rev().peekable();
        for ancestor in document.ancestors(id) {
            match remaining.peek() {
                Some(step) if step.matches(document, ancestor) => {
                    remaining.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        remaining.peek().is_none()
    }

    /// All matching elements below `scope`, in document order.
    pub fn select(&self, document: &Document, scope: NodeId) -> Vec<NodeId> {
        document
            .descendants(scope)
            .filter(|id| self.matches(document, *id))
            .collect()
    }
}

impl Compound {
    fn matches(&self, document: &Document, id: NodeId) -> bool {
        let Some(tag) = document.tag_name(id) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if expected != tag {
                return false;
            }
        }
        self.filters.iter().all(|filter| match filter {
            Filter::Id(expected) => document.attr(id, "id") == Some(expected.as_str()),
            Filter::Class(expected) => document.has_class(id, expected),
            Filter::Attribute { name, value: None } => document.has_attr(id, name),
            Filter::Attribute {
                name,
                value: Some(expected),
            } => document.attr(id, name) == Some(expected.as_str()),
            Filter::AttributePrefix { name, prefix } => document
                .attr(id, name)
                .is_some_and(|value| value.starts_with(prefix.as_str())),
        })
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Selector::parse(value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_compound(selector: &str, step: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let chars: Vec<(usize, char)> = step.char_indices().collect();
    let offset_of = |index: usize| -> usize {
        let base = step.as_ptr() as usize - selector.as_ptr() as usize;
        base + chars.get(index).map_or(step.len(), |(offset, _)| *offset)
    };
    let unexpected = |index: usize| SelectorError::Unexpected {
        selector: selector.to_string(),
        found: chars[index].1,
        offset: offset_of(index),
    };

    let take_name = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && is_name_char(chars[end].1) {
            end += 1;
        }
        (chars[start..end].iter().map(|(_, ch)| *ch).collect(), end)
    };

    let mut index = 0usize;
    if let Some((_, first)) = chars.first() {
        if *first == '*' {
            index = 1;
        } else if is_name_char(*first) {
            let (name, end) = take_name(0);
            compound.tag = Some(name.to_ascii_lowercase());
            index = end;
        }
    }

    while index < chars.len() {
        let marker = chars[index].1;
        match marker {
            '#' | '.' => {
                let (name, end) = take_name(index + 1);
                if name.is_empty() {
                    return Err(if index + 1 < chars.len() {
                        unexpected(index + 1)
                    } else {
                        unexpected(index)
                    });
                }
                compound.filters.push(if marker == '#' {
                    Filter::Id(name)
                } else {
                    Filter::Class(name)
                });
                index = end;
            }
            '[' => {
                let close = chars[index..]
                    .iter()
                    .position(|(_, ch)| *ch == ']')
                    .map(|relative| index + relative)
                    .ok_or_else(|| SelectorError::Unterminated {
                        selector: selector.to_string(),
                    })?;
                let body: String = chars[index + 1..close].iter().map(|(_, ch)| *ch).collect();
                let (raw_name, value) = match body.split_once('=') {
                    Some((name, value)) => (
                        name.trim(),
                        Some(
                            value
                                .trim()
                                .trim_matches(|ch| ch == '"' || ch == '\'')
                                .to_string(),
                        ),
                    ),
                    None => (body.trim(), None),
                };
                let (raw_name, prefix) = match raw_name.strip_suffix('^') {
                    Some(stripped) if value.is_some() => (stripped.trim_end(), true),
                    _ => (raw_name, false),
                };
                let name = raw_name.to_ascii_lowercase();
                if name.is_empty() || !name.chars().all(is_name_char) {
                    return Err(unexpected(index));
                }
                let filter = match value {
                    Some(value) if prefix => Filter::AttributePrefix {
                        name,
                        prefix: value,
                    },
                    value => Filter::Attribute { name, value },
                };
                compound.filters.push(filter);
                index = close + 1;
            }
            _ => return Err(unexpected(index)),
        }
    }

    Ok(compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_attribute_markers() {
        let document =
            Document::parse(r#"<main data-content><h2>A</h2></main><aside data-toc="1"></aside>"#);
        let content = Selector::parse("[data-content]").unwrap();
        let toc = Selector::parse("aside[data-toc='1']").unwrap();

        let found = content.select(&document, document.root());
        assert_eq!(found.len(), 1);
        assert_eq!(document.tag_name(found[0]), Some("main"));
        assert_eq!(toc.select(&document, document.root()).len(), 1);
    }

    #[test]
    fn matches_attribute_prefix() {
        let document = Document::parse(
            r##"<nav><a href="#intro">Intro</a><a href="/guide">Guide</a><a>None</a></nav>"##,
        );
        let selector = Selector::parse("nav a[href^='#']").unwrap();

        let found = selector.select(&document, document.root());
        assert_eq!(found.len(), 1);
        assert_eq!(document.text_content(found[0]), "Intro");
        assert!(matches!(
            Selector::parse("a[^=x]"),
            Err(SelectorError::Unexpected { .. })
        ));
    }

    #[test]
    fn descendant_combinator_requires_ancestor() {
        let document = Document::parse(
            r#"<div id="main-body"><div class="article-content">a</div></div><div class="article-content">b</div>"#,
        );
        let selector = Selector::parse("#main-body .article-content").unwrap();
        let found = selector.select(&document, document.root());
        assert_eq!(found.len(), 1);
        assert_eq!(document.text_content(found[0]), "a");
    }

    #[test]
    fn rejects_malformed_selectors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("[data-toc"),
            Err(SelectorError::Unterminated { .. })
        ));
        assert!(matches!(
            Selector::parse("div > p"),
            Err(SelectorError::Unexpected { found: '>', .. })
        ));
    }

    #[test]
    fn displays_source_text() {
        let selector: Selector = " .doc  h2 ".parse().unwrap();
        assert_eq!(selector.to_string(), ".doc  h2");
    }
}
