//! Table-of-contents planning and injection.
//!
//! [`plan`] reads a document and decides which anchors and navigation entries
//! to create; [`apply`] performs the tree edits. [`build`] runs both.

use std::collections::HashSet;
use std::fmt;

use doc_toc_config::{DuplicatePolicy, ReentryPolicy, RenderSettings, TocSettings};
use doc_toc_dom::{Document, NodeId};
use doc_toc_parser::PageOutline;

use crate::anchors::element_ids;

/// One link in the generated navigation list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavEntry {
    pub text: String,
    /// Identifier of the anchor the entry links to.
    pub slug: String,
    pub rank: usize,
    pub class: String,
    pub heading: NodeId,
    /// Anchor of the next heading built by an earlier run, if any. New entries
    /// are spliced into an existing list ahead of that heading's item.
    pub next_anchored: Option<String>,
}

impl NavEntry {
    pub fn href(&self) -> String {
        format!("#{}", self.slug)
    }
}

/// Empty element inserted immediately before a heading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorTarget {
    pub id: String,
    pub heading: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The heading text produced no slug tokens.
    EmptySlug,
    /// The heading already has an anchor from an earlier run.
    AlreadyAnchored,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptySlug => f.write_str("heading text yields an empty slug"),
            SkipReason::AlreadyAnchored => f.write_str("heading already anchored"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedHeading {
    pub text: String,
    pub heading: NodeId,
    pub reason: SkipReason,
}

/// Everything a build will do to a document.
///
/// Entries and anchors are in document order and pair up one to one: the
/// entry at index `i` links to the anchor at index `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TocPlan {
    pub entries: Vec<NavEntry>,
    pub anchors: Vec<AnchorTarget>,
    pub destinations: Vec<NodeId>,
    /// One slot per destination: the list left by an earlier run that new
    /// entries are merged into. Only filled under [`ReentryPolicy::Skip`].
    pub existing_lists: Vec<Option<NodeId>>,
    pub skipped: Vec<SkippedHeading>,
}

impl TocPlan {
    /// A plan without entries leaves the document untouched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decide anchors and entries for `document`.
///
/// Returns `None` when the document has no content root or no destination
/// container.
pub fn plan(document: &Document, settings: &TocSettings) -> Option<TocPlan> {
    let Some(outline) = PageOutline::discover(document, settings) else {
        log::debug!(
            "no elements match '{}' and '{}'; nothing to build",
            settings.content,
            settings.destination
        );
        return None;
    };

    let existing: HashSet<String> = element_ids(document).into_iter().collect();
    let mut used = existing.clone();
    let existing_lists = outline
        .destinations
        .iter()
        .map(|destination| match settings.reentry {
            ReentryPolicy::Skip => {
                find_list(document, *destination, &settings.render.list_class)
            }
            ReentryPolicy::Repeat => None,
        })
        .collect();
    let mut result = TocPlan {
        destinations: outline.destinations,
        existing_lists,
        ..TocPlan::default()
    };
    let mut pending: Vec<usize> = Vec::new();

    for heading in outline.headings {
        if heading.slug.is_empty() {
            log::warn!("skipping heading '{}': empty slug", heading.text);
            result.skipped.push(SkippedHeading {
                text: heading.text,
                heading: heading.node,
                reason: SkipReason::EmptySlug,
            });
            continue;
        }

        if settings.reentry == ReentryPolicy::Skip
            && (existing.contains(&heading.slug)
                || is_wrapped(document, heading.node, &settings.render.link_class))
        {
            log::debug!("heading '{}' already anchored", heading.text);
            let anchor = anchored_id(document, heading.node, &settings.render.link_class)
                .unwrap_or_else(|| heading.slug.clone());
            for index in pending.drain(..) {
                result.entries[index].next_anchored = Some(anchor.clone());
            }
            result.skipped.push(SkippedHeading {
                text: heading.text,
                heading: heading.node,
                reason: SkipReason::AlreadyAnchored,
            });
            continue;
        }

        let id = match settings.duplicates {
            DuplicatePolicy::Allow => heading.slug,
            DuplicatePolicy::Suffix => unique_id(&heading.slug, &used),
        };
        used.insert(id.clone());

        pending.push(result.entries.len());
        result.entries.push(NavEntry {
            text: heading.text,
            slug: id.clone(),
            rank: heading.rank,
            class: settings.render.item_class(heading.rank).to_string(),
            heading: heading.node,
            next_anchored: None,
        });
        result.anchors.push(AnchorTarget {
            id,
            heading: heading.node,
        });
    }

    log::debug!(
        "planned {} entries for {} destination(s), {} heading(s) skipped",
        result.entries.len(),
        result.destinations.len(),
        result.skipped.len()
    );
    Some(result)
}

/// Inject anchors, glyphs, heading links and navigation lists described by
/// `plan`. An empty plan leaves the document unmodified.
pub fn apply(document: &mut Document, plan: &TocPlan, render: &RenderSettings) {
    if plan.is_empty() {
        return;
    }

    for anchor in &plan.anchors {
        let target = document.create_element(
            "div",
            [
                ("id", anchor.id.as_str()),
                ("style", render.anchor_style.as_str()),
            ],
        );
        document.insert_before(anchor.heading, target);

        let glyph = document.create_element("span", [("class", render.glyph_class.as_str())]);
        document.append_child(anchor.heading, glyph);

        let href = format!("#{}", anchor.id);
        let link = document.create_element(
            "a",
            [("class", render.link_class.as_str()), ("href", href.as_str())],
        );
        document.wrap(anchor.heading, link);
    }

    for (index, destination) in plan.destinations.iter().enumerate() {
        match plan.existing_lists.get(index).copied().flatten() {
            Some(list) => merge_into_list(document, list, plan),
            None => {
                let list = render_list(document, plan, render);
                document.append_child(*destination, list);
            }
        }
    }
}

/// Plan and apply in one step.
pub fn build(document: &mut Document, settings: &TocSettings) -> Option<TocPlan> {
    let plan = plan(document, settings)?;
    apply(document, &plan, &settings.render);
    Some(plan)
}

fn render_list(document: &mut Document, plan: &TocPlan, render: &RenderSettings) -> NodeId {
    let list = document.create_element("ul", [("class", render.list_class.as_str())]);
    for entry in &plan.entries {
        let item = render_item(document, entry);
        document.append_child(list, item);
    }
    list
}

fn render_item(document: &mut Document, entry: &NavEntry) -> NodeId {
    let item = document.create_element("li", [("class", entry.class.as_str())]);
    let href = entry.href();
    let link = document.create_element("a", [("href", href.as_str())]);
    let text = document.create_text(&entry.text);
    document.append_child(link, text);
    document.append_child(item, link);
    item
}

/// Insert each new entry ahead of the item linking to its next anchored
/// heading; entries after the last anchored heading go to the end.
fn merge_into_list(document: &mut Document, list: NodeId, plan: &TocPlan) {
    for entry in &plan.entries {
        let reference = entry
            .next_anchored
            .as_deref()
            .and_then(|anchor| item_linking_to(document, list, anchor));
        let item = render_item(document, entry);
        match reference {
            Some(reference) => document.insert_before(reference, item),
            None => document.append_child(list, item),
        }
    }
}

fn item_linking_to(document: &Document, list: NodeId, anchor: &str) -> Option<NodeId> {
    let href = format!("#{anchor}");
    document.children(list).iter().copied().find(|item| {
        document.tag_name(*item) == Some("li")
            && document.descendants(*item).any(|node| {
                document.tag_name(node) == Some("a")
                    && document.attr(node, "href") == Some(href.as_str())
            })
    })
}

/// First `ul` inside `destination` carrying every configured list class.
fn find_list(document: &Document, destination: NodeId, list_class: &str) -> Option<NodeId> {
    document.descendants(destination).find(|node| {
        document.tag_name(*node) == Some("ul")
            && list_class
                .split_whitespace()
                .all(|class| document.has_class(*node, class))
    })
}

/// Target of the heading link wrapping `heading`, without the leading `#`.
fn anchored_id(document: &Document, heading: NodeId, link_class: &str) -> Option<String> {
    if !is_wrapped(document, heading, link_class) {
        return None;
    }
    let link = document.parent(heading)?;
    document
        .attr(link, "href")
        .and_then(|href| href.strip_prefix('#'))
        .filter(|anchor| !anchor.is_empty())
        .map(str::to_string)
}

fn unique_id(slug: &str, used: &HashSet<String>) -> String {
    if !used.contains(slug) {
        return slug.to_string();
    }
    (1..)
        .map(|n| format!("{slug}-{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| slug.to_string())
}

/// Whether the heading sits directly inside a heading link from an earlier run.
fn is_wrapped(document: &Document, heading: NodeId, link_class: &str) -> bool {
    let Some(parent) = document.parent(heading) else {
        return false;
    };
    document.tag_name(parent) == Some("a")
        && link_class
            .split_whitespace()
            .all(|class| document.has_class(parent, class))
}
