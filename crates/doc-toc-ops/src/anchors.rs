use std::collections::{HashMap, HashSet};
use std::path::Path;

use doc_toc_config::TocSettings;
use doc_toc_dom::Document;
use doc_toc_format::{FindingKind, VerifyFinding};
use percent_encoding::percent_decode_str;
use strsim::normalized_levenshtein;

/// Normalise anchor fragments by decoding percent-encoding and trimming.
pub fn normalize_anchor_fragment(fragment: &str) -> String {
    percent_decode_str(fragment)
        .decode_utf8_lossy()
        .trim()
        .to_string()
}

/// Every non-empty `id` attribute in document order, duplicates included.
pub fn element_ids(document: &Document) -> Vec<String> {
    document
        .descendants(document.root())
        .filter_map(|id| document.attr(id, "id"))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check the navigation links and element ids of a built page.
pub(crate) fn verify_document(
    document: &Document,
    settings: &TocSettings,
    path: &Path,
) -> Vec<VerifyFinding> {
    let ids = element_ids(document);
    let known: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let mut findings = Vec::new();

    let mut seen_links = HashSet::new();
    for destination in settings.destination.select(document, document.root()) {
        for node in document.descendants(destination) {
            if document.tag_name(node) != Some("a") {
                continue;
            }
            let Some(fragment) = document
                .attr(node, "href")
                .and_then(|href| href.strip_prefix('#'))
            else {
                continue;
            };
            let fragment = normalize_anchor_fragment(fragment);
            if fragment.is_empty() || known.contains(fragment.as_str()) {
                continue;
            }
            if !seen_links.insert(fragment.clone()) {
                continue;
            }
            findings.push(anchor_missing_finding(path, &fragment, &ids));
        }
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in &ids {
        *counts.entry(id.as_str()).or_default() += 1;
    }
    let mut reported = HashSet::new();
    for id in &ids {
        let count = counts[id.as_str()];
        if count > 1 && reported.insert(id.as_str()) {
            findings.push(VerifyFinding {
                kind: FindingKind::DuplicateAnchor,
                path: path.to_path_buf(),
                fragment: id.clone(),
                message: format!("Duplicate anchor '{id}' (defined {count} times)"),
            });
        }
    }

    findings
}

fn anchor_missing_finding(path: &Path, fragment: &str, ids: &[String]) -> VerifyFinding {
    let suggestion = ids
        .iter()
        .map(|candidate| {
            (
                candidate.as_str(),
                normalized_levenshtein(fragment, candidate.as_str()),
            )
        })
        .filter(|(_, score)| *score > 0.6)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(id, _)| id.to_string());

    let mut message = format!("Missing anchor '#{fragment}' referenced by the table of contents");
    if let Some(suggestion) = suggestion {
        message.push_str(&format!(". Did you mean '#{suggestion}'?"));
    }

    VerifyFinding {
        kind: FindingKind::BrokenAnchor,
        path: path.to_path_buf(),
        fragment: fragment.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_encoded_fragments() {
        assert_eq!(normalize_anchor_fragment("caf%C3%A9 "), "café");
        assert_eq!(normalize_anchor_fragment("getting-started"), "getting-started");
    }

    #[test]
    fn collects_ids_in_document_order() {
        let document =
            Document::parse(r#"<div id="b"></div><p id="">x</p><section><h2 id="a">A</h2></section>"#);
        assert_eq!(element_ids(&document), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn suggests_close_identifiers() {
        let finding = anchor_missing_finding(
            Path::new("index.html"),
            "getting-startd",
            &["getting-started".to_string(), "usage".to_string()],
        );
        assert!(
            finding.message.ends_with("Did you mean '#getting-started'?"),
            "{}",
            finding.message
        );
    }
}
