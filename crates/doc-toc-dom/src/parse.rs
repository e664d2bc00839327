use crate::node::{Document, NodeId, NodeKind};
use crate::tokenizer::{Token, Tokenizer};

/// Elements that never have content or an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose start tag closes an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "div",
    "dl",
    "fieldset",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

impl Document {
    /// Parse markup into a document tree.
    ///
    /// Parsing never fails: unmatched end tags are dropped, elements left open
    /// at the end of input are closed implicitly, and a few optional end tags
    /// (`p`, `li`, `dt`/`dd`, table cells, `option`) are inferred.
    pub fn parse(input: &str) -> Self {
        let mut document = Document::new();
        let root = document.root();
        let mut open: Vec<NodeId> = vec![root];

        for token in Tokenizer::new(input) {
            match token {
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    close_implied(&document, &mut open, &name);
                    let parent = current(&open, root);
                    let is_void = VOID_ELEMENTS.contains(&name.as_str());
                    let id = document.push(NodeKind::Element { name, attributes });
                    document.append_child(parent, id);
                    if !self_closing && !is_void {
                        open.push(id);
                    }
                }
                Token::EndTag { name } => {
                    let matching = open
                        .iter()
                        .rposition(|id| document.tag_name(*id) == Some(name.as_str()));
                    if let Some(position) = matching {
                        if position > 0 {
                            open.truncate(position);
                        }
                    }
                }
                Token::Text(text) => {
                    let id = document.push(NodeKind::Text(text.to_string()));
                    document.append_child(current(&open, root), id);
                }
                Token::Comment(text) => {
                    let id = document.push(NodeKind::Comment(text.to_string()));
                    document.append_child(current(&open, root), id);
                }
                Token::Doctype(text) => {
                    let id = document.push(NodeKind::Doctype(text.to_string()));
                    document.append_child(current(&open, root), id);
                }
            }
        }

        document
    }
}

fn current(open: &[NodeId], root: NodeId) -> NodeId {
    open.last().copied().unwrap_or(root)
}

/// Optional end tags: the elements an incoming start tag closes, and the
/// elements that stop the search for them.
type ImpliedEnd = (&'static [&'static str], &'static [&'static str]);

const LIST_ITEM: ImpliedEnd = (&["li"], &["ul", "ol", "menu"]);
const DEFINITION: ImpliedEnd = (&["dt", "dd"], &["dl"]);
const TABLE_ROW: ImpliedEnd = (&["tr", "td", "th"], &["table", "thead", "tbody", "tfoot"]);
const TABLE_CELL: ImpliedEnd = (&["td", "th"], &["tr", "table"]);
const OPTION: ImpliedEnd = (&["option"], &["select", "datalist"]);
const PARAGRAPH: ImpliedEnd = (&["p"], &["button", "table", "td", "th", "template"]);

fn close_implied(document: &Document, open: &mut Vec<NodeId>, incoming: &str) {
    let (closes, boundaries) = match incoming {
        "li" => LIST_ITEM,
        "dt" | "dd" => DEFINITION,
        "tr" => TABLE_ROW,
        "td" | "th" => TABLE_CELL,
        "option" => OPTION,
        name if CLOSES_PARAGRAPH.contains(&name) => PARAGRAPH,
        _ => return,
    };

    for index in (1..open.len()).rev() {
        let Some(tag) = document.tag_name(open[index]) else {
            continue;
        };
        if closes.contains(&tag) {
            open.truncate(index);
            return;
        }
        if boundaries.contains(&tag) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_names(document: &Document, id: NodeId) -> Vec<&str> {
        document
            .children(id)
            .iter()
            .filter_map(|child| document.tag_name(*child))
            .collect()
    }

    #[test]
    fn builds_nested_elements() {
        let document = Document::parse("<main><h2>One</h2><p>Body</p></main>");
        let main = document.children(document.root())[0];
        assert_eq!(element_names(&document, main), vec!["h2", "p"]);
    }

    #[test]
    fn void_elements_do_not_swallow_siblings() {
        let document = Document::parse("<div><br><img src=a.png><span>x</span></div>");
        let div = document.children(document.root())[0];
        assert_eq!(element_names(&document, div), vec!["br", "img", "span"]);
    }

    #[test]
    fn unmatched_end_tags_are_ignored() {
        let document = Document::parse("<div>a</span>b</div>");
        let div = document.children(document.root())[0];
        assert_eq!(document.text_content(div), "ab");
    }

    #[test]
    fn list_items_close_each_other() {
        let document = Document::parse("<ul><li>a<li>b</ul>");
        let list = document.children(document.root())[0];
        assert_eq!(element_names(&document, list), vec!["li", "li"]);
    }

    #[test]
    fn nested_lists_keep_their_items() {
        let document = Document::parse("<ul><li>a<ul><li>b</li></ul></li></ul>");
        let outer = document.children(document.root())[0];
        assert_eq!(element_names(&document, outer), vec!["li"]);
    }

    #[test]
    fn block_start_closes_paragraph() {
        let document = Document::parse("<div><p>intro<h2>Title</h2></div>");
        let div = document.children(document.root())[0];
        assert_eq!(element_names(&document, div), vec!["p", "h2"]);
    }

    #[test]
    fn unclosed_elements_end_with_input() {
        let document = Document::parse("<section><h3>Tail");
        let section = document.children(document.root())[0];
        assert_eq!(element_names(&document, section), vec!["h3"]);
        assert_eq!(document.text_content(section), "Tail");
    }
}
