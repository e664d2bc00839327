use std::fmt::{self, Write};

use html_escape::encode_double_quoted_attribute;

use crate::node::{Document, NodeId, NodeKind};
use crate::parse::VOID_ELEMENTS;

impl Document {
    /// Serialise the whole document back to markup.
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        for child in self.children(self.root()) {
            // Writing into a String cannot fail.
            let _ = self.write_node(*child, &mut output);
        }
        output
    }

    /// Serialise a single node including its own tags.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut output = String::new();
        let _ = self.write_node(id, &mut output);
        output
    }

    fn write_node<W: Write>(&self, id: NodeId, out: &mut W) -> fmt::Result {
        match self.kind(id) {
            NodeKind::Root => {
                for child in self.children(id) {
                    self.write_node(*child, out)?;
                }
            }
            NodeKind::Element { name, attributes } => {
                write!(out, "<{name}")?;
                for attribute in attributes {
                    match &attribute.value {
                        Some(value) => write!(
                            out,
                            " {}=\"{}\"",
                            attribute.name,
                            encode_double_quoted_attribute(value)
                        )?,
                        None => write!(out, " {}", attribute.name)?,
                    }
                }
                out.write_char('>')?;
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return Ok(());
                }
                for child in self.children(id) {
                    self.write_node(*child, out)?;
                }
                write!(out, "</{name}>")?;
            }
            NodeKind::Text(text) => out.write_str(text)?,
            NodeKind::Comment(text) => write!(out, "<!--{text}-->")?,
            NodeKind::Doctype(text) => write!(out, "<!{text}>")?,
        }
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(self.root(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_well_formed_markup() {
        let source = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>A &amp; B</title></head>\n<body class=\"doc\"><!-- c --><h2 id=\"x\">Hi <em>there</em></h2><br><script>let a = 1 < 2;</script></body></html>\n";
        let document = Document::parse(source);
        assert_eq!(document.to_html(), source);
        assert_eq!(document.to_string(), source);
    }

    #[test]
    fn normalises_attribute_quoting() {
        let document = Document::parse("<a href='#a' data-x=1 hidden>x</a>");
        assert_eq!(
            document.to_html(),
            "<a href=\"#a\" data-x=\"1\" hidden>x</a>"
        );
    }

    #[test]
    fn created_nodes_are_escaped() {
        let mut document = Document::new();
        let root = document.root();
        let link = document.create_element("a", [("href", "#q\"")]);
        let text = document.create_text("<b> & co");
        document.append_child(root, link);
        document.append_child(link, text);
        assert_eq!(
            document.outer_html(link),
            "<a href=\"#q&quot;\">&lt;b&gt; &amp; co</a>"
        );
    }
}
