use doc_toc_dom::{Document, NodeKind, Selector};
use pretty_assertions::assert_eq;

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<body>
  <nav class="navbar"><a href="/">Home</a></nav>
  <div class="row">
    <article data-content>
      <h2>Getting Started</h2>
      <p>Install the package &mdash; then run it.</p>
      <h3>Requirements</h3>
      <pre><code>composer require acme/site</code></pre>
    </article>
    <aside data-toc></aside>
  </div>
</body>
</html>
"#;

#[test]
fn should_round_trip_rendered_page() {
    // Given
    let document = Document::parse(PAGE);

    // When
    let html = document.to_html();

    // Then
    assert_eq!(html, PAGE);
}

#[test]
fn should_find_headings_in_document_order() {
    // Given
    let document = Document::parse(PAGE);
    let content = Selector::parse("[data-content]").unwrap();

    // When
    let root = content.select(&document, document.root())[0];
    let headings: Vec<String> = document
        .descendants(root)
        .filter(|id| matches!(document.tag_name(*id), Some("h2" | "h3")))
        .map(|id| document.text_content(id))
        .collect();

    // Then
    assert_eq!(headings, vec!["Getting Started", "Requirements"]);
}

#[test]
fn should_append_generated_markup_to_destination() {
    // Given
    let mut document = Document::parse(PAGE);
    let toc = Selector::parse("[data-toc]").unwrap();
    let aside = toc.select(&document, document.root())[0];

    // When
    let list = document.create_element("ul", [("class", "nav")]);
    let item = document.create_element("li", []);
    let text = document.create_text("Q&A");
    document.append_child(item, text);
    document.append_child(list, item);
    document.append_child(aside, list);

    // Then
    assert_eq!(
        document.outer_html(aside),
        r#"<aside data-toc><ul class="nav"><li>Q&amp;A</li></ul></aside>"#
    );
    assert!(matches!(document.kind(text), NodeKind::Text(raw) if raw == "Q&amp;A"));
}

#[test]
fn should_decode_entities_in_text_content() {
    // Given
    let document = Document::parse("<p>Fish &amp; Chips &mdash; &#169;</p>");

    // When
    let paragraph = document.children(document.root())[0];

    // Then
    assert_eq!(document.text_content(paragraph), "Fish & Chips \u{2014} \u{a9}");
}
