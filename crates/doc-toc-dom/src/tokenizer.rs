use html_escape::decode_html_entities;

use crate::node::Attribute;

/// Elements whose content is character data up to the matching end tag.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text(&'a str),
    Comment(&'a str),
    Doctype(&'a str),
}

/// Forgiving markup scanner. Anything that does not look like a tag is text.
pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    raw_text: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            pos: 0,
            raw_text: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn raw_text_token(&mut self, element: String) -> Option<Token<'a>> {
        let rest = self.rest();
        let needle = format!("</{element}");
        let end = rest
            .to_ascii_lowercase()
            .find(&needle)
            .unwrap_or(rest.len());
        self.pos += end;
        if end == 0 {
            return self.next();
        }
        Some(Token::Text(&rest[..end]))
    }

    fn comment(&mut self) -> Token<'a> {
        let body_start = self.pos + 4;
        let (body, next) = match self.input[body_start..].find("-->") {
            Some(end) => (
                &self.input[body_start..body_start + end],
                body_start + end + 3,
            ),
            None => (&self.input[body_start..], self.input.len()),
        };
        self.pos = next;
        Token::Comment(body)
    }

    fn declaration(&mut self) -> Token<'a> {
        let body_start = self.pos + 2;
        let (body, next) = match self.input[body_start..].find('>') {
            Some(end) => (&self.input[body_start..body_start + end], body_start + end + 1),
            None => (&self.input[body_start..], self.input.len()),
        };
        self.pos = next;
        Token::Doctype(body)
    }

    fn text(&mut self) -> Token<'a> {
        let start = self.pos;
        let mut cursor = start + self.rest().chars().next().map_or(1, char::len_utf8);
        while let Some(offset) = self.input[cursor..].find('<') {
            let candidate = cursor + offset;
            if starts_markup(&self.input[candidate..]) {
                cursor = candidate;
                self.pos = cursor;
                return Token::Text(&self.input[start..cursor]);
            }
            cursor = candidate + 1;
        }
        self.pos = self.input.len();
        Token::Text(&self.input[start..])
    }

    fn end_tag(&mut self) -> Token<'a> {
        self.pos += 2;
        let name = self.take_name();
        self.skip_past('>');
        Token::EndTag { name }
    }

    fn start_tag(&mut self) -> Token<'a> {
        self.pos += 1;
        let name = self.take_name();
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.byte_at(0) {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.byte_at(0) == Some(b'>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    if let Some(attribute) = self.attribute() {
                        if !attributes
                            .iter()
                            .any(|existing: &Attribute| existing.name == attribute.name)
                        {
                            attributes.push(attribute);
                        }
                    }
                }
            }
        }

        if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text = Some(name.clone());
        }

        Token::StartTag {
            name,
            attributes,
            self_closing,
        }
    }

    fn attribute(&mut self) -> Option<Attribute> {
        let start = self.pos;
        while let Some(byte) = self.byte_at(0) {
            if byte.is_ascii_whitespace() || matches!(byte, b'=' | b'>' | b'/') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            // A stray `=` with no name in front of it.
            self.pos += 1;
            return None;
        }
        let name = self.input[start..self.pos].to_ascii_lowercase();

        self.skip_whitespace();
        if self.byte_at(0) != Some(b'=') {
            return Some(Attribute::bare(name));
        }
        self.pos += 1;
        self.skip_whitespace();

        let raw = match self.byte_at(0) {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let value_start = self.pos;
                let end = self.rest().find(quote as char).unwrap_or(self.rest().len());
                self.pos += end;
                let value = &self.input[value_start..self.pos];
                if self.byte_at(0).is_some() {
                    self.pos += 1;
                }
                value
            }
            _ => {
                let value_start = self.pos;
                while let Some(byte) = self.byte_at(0) {
                    if byte.is_ascii_whitespace() || byte == b'>' {
                        break;
                    }
                    self.pos += 1;
                }
                &self.input[value_start..self.pos]
            }
        };

        Some(Attribute::new(name, decode_html_entities(raw)))
    }

    fn take_name(&mut self) -> String {
        let start = self.pos;
        while let Some(byte) = self.byte_at(0) {
            if byte.is_ascii_whitespace() || matches!(byte, b'/' | b'>') {
                break;
            }
            self.pos += 1;
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.byte_at(0), Some(byte) if byte.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn skip_past(&mut self, delimiter: char) {
        match self.rest().find(delimiter) {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.input.len(),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.input.len() {
            return None;
        }

        if let Some(element) = self.raw_text.take() {
            return self.raw_text_token(element);
        }

        let rest = self.rest();
        let token = if rest.starts_with("<!--") {
            self.comment()
        } else if rest.starts_with("<!") {
            self.declaration()
        } else if rest.starts_with("</") && starts_markup(rest) {
            self.end_tag()
        } else if starts_markup(rest) {
            self.start_tag()
        } else {
            self.text()
        };
        Some(token)
    }
}

fn starts_markup(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'<') {
        return false;
    }
    match bytes.get(1) {
        Some(b'!') => true,
        Some(b'/') => bytes.get(2).is_some_and(u8::is_ascii_alphabetic),
        Some(byte) => byte.is_ascii_alphabetic(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        Tokenizer::new(input).collect()
    }

    #[test]
    fn splits_tags_and_text() {
        let tokens = tokens(r#"<h2 class="lead">A &amp; B</h2>"#);
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "h2".into(),
                    attributes: vec![Attribute::new("class", "lead")],
                    self_closing: false,
                },
                Token::Text("A &amp; B"),
                Token::EndTag { name: "h2".into() },
            ]
        );
    }

    #[test]
    fn reads_unquoted_single_quoted_and_bare_attributes() {
        let tokens = tokens("<input type=text value='a \"b\"' disabled/>");
        assert_eq!(
            tokens,
            vec![Token::StartTag {
                name: "input".into(),
                attributes: vec![
                    Attribute::new("type", "text"),
                    Attribute::new("value", "a \"b\""),
                    Attribute::bare("disabled"),
                ],
                self_closing: true,
            }]
        );
    }

    #[test]
    fn keeps_script_bodies_as_raw_text() {
        let tokens = tokens("<script>if (a < b) { x = '<h2>'; }</script>");
        assert_eq!(tokens[1], Token::Text("if (a < b) { x = '<h2>'; }"));
        assert_eq!(
            tokens[2],
            Token::EndTag {
                name: "script".into()
            }
        );
    }

    #[test]
    fn lone_angle_brackets_are_text() {
        let tokens = tokens("1 < 2 <3");
        assert_eq!(tokens, vec![Token::Text("1 < 2 <3")]);
    }

    #[test]
    fn comments_and_doctype() {
        let tokens = tokens("<!DOCTYPE html><!-- note -->");
        assert_eq!(
            tokens,
            vec![Token::Doctype("DOCTYPE html"), Token::Comment(" note ")]
        );
    }

    #[test]
    fn upper_case_names_are_lowered() {
        let tokens = tokens("<H3 ID=x></H3>");
        assert_eq!(
            tokens[0],
            Token::StartTag {
                name: "h3".into(),
                attributes: vec![Attribute::new("id", "x")],
                self_closing: false,
            }
        );
        assert_eq!(tokens[1], Token::EndTag { name: "h3".into() });
    }
}
