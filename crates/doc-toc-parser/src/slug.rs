//! Heading text → URL fragment conversion.
//!
//! Text is split into case-based ASCII word tokens, tried in this order at
//! every position:
//!
//! 1. a run of two or more capitals that is followed by a capitalised word or
//!    ends the word (`HTTP` in `HTTPRequest`, `API` in `API v2`),
//! 2. an optionally capitalised lowercase word with trailing digits
//!    (`Request`, `step2`),
//! 3. a lone capital,
//! 4. a run of digits.
//!
//! Characters that start none of these are dropped. Tokens are lowercased and
//! joined with `-`.

/// Convert heading text into a lowercase, hyphen-joined identifier.
///
/// The result depends on `text` alone. Text without any ASCII letters or
/// digits produces an empty string.
pub fn slugify(text: &str) -> String {
    tokenize(text)
        .iter()
        .map(|token| token.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Split text into the word tokens a slug is built from.
pub fn tokenize(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0usize;

    while index < chars.len() {
        let end = capital_run(&chars, index)
            .or_else(|| word(&chars, index))
            .or_else(|| chars[index].is_ascii_uppercase().then_some(index + 1))
            .or_else(|| digit_run(&chars, index));

        match end {
            Some(end) => {
                tokens.push(chars[index..end].iter().collect());
                index = end;
            }
            None => index += 1,
        }
    }

    tokens
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn run_end(chars: &[char], start: usize, predicate: impl Fn(char) -> bool) -> usize {
    chars[start..]
        .iter()
        .position(|ch| !predicate(*ch))
        .map_or(chars.len(), |offset| start + offset)
}

/// Two or more capitals, backing off until what follows is either a
/// capitalised word or a word boundary.
fn capital_run(chars: &[char], start: usize) -> Option<usize> {
    let run_end = run_end(chars, start, |ch| ch.is_ascii_uppercase());
    (start + 2..=run_end).rev().find(|end| {
        let next = chars.get(*end).copied();
        let after = chars.get(end + 1).copied();
        let capitalised_word = matches!(
            (next, after),
            (Some(n), Some(a)) if n.is_ascii_uppercase() && a.is_ascii_lowercase()
        );
        let boundary = !next.is_some_and(is_word_char);
        capitalised_word || boundary
    })
}

/// Optional capital, one or more lowercase letters, then any digits.
fn word(chars: &[char], start: usize) -> Option<usize> {
    let first = chars[start];
    let lower_start = if first.is_ascii_lowercase() {
        start
    } else if first.is_ascii_uppercase()
        && chars.get(start + 1).is_some_and(char::is_ascii_lowercase)
    {
        start + 1
    } else {
        return None;
    };
    let letters_end = run_end(chars, lower_start, |ch| ch.is_ascii_lowercase());
    Some(run_end(chars, letters_end, |ch| ch.is_ascii_digit()))
}

fn digit_run(chars: &[char], start: usize) -> Option<usize> {
    let end = run_end(chars, start, |ch| ch.is_ascii_digit());
    (end > start).then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_plain_words() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("  installing   the  CLI "), "installing-the-cli");
    }

    #[test]
    fn splits_capital_runs_before_capitalised_words() {
        assert_eq!(slugify("HTTPRequest"), "http-request");
        assert_eq!(slugify("XMLHttpRequest"), "xml-http-request");
        assert_eq!(slugify("API Reference"), "api-reference");
    }

    #[test]
    fn splits_camel_case() {
        assert_eq!(slugify("getElementById"), "get-element-by-id");
        assert_eq!(slugify("DatabaseManager"), "database-manager");
    }

    #[test]
    fn keeps_trailing_digits_on_words() {
        assert_eq!(slugify("Step2 Setup"), "step2-setup");
        assert_eq!(slugify("Version 4.0"), "version-4-0");
        assert_eq!(slugify("PHP 8"), "php-8");
    }

    #[test]
    fn capital_run_without_boundary_backs_off() {
        // `APIs`: the full run is followed by `s`, so `AP` + `Is` is taken.
        assert_eq!(slugify("APIs"), "ap-is");
        // `HTTP2`: no prefix of the run is followed by a boundary or a word.
        assert_eq!(slugify("HTTP2"), "h-t-t-p-2");
    }

    #[test]
    fn drops_punctuation_and_non_ascii() {
        assert_eq!(slugify("Events & Listeners!"), "events-listeners");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("Café"), "caf");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn is_deterministic() {
        let text = "Dependency Injection: AutoWire & DIContainer";
        assert_eq!(slugify(text), slugify(text));
        assert_eq!(slugify(text), "dependency-injection-auto-wire-di-container");
    }
}
