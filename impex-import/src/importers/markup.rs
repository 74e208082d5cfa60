//! Minimal tag scanner for HTML bookmark files and OPML
//!
//! Not a general HTML/XML parser: it splits input into tags and text runs and
//! reads quoted attributes, which is all the bookmark and feed list formats
//! need.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Tag name lowercased (closing tags keep their leading `/`)
    Tag {
        name: String,
        attrs: &'a str,
        self_closing: bool,
    },
    Text(&'a str),
}

pub(crate) fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        let text = &rest[..open];
        if !text.trim().is_empty() {
            tokens.push(Token::Text(text));
        }

        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            rest = "";
            break;
        };
        let inner = &after[..close];
        rest = &after[close + 1..];

        // Comments, doctype, processing instructions
        if inner.starts_with('!') || inner.starts_with('?') {
            continue;
        }

        let self_closing = inner.trim_end().ends_with('/');
        let inner = inner.trim_end().trim_end_matches('/');
        let name_end = inner
            .find(|c: char| c.is_whitespace())
            .unwrap_or(inner.len());
        tokens.push(Token::Tag {
            name: inner[..name_end].to_ascii_lowercase(),
            attrs: &inner[name_end..],
            self_closing,
        });
    }

    if !rest.trim().is_empty() {
        tokens.push(Token::Text(rest));
    }
    tokens
}

/// Value of a quoted (or bare) attribute, entity-decoded
pub(crate) fn attribute(attrs: &str, name: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let needle = name.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(found) = lower[search_from..].find(&needle) {
        let start = search_from + found;
        search_from = start + needle.len();

        let preceded_ok = start == 0
            || lower[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        let after = lower[search_from..].trim_start();
        if !preceded_ok || !after.starts_with('=') {
            continue;
        }

        let value_start = attrs.len() - after.len() + 1;
        let value = attrs[value_start..].trim_start();
        let raw = match value.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &value[1..];
                &body[..body.find(quote).unwrap_or(body.len())]
            }
            _ => {
                let end = value
                    .find(|c: char| c.is_whitespace())
                    .unwrap_or(value.len());
                &value[..end]
            }
        };
        return Some(decode_entities(raw));
    }
    None
}

pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_tags_and_text() {
        let tokens = tokenize("<!DOCTYPE x><DT><A HREF=\"u\">Title</A><hr/>");
        assert_eq!(tokens.len(), 5);
        assert_eq!(
            tokens[1],
            Token::Tag {
                name: "a".to_string(),
                attrs: " HREF=\"u\"",
                self_closing: false
            }
        );
        assert_eq!(tokens[2], Token::Text("Title"));
        assert!(matches!(&tokens[4], Token::Tag { name, self_closing: true, .. } if name == "hr"));
    }

    #[test]
    fn reads_attributes() {
        let attrs = r#" text="A &amp; B" xmlUrl='https://e.org/feed' type=rss"#;
        assert_eq!(attribute(attrs, "text").as_deref(), Some("A & B"));
        assert_eq!(attribute(attrs, "xmlurl").as_deref(), Some("https://e.org/feed"));
        assert_eq!(attribute(attrs, "type").as_deref(), Some("rss"));
        assert_eq!(attribute(attrs, "url"), None);
    }
}
