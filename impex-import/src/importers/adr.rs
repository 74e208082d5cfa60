//! Opera hotlist (`.adr`) record reader, shared by bookmarks and notes
//!
//! The format is a header followed by blank-line separated records:
//!
//! ```text
//! Opera Hotlist version 2.0
//!
//! #FOLDER
//!     NAME=News
//!
//! #URL
//!     NAME=Example
//!     URL=http://example.com/
//!
//! -
//! ```
//!
//! A lone `-` closes the innermost open folder.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdrKind {
    Folder,
    Url,
    Note,
    Separator,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AdrRecord {
    Open {
        kind: AdrKind,
        fields: HashMap<String, String>,
    },
    CloseFolder,
}

impl AdrRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        match self {
            AdrRecord::Open { fields, .. } => fields.get(key).map(String::as_str),
            AdrRecord::CloseFolder => None,
        }
    }
}

pub(crate) fn parse(input: &str) -> Vec<AdrRecord> {
    type Pending = Option<(AdrKind, HashMap<String, String>)>;

    fn flush(current: &mut Pending, records: &mut Vec<AdrRecord>) {
        if let Some((kind, fields)) = current.take() {
            records.push(AdrRecord::Open { kind, fields });
        }
    }

    let mut records = Vec::new();
    let mut current: Pending = None;

    for line in input.lines() {
        let trimmed = line.trim();

        if let Some(tag) = trimmed.strip_prefix('#') {
            flush(&mut current, &mut records);
            let kind = match tag.trim().to_ascii_uppercase().as_str() {
                "FOLDER" => AdrKind::Folder,
                "URL" => AdrKind::Url,
                "NOTE" => AdrKind::Note,
                // Opera writes it misspelled; accept both
                "SEPERATOR" | "SEPARATOR" => AdrKind::Separator,
                _ => AdrKind::Other,
            };
            current = Some((kind, HashMap::new()));
        } else if trimmed == "-" {
            flush(&mut current, &mut records);
            records.push(AdrRecord::CloseFolder);
        } else if trimmed.is_empty() {
            flush(&mut current, &mut records);
        } else if let Some((_, fields)) = current.as_mut() {
            if let Some((key, value)) = trimmed.split_once('=') {
                fields.insert(key.trim().to_ascii_uppercase(), value.to_string());
            }
        }
    }
    flush(&mut current, &mut records);

    records
}

/// Whether a folder record is Opera's trash folder
pub(crate) fn is_trash(record: &AdrRecord) -> bool {
    record
        .field("TRASH FOLDER")
        .is_some_and(|v| v.eq_ignore_ascii_case("YES"))
}
