//! Entries produced by importers and handed to an `ImportSink`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One imported entry
///
/// `folder` is the path of enclosing folders, outermost first, already
/// prefixed with any target folder chosen through the importer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportedItem {
    Folder {
        folder: Vec<String>,
        title: String,
    },
    Bookmark {
        folder: Vec<String>,
        title: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyword: Option<String>,
    },
    Separator {
        folder: Vec<String>,
    },
    Note {
        folder: Vec<String>,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created: Option<DateTime<Utc>>,
    },
    SearchEngine {
        title: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyword: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encoding: Option<String>,
        /// Form body for POST engines
        #[serde(default, skip_serializing_if = "Option::is_none")]
        post_query: Option<String>,
    },
    SessionTab {
        window: usize,
        title: String,
        url: String,
    },
    Feed {
        folder: Vec<String>,
        title: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        site_url: Option<String>,
    },
}

impl ImportedItem {
    /// URL the entry points at, if any (used for duplicate detection)
    pub fn url(&self) -> Option<&str> {
        match self {
            ImportedItem::Bookmark { url, .. }
            | ImportedItem::SearchEngine { url, .. }
            | ImportedItem::SessionTab { url, .. }
            | ImportedItem::Feed { url, .. } => Some(url),
            ImportedItem::Note { url, .. } => url.as_deref(),
            ImportedItem::Folder { .. } | ImportedItem::Separator { .. } => None,
        }
    }
}
