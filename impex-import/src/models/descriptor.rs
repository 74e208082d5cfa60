//! Static description of an importer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How to present an importer without running it
///
/// Built once by the importer; never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterDescriptor {
    /// Stable registry key (e.g. `"OpmlFeeds"`)
    pub identifier: String,
    /// Window / menu title
    pub title: String,
    /// Default source location offered to the user
    pub suggested_path: PathBuf,
    /// Ordered file-picker filters
    pub file_filters: Vec<FileFilter>,
    /// Whether the importer accepts options
    pub has_options: bool,
}

/// One file-picker filter, e.g. `HTML files (*.htm *.html)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub label: String,
    pub patterns: Vec<String>,
}

impl FileFilter {
    pub fn new<I, S>(label: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a file name matches one of the patterns
    ///
    /// Supports exact names and `*.ext` / `*` wildcards, which is all the
    /// built-in filters use.
    pub fn matches(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        self.patterns.iter().any(|pattern| {
            let pattern = pattern.to_ascii_lowercase();
            if pattern == "*" {
                true
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                lower.ends_with(suffix)
            } else {
                lower == pattern
            }
        })
    }
}

impl fmt::Display for FileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.patterns.join(" "))
    }
}
