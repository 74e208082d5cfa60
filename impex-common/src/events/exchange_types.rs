//! Exchange classification and outcome types

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of data an exchange moves
///
/// Kept independent of direction so export can reuse the same machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeType {
    Unknown,
    Bookmarks,
    Feeds,
    History,
    Notes,
    SearchEngines,
    Sessions,
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExchangeType::Unknown => "unknown",
            ExchangeType::Bookmarks => "bookmarks",
            ExchangeType::Feeds => "feeds",
            ExchangeType::History => "history",
            ExchangeType::Notes => "notes",
            ExchangeType::SearchEngines => "search engines",
            ExchangeType::Sessions => "sessions",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of one exchange run
///
/// Assigned exactly once per session. `Cancelled` is informational, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationResult {
    Successful,
    Failed,
    Cancelled,
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Successful)
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperationResult::Successful => "Import finished successfully.",
            OperationResult::Failed => "Failed to import data.",
            OperationResult::Cancelled => "Import cancelled by the user.",
        };
        f.write_str(text)
    }
}
