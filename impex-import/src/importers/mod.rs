//! Built-in importers
//!
//! | identifier           | data           | progress        | cancellable |
//! |----------------------|----------------|-----------------|-------------|
//! | `HtmlBookmarks`      | bookmarks      | per entry       | yes         |
//! | `OperaBookmarks`     | bookmarks      | per entry       | yes         |
//! | `OperaNotes`         | notes          | per entry       | yes         |
//! | `OperaSearchEngines` | search engines | per engine      | no          |
//! | `OperaSession`       | session tabs   | indeterminate   | no          |
//! | `OpmlFeeds`          | feeds          | per feed        | yes         |
//!
//! Each importer reads its source in full, scans it into [`ImportedItem`]s
//! and then delivers them to the sink with [`deliver`], which owns the
//! progress and cancellation bookkeeping.

mod adr;
mod html_bookmarks;
mod ini;
mod markup;
mod opera_bookmarks;
mod opera_notes;
mod opera_search_engines;
mod opera_session;
mod opml;

pub use html_bookmarks::HtmlBookmarksImporter;
pub use opera_bookmarks::OperaBookmarksImporter;
pub use opera_notes::{NoteImportOptions, OperaNotesImporter};
pub use opera_search_engines::OperaSearchEnginesImporter;
pub use opera_session::OperaSessionImporter;
pub use opml::OpmlImporter;

use crate::importer::{ImportContext, Importer};
use crate::models::ImportedItem;
use crate::registry::ImporterRegistry;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const HTML_BOOKMARKS: &str = "HtmlBookmarks";
pub const OPERA_BOOKMARKS: &str = "OperaBookmarks";
pub const OPERA_NOTES: &str = "OperaNotes";
pub const OPERA_SEARCH_ENGINES: &str = "OperaSearchEngines";
pub const OPERA_SESSION: &str = "OperaSession";
pub const OPML_FEEDS: &str = "OpmlFeeds";

/// Identifiers of every built-in importer
pub const BUILTIN_IDENTIFIERS: [&str; 6] = [
    HTML_BOOKMARKS,
    OPERA_BOOKMARKS,
    OPERA_NOTES,
    OPERA_SEARCH_ENGINES,
    OPERA_SESSION,
    OPML_FEEDS,
];

pub(crate) fn register_builtin(registry: &mut ImporterRegistry) {
    registry.register(HTML_BOOKMARKS, || {
        Box::new(HtmlBookmarksImporter::new()) as Box<dyn Importer>
    });
    registry.register(OPERA_BOOKMARKS, || {
        Box::new(OperaBookmarksImporter::new()) as Box<dyn Importer>
    });
    registry.register(OPERA_NOTES, || {
        Box::new(OperaNotesImporter::new()) as Box<dyn Importer>
    });
    registry.register(OPERA_SEARCH_ENGINES, || {
        Box::new(OperaSearchEnginesImporter::new()) as Box<dyn Importer>
    });
    registry.register(OPERA_SESSION, || {
        Box::new(OperaSessionImporter::new()) as Box<dyn Importer>
    });
    registry.register(OPML_FEEDS, || Box::new(OpmlImporter::new()) as Box<dyn Importer>);
}

/// Options shared by importers that write into a folder tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolderImportOptions {
    /// Folder to import into (created under the root); `None` = root
    pub folder: Option<String>,
    /// Keep entries whose URL was already imported in this run
    pub allow_duplicates: bool,
}

impl Default for FolderImportOptions {
    fn default() -> Self {
        Self {
            folder: None,
            allow_duplicates: true,
        }
    }
}

impl FolderImportOptions {
    /// Folder path every imported entry starts from
    pub fn base_folder(&self) -> Vec<String> {
        self.folder
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| vec![f.to_string()])
            .unwrap_or_default()
    }
}

/// Platform Opera profile directory
pub fn opera_profile_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if cfg!(target_os = "windows") {
        dirs::config_dir()
            .map(|d| d.join("Opera").join("Opera"))
            .unwrap_or_else(|| home.join("Opera"))
    } else if cfg!(target_os = "macos") {
        home.join("Library").join("Opera")
    } else {
        home.join(".opera")
    }
}

/// User home directory (default location for exported files)
pub(crate) fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Read a source file as text
///
/// Invalid UTF-8 is replaced rather than rejected; older Opera profiles are
/// not always clean UTF-8.
pub(crate) async fn read_source(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// How [`deliver`] reports and cancels
#[derive(Debug, Clone, Copy)]
pub(crate) struct Delivery {
    /// Report a known total and per-entry ticks; otherwise stay indeterminate
    pub determinate: bool,
    /// Honour cancellation between entries; otherwise only before the first
    pub cancellable: bool,
    /// Skip entries whose URL was already delivered in this run
    pub skip_duplicate_urls: bool,
}

/// Hand scanned entries to the sink, emitting the full event sequence
pub(crate) async fn deliver(
    ctx: &ImportContext,
    entries: Vec<ImportedItem>,
    delivery: Delivery,
) -> Result<()> {
    let emitter = ctx.emitter();
    let total = if delivery.determinate {
        entries.len() as u64
    } else {
        0
    };
    emitter.started(total);

    // Non-cancellable imports commit as one unit: last chance to back out
    if !delivery.cancellable && ctx.is_cancelled() {
        info!("Cancelled before commit");
        emitter.cancelled();
        return Ok(());
    }

    let mut seen_urls = HashSet::new();
    let mut skipped = 0usize;

    for (index, item) in entries.into_iter().enumerate() {
        if delivery.cancellable && ctx.is_cancelled() {
            info!(completed = index, total, "Cancelled between entries");
            emitter.cancelled();
            return Ok(());
        }

        let duplicate = delivery.skip_duplicate_urls
            && item
                .url()
                .is_some_and(|url| !seen_urls.insert(url.to_string()));
        if duplicate {
            skipped += 1;
        } else {
            ctx.sink()
                .accept(item)
                .with_context(|| format!("Failed to store entry {}", index + 1))?;
        }

        if delivery.determinate {
            emitter.progress(total, index as u64 + 1);
        }
        tokio::task::yield_now().await;
    }

    if skipped > 0 {
        debug!(skipped, "Skipped duplicate entries");
    }
    emitter.finished(impex_common::OperationResult::Successful, total);
    Ok(())
}
