//! Opera saved sessions (`*.win`)
//!
//! A session file keeps one section per window or tab (`[3]`) plus its
//! history in `[3 history url]` / `[3 history title]`. Only the page a tab was
//! showing is imported. Tabs point at their browser window through `parent`.

use super::ini::{self, IniSection};
use super::{deliver, opera_profile_dir, read_source, Delivery, OPERA_SESSION};
use crate::importer::{ImportContext, Importer};
use crate::models::{FileFilter, ImportCommand, ImportedItem, ImporterDescriptor};
use async_trait::async_trait;
use impex_common::ExchangeType;
use std::collections::HashMap;
use tracing::info;

pub struct OperaSessionImporter {
    descriptor: ImporterDescriptor,
}

impl OperaSessionImporter {
    pub fn new() -> Self {
        Self {
            descriptor: ImporterDescriptor {
                identifier: OPERA_SESSION.to_string(),
                title: "Import Opera Session".to_string(),
                suggested_path: opera_profile_dir().join("sessions").join("autosave.win"),
                file_filters: vec![
                    FileFilter::new("Opera session files", ["*.win"]),
                    FileFilter::new("All files", ["*"]),
                ],
                has_options: false,
            },
        }
    }
}

impl Default for OperaSessionImporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Numbered entries (`1=...`, `2=...`) in numeric order
fn numbered(section: &IniSection) -> Vec<(usize, &str)> {
    let mut entries: Vec<(usize, &str)> = section
        .entries
        .iter()
        .filter_map(|(k, v)| k.parse::<usize>().ok().map(|n| (n, v.as_str())))
        .collect();
    entries.sort_by_key(|(n, _)| *n);
    entries
}

pub(crate) fn scan(input: &str) -> Vec<ImportedItem> {
    let sections = ini::parse(input);
    let by_name: HashMap<&str, &IniSection> =
        sections.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut tabs: Vec<(usize, &IniSection)> = sections
        .iter()
        .filter_map(|s| s.name.parse::<usize>().ok().map(|id| (id, s)))
        .collect();
    tabs.sort_by_key(|(id, _)| *id);

    let mut items = Vec::new();
    for (id, tab) in tabs {
        let Some(urls) = by_name.get(format!("{id} history url").as_str()) else {
            continue;
        };
        let urls = numbered(urls);
        if urls.is_empty() {
            continue;
        }

        let current = tab
            .get("current history")
            .and_then(|v| v.trim().parse::<usize>().ok());
        let Some(&(index, url)) = current
            .and_then(|c| urls.iter().find(|(n, _)| *n == c))
            .or_else(|| urls.last())
        else {
            continue;
        };
        if url.trim().is_empty() {
            continue;
        }

        let title = by_name
            .get(format!("{id} history title").as_str())
            .and_then(|titles| numbered(titles).into_iter().find(|(n, _)| *n == index))
            .map(|(_, t)| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| url.to_string());
        let window = tab
            .get("parent")
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|p| *p != 0)
            .unwrap_or(id);

        items.push(ImportedItem::SessionTab {
            window,
            title,
            url: url.trim().to_string(),
        });
    }
    items
}

#[async_trait]
impl Importer for OperaSessionImporter {
    fn descriptor(&self) -> ImporterDescriptor {
        self.descriptor.clone()
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Sessions
    }

    fn can_cancel(&self) -> bool {
        false
    }

    async fn import_data(&mut self, command: ImportCommand, ctx: ImportContext) -> anyhow::Result<()> {
        let content = read_source(&command.source_path).await?;
        let tabs = scan(&content);
        info!(path = %command.source_path.display(), tabs = tabs.len(), "Scanned Opera session");

        // Tabs are restored as one batch; there is no meaningful per-tab fraction
        deliver(
            &ctx,
            tabs,
            Delivery {
                determinate: false,
                cancellable: false,
                skip_duplicate_urls: false,
            },
        )
        .await
    }
}
