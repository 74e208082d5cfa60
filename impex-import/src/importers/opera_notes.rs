//! Opera notes (`notes.adr`)

use super::adr::{self, AdrKind, AdrRecord};
use super::{deliver, opera_profile_dir, read_source, Delivery, OPERA_NOTES};
use crate::importer::{ImportContext, Importer};
use crate::models::{FileFilter, ImportCommand, ImportOptions, ImportedItem, ImporterDescriptor};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use impex_common::ExchangeType;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Opera stores note line breaks as a pair of STX characters
const LINE_BREAK: &str = "\u{2}\u{2}";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoteImportOptions {
    /// Folder to import into; `None` = root
    pub folder: Option<String>,
}

pub struct OperaNotesImporter {
    descriptor: ImporterDescriptor,
}

impl OperaNotesImporter {
    pub fn new() -> Self {
        Self {
            descriptor: ImporterDescriptor {
                identifier: OPERA_NOTES.to_string(),
                title: "Import Opera Notes".to_string(),
                suggested_path: opera_profile_dir().join("notes.adr"),
                file_filters: vec![
                    FileFilter::new("Opera note files", ["*.adr"]),
                    FileFilter::new("All files", ["*"]),
                ],
                has_options: true,
            },
        }
    }
}

impl Default for OperaNotesImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn created_at(record: &AdrRecord) -> Option<DateTime<Utc>> {
    let seconds = record.field("CREATED")?.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(seconds, 0)
}

pub(crate) fn scan(input: &str, base: &[String]) -> Vec<ImportedItem> {
    let mut items = Vec::new();
    let mut path: Vec<String> = base.to_vec();
    let mut trash_depth = 0usize;

    for record in adr::parse(input) {
        match &record {
            AdrRecord::CloseFolder => {
                if trash_depth > 0 {
                    trash_depth -= 1;
                } else if path.len() > base.len() {
                    path.pop();
                }
            }
            AdrRecord::Open { kind, .. } if trash_depth > 0 => {
                if *kind == AdrKind::Folder {
                    trash_depth += 1;
                }
            }
            AdrRecord::Open { kind, .. } => match kind {
                AdrKind::Folder if adr::is_trash(&record) => trash_depth = 1,
                AdrKind::Folder => {
                    let title = record
                        .field("NAME")
                        .map(|n| n.trim().to_string())
                        .unwrap_or_default();
                    items.push(ImportedItem::Folder {
                        folder: path.clone(),
                        title: title.clone(),
                    });
                    path.push(title);
                }
                AdrKind::Note => {
                    let text = record
                        .field("NAME")
                        .unwrap_or_default()
                        .replace(LINE_BREAK, "\n");
                    let url = record
                        .field("URL")
                        .map(str::trim)
                        .filter(|u| !u.is_empty())
                        .map(str::to_string);
                    if text.trim().is_empty() && url.is_none() {
                        continue;
                    }
                    items.push(ImportedItem::Note {
                        folder: path.clone(),
                        text,
                        url,
                        created: created_at(&record),
                    });
                }
                AdrKind::Separator => items.push(ImportedItem::Separator {
                    folder: path.clone(),
                }),
                AdrKind::Url | AdrKind::Other => {}
            },
        }
    }

    items
}

#[async_trait]
impl Importer for OperaNotesImporter {
    fn descriptor(&self) -> ImporterDescriptor {
        self.descriptor.clone()
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Notes
    }

    fn can_cancel(&self) -> bool {
        true
    }

    fn default_options(&self) -> ImportOptions {
        ImportOptions::encode(&NoteImportOptions::default()).unwrap_or_default()
    }

    async fn import_data(&mut self, command: ImportCommand, ctx: ImportContext) -> anyhow::Result<()> {
        let options: NoteImportOptions = command.options.decode()?;
        let content = read_source(&command.source_path).await?;
        let base: Vec<String> = options
            .folder
            .iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        let items = scan(&content, &base);
        info!(path = %command.source_path.display(), entries = items.len(), "Scanned Opera notes");

        deliver(
            &ctx,
            items,
            Delivery {
                determinate: true,
                cancellable: true,
                skip_duplicate_urls: false,
            },
        )
        .await
    }
}
