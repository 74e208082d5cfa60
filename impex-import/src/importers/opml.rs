//! OPML feed lists
//!
//! An `<outline>` with an `xmlUrl` is a feed; any other outline that has
//! children is a folder.

use super::markup::{self, Token};
use super::{deliver, home_dir, read_source, Delivery, FolderImportOptions, OPML_FEEDS};
use crate::importer::{ImportContext, Importer};
use crate::models::{FileFilter, ImportCommand, ImportOptions, ImportedItem, ImporterDescriptor};
use async_trait::async_trait;
use impex_common::ExchangeType;
use tracing::info;

pub struct OpmlImporter {
    descriptor: ImporterDescriptor,
}

impl OpmlImporter {
    pub fn new() -> Self {
        Self {
            descriptor: ImporterDescriptor {
                identifier: OPML_FEEDS.to_string(),
                title: "Import Feeds from OPML".to_string(),
                suggested_path: home_dir().join("feeds.opml"),
                file_filters: vec![
                    FileFilter::new("OPML files", ["*.opml", "*.xml"]),
                    FileFilter::new("All files", ["*"]),
                ],
                has_options: true,
            },
        }
    }
}

impl Default for OpmlImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn outline_title(attrs: &str) -> Option<String> {
    markup::attribute(attrs, "title")
        .or_else(|| markup::attribute(attrs, "text"))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub(crate) fn scan(input: &str, base: &[String]) -> Vec<ImportedItem> {
    let mut items = Vec::new();
    let mut path: Vec<String> = base.to_vec();
    // One flag per open (non-self-closing) outline: whether it pushed a folder
    let mut open: Vec<bool> = Vec::new();

    for token in markup::tokenize(input) {
        let Token::Tag {
            name,
            attrs,
            self_closing,
        } = token
        else {
            continue;
        };

        match name.as_str() {
            "outline" => {
                if let Some(url) = markup::attribute(attrs, "xmlurl").filter(|u| !u.trim().is_empty()) {
                    let url = url.trim().to_string();
                    items.push(ImportedItem::Feed {
                        folder: path.clone(),
                        title: outline_title(attrs).unwrap_or_else(|| url.clone()),
                        url,
                        site_url: markup::attribute(attrs, "htmlurl").filter(|u| !u.trim().is_empty()),
                    });
                    if !self_closing {
                        open.push(false);
                    }
                } else if !self_closing {
                    let title = outline_title(attrs).unwrap_or_default();
                    items.push(ImportedItem::Folder {
                        folder: path.clone(),
                        title: title.clone(),
                    });
                    path.push(title);
                    open.push(true);
                }
            }
            "/outline" => {
                if open.pop() == Some(true) {
                    path.pop();
                }
            }
            _ => {}
        }
    }

    items
}

#[async_trait]
impl Importer for OpmlImporter {
    fn descriptor(&self) -> ImporterDescriptor {
        self.descriptor.clone()
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Feeds
    }

    fn can_cancel(&self) -> bool {
        true
    }

    fn default_options(&self) -> ImportOptions {
        ImportOptions::encode(&FolderImportOptions::default()).unwrap_or_default()
    }

    async fn import_data(&mut self, command: ImportCommand, ctx: ImportContext) -> anyhow::Result<()> {
        let options: FolderImportOptions = command.options.decode()?;
        let content = read_source(&command.source_path).await?;
        // Progress counts feeds; folders are implied by the feeds' paths
        let feeds: Vec<ImportedItem> = scan(&content, &options.base_folder())
            .into_iter()
            .filter(|item| matches!(item, ImportedItem::Feed { .. }))
            .collect();
        info!(path = %command.source_path.display(), feeds = feeds.len(), "Scanned OPML");

        deliver(
            &ctx,
            feeds,
            Delivery {
                determinate: true,
                cancellable: true,
                skip_duplicate_urls: !options.allow_duplicates,
            },
        )
        .await
    }
}
