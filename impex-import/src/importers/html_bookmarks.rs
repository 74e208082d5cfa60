//! Netscape-style HTML bookmark files (`bookmarks.html`)

use super::markup::{self, Token};
use super::{deliver, home_dir, read_source, Delivery, FolderImportOptions, HTML_BOOKMARKS};
use crate::importer::{ImportContext, Importer};
use crate::models::{FileFilter, ImportCommand, ImportOptions, ImportedItem, ImporterDescriptor};
use async_trait::async_trait;
use impex_common::ExchangeType;
use tracing::{debug, info};

pub struct HtmlBookmarksImporter {
    descriptor: ImporterDescriptor,
}

impl HtmlBookmarksImporter {
    pub fn new() -> Self {
        Self {
            descriptor: ImporterDescriptor {
                identifier: HTML_BOOKMARKS.to_string(),
                title: "Import Bookmarks from HTML".to_string(),
                suggested_path: home_dir().join("bookmarks.html"),
                file_filters: vec![
                    FileFilter::new("HTML files", ["*.htm", "*.html"]),
                    FileFilter::new("All files", ["*"]),
                ],
                has_options: true,
            },
        }
    }
}

impl Default for HtmlBookmarksImporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan a bookmark file into folders, bookmarks and separators
///
/// `<H3>` opens a folder that lasts until the matching `</DL>`; `<A>` is a
/// bookmark whose title is the following text; `<DD>` text describes the
/// preceding bookmark.
pub(crate) fn scan(input: &str, base: &[String]) -> Vec<ImportedItem> {
    #[derive(PartialEq)]
    enum Capture {
        None,
        FolderTitle,
        LinkTitle,
        Description,
    }

    let mut items: Vec<ImportedItem> = Vec::new();
    let mut path: Vec<String> = base.to_vec();
    // One flag per open <DL>: whether it belongs to a folder we pushed
    let mut lists: Vec<bool> = Vec::new();
    let mut folder_pending = false;
    let mut capture = Capture::None;
    let mut link: Option<(String, Option<String>)> = None;
    let mut text = String::new();

    for token in markup::tokenize(input) {
        match token {
            Token::Text(t) => {
                if capture != Capture::None {
                    text.push_str(t);
                }
            }
            Token::Tag { name, attrs, .. } => {
                // Any block tag ends a <DD> description
                if capture == Capture::Description && name != "br" {
                    attach_description(&mut items, &text);
                    capture = Capture::None;
                }
                match name.as_str() {
                    "h3" => {
                        capture = Capture::FolderTitle;
                        text.clear();
                    }
                    "/h3" if capture == Capture::FolderTitle => {
                        let title = markup::decode_entities(text.trim());
                        items.push(ImportedItem::Folder {
                            folder: path.clone(),
                            title: title.clone(),
                        });
                        path.push(title);
                        folder_pending = true;
                        capture = Capture::None;
                    }
                    "dl" => {
                        lists.push(folder_pending);
                        folder_pending = false;
                    }
                    "/dl" => {
                        if lists.pop() == Some(true) {
                            path.pop();
                        }
                    }
                    "a" => {
                        if let Some(url) = markup::attribute(attrs, "href") {
                            link = Some((url, markup::attribute(attrs, "shortcuturl")));
                            capture = Capture::LinkTitle;
                            text.clear();
                        }
                    }
                    "/a" if capture == Capture::LinkTitle => {
                        if let Some((url, keyword)) = link.take() {
                            let title = markup::decode_entities(text.trim());
                            items.push(ImportedItem::Bookmark {
                                folder: path.clone(),
                                title: if title.is_empty() { url.clone() } else { title },
                                url,
                                description: None,
                                keyword: keyword.filter(|k| !k.is_empty()),
                            });
                        }
                        capture = Capture::None;
                    }
                    "dd" => {
                        capture = Capture::Description;
                        text.clear();
                    }
                    "hr" => items.push(ImportedItem::Separator {
                        folder: path.clone(),
                    }),
                    _ => {}
                }
            }
        }
    }
    if capture == Capture::Description {
        attach_description(&mut items, &text);
    }

    items
}

fn attach_description(items: &mut [ImportedItem], text: &str) {
    let text = markup::decode_entities(text.trim());
    if text.is_empty() {
        return;
    }
    if let Some(ImportedItem::Bookmark { description, .. }) = items.last_mut() {
        *description = Some(text);
    }
}

#[async_trait]
impl Importer for HtmlBookmarksImporter {
    fn descriptor(&self) -> ImporterDescriptor {
        self.descriptor.clone()
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Bookmarks
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
        let items = scan(&content, &options.base_folder());
        info!(
            path = %command.source_path.display(),
            entries = items.len(),
            "Scanned HTML bookmarks"
        );
        debug!(?options, "HTML bookmark options");

        deliver(
            &ctx,
            items,
            Delivery {
                determinate: true,
                cancellable: true,
                skip_duplicate_urls: !options.allow_duplicates,
            },
        )
        .await
    }
}
