//! Opera hotlist bookmarks (`bookmarks.adr`)

use super::adr::{self, AdrKind, AdrRecord};
use super::{
    deliver, opera_profile_dir, read_source, Delivery, FolderImportOptions, OPERA_BOOKMARKS,
};
use crate::importer::{ImportContext, Importer};
use crate::models::{FileFilter, ImportCommand, ImportOptions, ImportedItem, ImporterDescriptor};
use async_trait::async_trait;
use impex_common::ExchangeType;
use tracing::info;

pub struct OperaBookmarksImporter {
    descriptor: ImporterDescriptor,
}

impl OperaBookmarksImporter {
    pub fn new() -> Self {
        Self {
            descriptor: ImporterDescriptor {
                identifier: OPERA_BOOKMARKS.to_string(),
                title: "Import Opera Bookmarks".to_string(),
                suggested_path: opera_profile_dir().join("bookmarks.adr"),
                file_filters: vec![
                    FileFilter::new("Opera bookmark files", ["*.adr"]),
                    FileFilter::new("All files", ["*"]),
                ],
                has_options: true,
            },
        }
    }
}

impl Default for OperaBookmarksImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Turn hotlist records into items; the trash folder and its contents are skipped
pub(crate) fn scan(input: &str, base: &[String]) -> Vec<ImportedItem> {
    let mut items = Vec::new();
    let mut path: Vec<String> = base.to_vec();
    let mut trash_depth = 0usize;

    for record in adr::parse(input) {
        match &record {
            AdrRecord::CloseFolder => {
                if trash_depth > 0 {
                    trash_depth -= 1;
                    continue;
                }
                // Stray closers never eat into the base folder
                if path.len() > base.len() {
                    path.pop();
                }
            }
            AdrRecord::Open { kind, .. } => {
                if trash_depth > 0 {
                    if *kind == AdrKind::Folder {
                        trash_depth += 1;
                    }
                    continue;
                }
                match kind {
                    AdrKind::Folder if adr::is_trash(&record) => trash_depth = 1,
                    AdrKind::Folder => {
                        let title = non_empty(record.field("NAME")).unwrap_or_default();
                        items.push(ImportedItem::Folder {
                            folder: path.clone(),
                            title: title.clone(),
                        });
                        path.push(title);
                    }
                    AdrKind::Url => {
                        let Some(url) = non_empty(record.field("URL")) else {
                            continue;
                        };
                        items.push(ImportedItem::Bookmark {
                            folder: path.clone(),
                            title: non_empty(record.field("NAME")).unwrap_or_else(|| url.clone()),
                            url,
                            description: non_empty(record.field("DESCRIPTION")),
                            keyword: non_empty(record.field("SHORT NAME")),
                        });
                    }
                    AdrKind::Separator => items.push(ImportedItem::Separator {
                        folder: path.clone(),
                    }),
                    AdrKind::Note | AdrKind::Other => {}
                }
            }
        }
    }

    items
}

#[async_trait]
impl Importer for OperaBookmarksImporter {
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
            "Scanned Opera bookmarks"
        );

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

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Opera Hotlist version 2.0
Options: encoding = utf8, version=3

#FOLDER
\tID=1
\tNAME=Dev
\tCREATED=1200000000

#URL
\tID=2
\tNAME=Rust
\tURL=https://www.rust-lang.org/
\tDESCRIPTION=Language home
\tSHORT NAME=rs

-

#SEPERATOR
\tID=3

#FOLDER
\tID=4
\tNAME=Trash
\tTRASH FOLDER=YES

#FOLDER
\tID=5
\tNAME=Old

#URL
\tID=6
\tNAME=Gone
\tURL=http://gone.example/

-

-

#URL
\tID=7
\tURL=https://example.com/
";

    #[test]
    fn reads_folders_and_skips_trash() {
        let items = scan(SAMPLE, &[]);
        assert_eq!(items.len(), 4);
        assert_eq!(
            items[1],
            ImportedItem::Bookmark {
                folder: vec!["Dev".to_string()],
                title: "Rust".to_string(),
                url: "https://www.rust-lang.org/".to_string(),
                description: Some("Language home".to_string()),
                keyword: Some("rs".to_string()),
            }
        );
        assert_eq!(items[2], ImportedItem::Separator { folder: vec![] });
        assert!(matches!(&items[3], ImportedItem::Bookmark { title, folder, .. }
            if title == "https://example.com/" && folder.is_empty()));
        assert!(items.iter().all(|i| i.url() != Some("http://gone.example/")));
    }

    #[test]
    fn base_folder_is_applied() {
        let items = scan(SAMPLE, &["Opera".to_string()]);
        assert_eq!(
            items[0],
            ImportedItem::Folder {
                folder: vec!["Opera".to_string()],
                title: "Dev".to_string()
            }
        );
    }
}
