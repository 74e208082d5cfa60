//! Opera search engines (`search.ini`)
//!
//! The engine list is replaced as a whole, so a run either commits every
//! engine or none: cancellation is only honoured before the first one.

use super::ini;
use super::{deliver, opera_profile_dir, read_source, Delivery, OPERA_SEARCH_ENGINES};
use crate::importer::{ImportContext, Importer};
use crate::models::{FileFilter, ImportCommand, ImportedItem, ImporterDescriptor};
use async_trait::async_trait;
use impex_common::ExchangeType;
use tracing::{debug, info};

const SEARCH_TERMS: &str = "{searchTerms}";

pub struct OperaSearchEnginesImporter {
    descriptor: ImporterDescriptor,
}

impl OperaSearchEnginesImporter {
    pub fn new() -> Self {
        Self {
            descriptor: ImporterDescriptor {
                identifier: OPERA_SEARCH_ENGINES.to_string(),
                title: "Import Opera Search Engines".to_string(),
                suggested_path: opera_profile_dir().join("search.ini"),
                file_filters: vec![
                    FileFilter::new("Opera search engine files", ["search.ini"]),
                    FileFilter::new("All files", ["*"]),
                ],
                has_options: false,
            },
        }
    }
}

impl Default for OperaSearchEnginesImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim() == "1" || v.trim().eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub(crate) fn scan(input: &str) -> Vec<ImportedItem> {
    ini::parse(input)
        .into_iter()
        .filter(|section| section.name.starts_with("Search Engine"))
        .filter_map(|section| {
            if flag(section.get("Deleted")) {
                debug!(section = %section.name, "Skipping deleted engine");
                return None;
            }
            let url = non_empty(section.get("URL"))?.replace("%s", SEARCH_TERMS);
            let post_query = if flag(section.get("Is post")) {
                non_empty(section.get("Post Query")).map(|q| q.replace("%s", SEARCH_TERMS))
            } else {
                None
            };
            Some(ImportedItem::SearchEngine {
                title: non_empty(section.get("Name")).unwrap_or_else(|| url.clone()),
                url,
                keyword: non_empty(section.get("Key")),
                encoding: non_empty(section.get("Encoding")),
                post_query,
            })
        })
        .collect()
}

#[async_trait]
impl Importer for OperaSearchEnginesImporter {
    fn descriptor(&self) -> ImporterDescriptor {
        self.descriptor.clone()
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::SearchEngines
    }

    fn can_cancel(&self) -> bool {
        false
    }

    async fn import_data(&mut self, command: ImportCommand, ctx: ImportContext) -> anyhow::Result<()> {
        let content = read_source(&command.source_path).await?;
        let engines = scan(&content);
        info!(path = %command.source_path.display(), engines = engines.len(), "Scanned search engines");

        deliver(
            &ctx,
            engines,
            Delivery {
                determinate: true,
                cancellable: false,
                skip_duplicate_urls: false,
            },
        )
        .await
    }
}
