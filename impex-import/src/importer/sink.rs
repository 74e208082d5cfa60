//! Destinations for imported entries

use crate::models::ImportedItem;
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Mutex;

/// Receives the entries an importer produces
///
/// Called from the importer's task, one entry at a time.
pub trait ImportSink: Send + Sync {
    fn accept(&self, item: ImportedItem) -> Result<()>;

    /// Flush buffered output; runs right before the run's `Finished` is sent
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Drops everything
#[derive(Debug, Default)]
pub struct DiscardSink;

impl ImportSink for DiscardSink {
    fn accept(&self, _item: ImportedItem) -> Result<()> {
        Ok(())
    }
}

/// Collects entries in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    items: Mutex<Vec<ImportedItem>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything accepted so far
    pub fn items(&self) -> Vec<ImportedItem> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImportSink for MemorySink {
    fn accept(&self, item: ImportedItem) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(item);
        Ok(())
    }
}

/// Writes one JSON object per entry, one per line
pub struct JsonLinesSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl ImportSink for JsonLinesSink {
    fn accept(&self, item: ImportedItem) -> Result<()> {
        let line = serde_json::to_string(&item).context("Failed to encode entry")?;
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(writer, "{}", line).context("Failed to write entry")?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .flush()
            .context("Failed to flush output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn json_lines_writes_one_object_per_entry() {
        let buffer = SharedBuffer::default();
        let sink = JsonLinesSink::new(buffer.clone());

        sink.accept(ImportedItem::Separator { folder: vec![] }).unwrap();
        sink.accept(ImportedItem::Feed {
            folder: vec!["News".to_string()],
            title: "Example".to_string(),
            url: "https://example.org/rss".to_string(),
            site_url: None,
        })
        .unwrap();
        sink.flush().unwrap();

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let feed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(feed["kind"], "feed");
        assert_eq!(feed["url"], "https://example.org/rss");
        assert!(feed.get("site_url").is_none());
    }

    #[test]
    fn memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.accept(ImportedItem::Separator { folder: vec!["a".into()] })
            .unwrap();
        sink.accept(ImportedItem::Separator { folder: vec!["b".into()] })
            .unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.items()[1],
            ImportedItem::Separator { folder: vec!["b".into()] }
        );
    }
}
