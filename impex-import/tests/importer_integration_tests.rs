//! Built-in importers run end to end through a session
//!
//! Each test writes a small source file into a temp dir, runs the importer
//! resolved from the registry and inspects the events and collected entries.

mod helpers;

use helpers::{amounts, collect_events, FlushFailsSink};
use impex_common::{ExchangeEvent, ExchangeType, OperationResult};
use impex_import::{
    ImportCommand, ImportOptions, ImportSession, ImportedItem, ImporterRegistry, MemorySink,
};
use std::path::Path;
use std::sync::Arc;

struct Run {
    result: OperationResult,
    events: Vec<ExchangeEvent>,
    items: Vec<ImportedItem>,
}

async fn run_import(format: &str, path: &Path, options: ImportOptions) -> Run {
    let registry = ImporterRegistry::with_builtin_importers();
    let importer = registry.resolve(format).unwrap();
    let mut merged = importer.default_options();
    merged.merge(options);

    let sink = Arc::new(MemorySink::new());
    let mut session = ImportSession::new(importer).with_sink(sink.clone());
    let mut events = session.subscribe().unwrap();
    session
        .start(ImportCommand::new(path).with_options(merged))
        .unwrap();

    let events = collect_events(&mut events).await;
    Run {
        result: session.wait().await.unwrap(),
        events,
        items: sink.items(),
    }
}

fn write_source(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

const BOOKMARKS_HTML: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<DL><p>
    <DT><H3>Reading</H3>
    <DL><p>
        <DT><A HREF="https://one.example/">One</A>
        <DT><A HREF="https://two.example/">Two</A>
        <DT><A HREF="https://one.example/">One again</A>
    </DL><p>
</DL><p>
"#;

#[tokio::test]
async fn html_bookmarks_into_target_folder() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "bookmarks.html", BOOKMARKS_HTML);

    let mut options = ImportOptions::new();
    options.set("folder", "From HTML");
    let run = run_import("HtmlBookmarks", &path, options).await;

    assert_eq!(run.result, OperationResult::Successful);
    assert_eq!(run.items.len(), 4);
    assert_eq!(
        run.items[0],
        ImportedItem::Folder {
            folder: vec!["From HTML".to_string()],
            title: "Reading".to_string()
        }
    );
    assert!(matches!(&run.items[1], ImportedItem::Bookmark { folder, .. }
        if folder == &vec!["From HTML".to_string(), "Reading".to_string()]));
    assert!(matches!(run.events[0], ExchangeEvent::Started { total: 4, .. }));
}

#[tokio::test]
async fn html_bookmarks_skip_duplicates_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "bookmarks.html", BOOKMARKS_HTML);

    let mut options = ImportOptions::new();
    options.set("allow_duplicates", false);
    let run = run_import("HtmlBookmarks", &path, options).await;

    assert_eq!(run.result, OperationResult::Successful);
    let urls: Vec<&str> = run.items.iter().filter_map(ImportedItem::url).collect();
    assert_eq!(urls, vec!["https://one.example/", "https://two.example/"]);
    // Skipped entries still count towards progress
    assert_eq!(amounts(&run.events).last(), Some(&4));
}

#[tokio::test]
async fn unknown_option_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "bookmarks.html", BOOKMARKS_HTML);

    let mut options = ImportOptions::new();
    options.set("colour", "blue");
    let run = run_import("HtmlBookmarks", &path, options).await;

    assert_eq!(run.result, OperationResult::Failed);
    assert!(run.items.is_empty());
    assert!(matches!(run.events.last(), Some(ExchangeEvent::Finished { summary: Some(s), .. })
        if s.contains("colour")));
}

#[tokio::test]
async fn opera_bookmarks_and_notes() {
    let dir = tempfile::tempdir().unwrap();
    let bookmarks = write_source(
        &dir,
        "bookmarks.adr",
        "Opera Hotlist version 2.0\n\n#URL\n\tNAME=Opera\n\tURL=https://www.opera.com/\n\n#URL\n\tNAME=Rust\n\tURL=https://www.rust-lang.org/\n",
    );
    let notes = write_source(
        &dir,
        "notes.adr",
        "Opera Hotlist version 2.0\n\n#NOTE\n\tNAME=buy milk\u{2}\u{2}and bread\n",
    );

    let run = run_import("OperaBookmarks", &bookmarks, ImportOptions::new()).await;
    assert_eq!(run.result, OperationResult::Successful);
    assert_eq!(run.items.len(), 2);
    assert_eq!(run.events[0].exchange_type(), ExchangeType::Bookmarks);

    let run = run_import("OperaNotes", &notes, ImportOptions::new()).await;
    assert_eq!(run.result, OperationResult::Successful);
    assert!(matches!(&run.items[..], [ImportedItem::Note { text, .. }] if text == "buy milk\nand bread"));
    assert_eq!(run.events[0].exchange_type(), ExchangeType::Notes);
}

#[tokio::test]
async fn search_engines_are_determinate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "search.ini",
        "[Search Engine 1]\nName=Web\nURL=https://search.example/?q=%s\n\n[Search Engine 2]\nName=Wiki\nURL=https://wiki.example/?s=%s\n",
    );

    let run = run_import("OperaSearchEngines", &path, ImportOptions::new()).await;
    assert_eq!(run.result, OperationResult::Successful);
    assert_eq!(run.items.len(), 2);
    assert!(matches!(run.events[0], ExchangeEvent::Started { total: 2, .. }));
    assert_eq!(amounts(&run.events), vec![0, 1, 2, 2]);
}

#[tokio::test]
async fn session_import_stays_indeterminate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "autosave.win",
        "[session]\nwindow count=1\n\n[1]\ntype=0\n\n[2]\nparent=1\n\n[2 history url]\n1=https://tab.example/\n",
    );

    let run = run_import("OperaSession", &path, ImportOptions::new()).await;
    assert_eq!(run.result, OperationResult::Successful);
    assert_eq!(run.items.len(), 1);
    assert!(run.events.iter().all(|e| e.total() == 0));
    assert!(amounts(&run.events).iter().all(|a| *a == 0));
}

#[tokio::test]
async fn opml_cancelled_before_first_feed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "feeds.opml",
        "<opml><body><outline text=\"a\" xmlUrl=\"https://a.example/feed\"/><outline text=\"b\" xmlUrl=\"https://b.example/feed\"/></body></opml>",
    );

    let registry = ImporterRegistry::with_builtin_importers();
    let sink = Arc::new(MemorySink::new());
    let mut session = ImportSession::new(registry.resolve("OpmlFeeds").unwrap()).with_sink(sink.clone());
    let mut events = session.subscribe().unwrap();
    session.start(ImportCommand::new(&path)).unwrap();
    session.cancel().unwrap();

    let events = collect_events(&mut events).await;
    assert_eq!(session.wait().await.unwrap(), OperationResult::Cancelled);
    assert!(sink.is_empty());
    assert!(matches!(events.last(), Some(ExchangeEvent::Finished { result: OperationResult::Cancelled, .. })));
}

#[tokio::test]
async fn non_cancellable_importer_backs_out_before_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "search.ini", "[Search Engine 1]\nName=Web\nURL=https://s.example/?q=%s\n");

    let registry = ImporterRegistry::with_builtin_importers();
    let sink = Arc::new(MemorySink::new());
    let mut session = ImportSession::new(registry.resolve("OperaSearchEngines").unwrap()).with_sink(sink.clone());
    session.start(ImportCommand::new(&path)).unwrap();
    session.cancel().unwrap();

    assert_eq!(session.wait().await.unwrap(), OperationResult::Cancelled);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn output_that_cannot_be_flushed_fails_the_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "bookmarks.html", BOOKMARKS_HTML);

    let registry = ImporterRegistry::with_builtin_importers();
    let mut session = ImportSession::new(registry.resolve("HtmlBookmarks").unwrap())
        .with_sink(Arc::new(FlushFailsSink));
    let mut events = session.subscribe().unwrap();
    session.start(ImportCommand::new(&path)).unwrap();

    let events = collect_events(&mut events).await;
    assert_eq!(session.wait().await.unwrap(), OperationResult::Failed);
    assert!(matches!(events.last(), Some(ExchangeEvent::Finished { result: OperationResult::Failed, summary: Some(s), .. })
        if s.contains("disk full on flush")));
    // Every entry was handed over before the flush
    assert_eq!(amounts(&events).last(), Some(&4));
}
