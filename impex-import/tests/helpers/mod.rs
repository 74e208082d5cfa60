//! Test Helper Utilities
//!
//! Scripted importer for driving sessions through exact event sequences,
//! plus small collectors for session event streams.

#![allow(dead_code)]

use async_trait::async_trait;
use impex_common::{ExchangeEvent, ExchangeType, OperationResult};
use impex_import::{
    FileFilter, ImportCommand, ImportContext, ImportSession, ImportSink, ImportedItem, Importer,
    ImporterDescriptor, SessionEvents,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// One scripted importer action
#[derive(Clone)]
pub enum Step {
    Started(u64),
    Progress(u64, u64),
    Finished(OperationResult, u64),
    Cancelled,
    /// Block until the session's cancel request arrives
    WaitForCancel,
    /// Block until the test releases the gate
    Gate(Arc<Notify>),
    Fail(String),
    Panic(String),
    /// Return `Ok(())` immediately
    Return,
}

pub struct ScriptedImporter {
    steps: Vec<Step>,
    can_cancel: bool,
    exchange_type: ExchangeType,
    dropped: Arc<AtomicBool>,
}

impl ScriptedImporter {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            can_cancel: true,
            exchange_type: ExchangeType::Bookmarks,
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn not_cancellable(mut self) -> Self {
        self.can_cancel = false;
        self
    }

    /// Flag set once the importer has been dropped
    pub fn drop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dropped)
    }

    pub fn boxed(self) -> Box<dyn Importer> {
        Box::new(self)
    }
}

impl Drop for ScriptedImporter {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Importer for ScriptedImporter {
    fn descriptor(&self) -> ImporterDescriptor {
        ImporterDescriptor {
            identifier: "Scripted".to_string(),
            title: "Scripted importer".to_string(),
            suggested_path: PathBuf::from("/dev/null"),
            file_filters: vec![FileFilter::new("All files", ["*"])],
            has_options: false,
        }
    }

    fn exchange_type(&self) -> ExchangeType {
        self.exchange_type
    }

    fn can_cancel(&self) -> bool {
        self.can_cancel
    }

    async fn import_data(&mut self, _command: ImportCommand, ctx: ImportContext) -> anyhow::Result<()> {
        for step in self.steps.clone() {
            let emitter = ctx.emitter();
            match step {
                Step::Started(total) => emitter.started(total),
                Step::Progress(total, amount) => emitter.progress(total, amount),
                Step::Finished(result, total) => emitter.finished(result, total),
                Step::Cancelled => emitter.cancelled(),
                Step::WaitForCancel => ctx.cancellation().cancelled().await,
                Step::Gate(gate) => gate.notified().await,
                Step::Fail(message) => anyhow::bail!(message),
                Step::Panic(message) => panic!("{}", message),
                Step::Return => return Ok(()),
            }
        }
        Ok(())
    }
}

/// Sink that accepts entries but cannot write them out
#[derive(Debug, Default)]
pub struct FlushFailsSink;

impl ImportSink for FlushFailsSink {
    fn accept(&self, _item: ImportedItem) -> anyhow::Result<()> {
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        anyhow::bail!("disk full on flush")
    }
}

/// Drain a session's events until the stream ends (bounded by a timeout)
pub async fn collect_events(events: &mut SessionEvents) -> Vec<ExchangeEvent> {
    let mut collected = Vec::new();
    let drain = async {
        while let Some(event) = events.recv().await {
            collected.push(event);
        }
    };
    tokio::time::timeout(Duration::from_secs(5), drain)
        .await
        .expect("event stream did not end");
    collected
}

/// Receive events until one matches, returning everything seen so far
pub async fn recv_until(
    events: &mut SessionEvents,
    mut predicate: impl FnMut(&ExchangeEvent) -> bool,
) -> Vec<ExchangeEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream ended early");
        let done = predicate(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

/// Start a subscribed session and return it with its event stream
pub fn start_subscribed(importer: Box<dyn Importer>) -> (ImportSession, SessionEvents) {
    let mut session = ImportSession::new(importer);
    let events = session.subscribe().expect("subscribe");
    session
        .start(ImportCommand::new("/dev/null"))
        .expect("start");
    (session, events)
}

/// Progress amounts in arrival order
pub fn amounts(events: &[ExchangeEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            ExchangeEvent::Progress { amount, .. } => Some(*amount),
            _ => None,
        })
        .collect()
}

/// Poll a flag until it is set (bounded)
pub async fn wait_for_flag(flag: &AtomicBool) -> bool {
    for _ in 0..200 {
        if flag.load(Ordering::SeqCst) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    flag.load(Ordering::SeqCst)
}
