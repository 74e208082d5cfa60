//! Importer contract
//!
//! Every format-specific importer implements [`Importer`]. The session runs
//! `import_data` on its own tokio task and hands it an [`ImportContext`]
//! carrying the event emitter, the cancellation request and the entry sink.

mod emitter;
mod sink;

pub use emitter::ExchangeEmitter;
pub(crate) use emitter::EventReceiver;
pub use sink::{DiscardSink, ImportSink, JsonLinesSink, MemorySink};

use crate::models::{FileFilter, ImportCommand, ImportOptions, ImporterDescriptor};
use async_trait::async_trait;
use impex_common::ExchangeType;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Format-specific importer
///
/// # Event contract
/// Over one run the importer emits through `ctx.emitter()` exactly one
/// `Started`, any number of `Progress` with non-decreasing amount, then one
/// `Finished`. Returning `Err` or panicking is reported as `Finished(Failed)`
/// by the session; so is returning `Ok(())` without finishing.
///
/// # Cancellation
/// A cancel request arrives as `ctx.is_cancelled()`. Importers that can
/// cancel cooperatively check it between entries and report `Cancelled`.
/// Importers that cannot still observe it, but may finish their current
/// atomic unit and report whatever actually happened.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Presentation data, available before running
    fn descriptor(&self) -> ImporterDescriptor;

    /// Kind of data this importer brings in
    fn exchange_type(&self) -> ExchangeType;

    /// Whether a cancel affordance should be offered while running
    fn can_cancel(&self) -> bool;

    /// Initial options shown to the user (empty when `has_options()` is false)
    fn default_options(&self) -> ImportOptions {
        ImportOptions::default()
    }

    /// Execute the import
    async fn import_data(&mut self, command: ImportCommand, ctx: ImportContext) -> anyhow::Result<()>;

    fn title(&self) -> String {
        self.descriptor().title
    }

    fn suggested_path(&self) -> PathBuf {
        self.descriptor().suggested_path
    }

    fn file_filters(&self) -> Vec<FileFilter> {
        self.descriptor().file_filters
    }

    fn has_options(&self) -> bool {
        self.descriptor().has_options
    }
}

/// Run-time handles given to an importer
#[derive(Clone)]
pub struct ImportContext {
    emitter: ExchangeEmitter,
    cancel_token: CancellationToken,
    sink: Arc<dyn ImportSink>,
}

impl ImportContext {
    pub fn new(
        emitter: ExchangeEmitter,
        cancel_token: CancellationToken,
        sink: Arc<dyn ImportSink>,
    ) -> Self {
        emitter.attach_sink(Arc::clone(&sink));
        Self {
            emitter,
            cancel_token,
            sink,
        }
    }

    pub fn emitter(&self) -> &ExchangeEmitter {
        &self.emitter
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Token to await (`cancellation().cancelled().await`) inside long waits
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel_token
    }

    pub fn sink(&self) -> &Arc<dyn ImportSink> {
        &self.sink
    }
}
