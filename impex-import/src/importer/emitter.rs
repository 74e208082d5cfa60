//! Contract-enforcing event emitter handed to importers
//!
//! Guarantees the grammar `Started, Progress*, Finished` on the channel to
//! the session no matter how the importer calls it:
//! - a missing `Started` is synthesized before the first other event
//! - `amount` never decreases; a total revised below it is raised to match
//! - the attached sink is flushed right before `Finished`, and a failed flush
//!   turns a successful run into `Failed`
//! - nothing is sent after `Finished`

use super::ImportSink;
use impex_common::{ExchangeEvent, ExchangeType, OperationResult};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::warn;

/// Raw importer → session channel
pub(crate) type EventSender = mpsc::UnboundedSender<ExchangeEvent>;
pub(crate) type EventReceiver = mpsc::UnboundedReceiver<ExchangeEvent>;

struct EmitterState {
    /// Dropped after `Finished` so the session sees the channel close
    tx: Option<EventSender>,
    /// Flushed once, right before `Finished`
    sink: Option<Arc<dyn ImportSink>>,
    started: bool,
    total: u64,
    amount: u64,
}

/// Clone-able event emitter for one run
#[derive(Clone)]
pub struct ExchangeEmitter {
    exchange_type: ExchangeType,
    state: Arc<Mutex<EmitterState>>,
}

impl ExchangeEmitter {
    pub(crate) fn new(exchange_type: ExchangeType, tx: EventSender) -> Self {
        Self {
            exchange_type,
            state: Arc::new(Mutex::new(EmitterState {
                tx: Some(tx),
                sink: None,
                started: false,
                total: 0,
                amount: 0,
            })),
        }
    }

    /// Create an emitter plus the receiving end (for driving importers directly)
    pub fn channel(exchange_type: ExchangeType) -> (Self, mpsc::UnboundedReceiver<ExchangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(exchange_type, tx), rx)
    }

    pub fn exchange_type(&self) -> ExchangeType {
        self.exchange_type
    }

    /// Sink to flush before `Finished` is sent
    pub(crate) fn attach_sink(&self, sink: Arc<dyn ImportSink>) {
        self.lock().sink = Some(sink);
    }

    fn lock(&self) -> MutexGuard<'_, EmitterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Announce the start of work (`total == 0` = indeterminate)
    pub fn started(&self, total: u64) {
        let mut state = self.lock();
        if state.tx.is_none() {
            warn!(exchange_type = %self.exchange_type, "Started emitted after Finished, dropped");
            return;
        }
        if state.started {
            warn!(exchange_type = %self.exchange_type, "Duplicate Started ignored");
            return;
        }
        self.send_started(&mut state, total);
    }

    /// Report progress
    pub fn progress(&self, total: u64, amount: u64) {
        let mut state = self.lock();
        if state.tx.is_none() {
            warn!(exchange_type = %self.exchange_type, "Progress emitted after Finished, dropped");
            return;
        }
        if !state.started {
            self.send_started(&mut state, total);
        }

        let mut total = total;
        let mut amount = amount;
        if amount < state.amount {
            warn!(
                exchange_type = %self.exchange_type,
                amount,
                previous = state.amount,
                "Decreasing progress amount clamped"
            );
            amount = state.amount;
        }
        if total > 0 && amount > total {
            if state.amount > total {
                warn!(
                    exchange_type = %self.exchange_type,
                    total,
                    amount = state.amount,
                    "Total revised below reported progress, raised"
                );
                total = state.amount;
            } else {
                amount = total;
            }
        }

        state.total = total;
        state.amount = amount;
        Self::send(
            &state,
            ExchangeEvent::Progress {
                exchange_type: self.exchange_type,
                total,
                amount,
            },
        );
    }

    /// Report the terminal result; every later call is a no-op
    pub fn finished(&self, result: OperationResult, total: u64) {
        self.finish_with(result, total, None);
    }

    /// Report failure with a human-readable summary
    pub fn failed(&self, summary: impl Into<String>) {
        let total = self.lock().total;
        self.finish_with(OperationResult::Failed, total, Some(summary.into()));
    }

    /// Report that the run honoured a cancellation request
    pub fn cancelled(&self) {
        let total = self.lock().total;
        self.finish_with(OperationResult::Cancelled, total, None);
    }

    /// Whether `Finished` has already been emitted
    pub fn is_finished(&self) -> bool {
        self.lock().tx.is_none()
    }

    fn finish_with(&self, result: OperationResult, total: u64, summary: Option<String>) {
        let mut state = self.lock();
        if state.tx.is_none() {
            warn!(exchange_type = %self.exchange_type, ?result, "Second Finished ignored");
            return;
        }
        if !state.started {
            self.send_started(&mut state, total);
        }

        let mut result = result;
        let mut summary = summary;
        if let Some(sink) = state.sink.take() {
            if let Err(e) = sink.flush() {
                if result == OperationResult::Successful {
                    result = OperationResult::Failed;
                    summary = Some(format!("{:#}", e));
                } else {
                    warn!(
                        exchange_type = %self.exchange_type,
                        ?result,
                        error = %format!("{:#}", e),
                        "Sink flush failed"
                    );
                }
            }
        }

        let total = if total < state.amount {
            warn!(
                exchange_type = %self.exchange_type,
                total,
                amount = state.amount,
                "Final total below reported progress, raised"
            );
            state.amount
        } else {
            total
        };

        Self::send(
            &state,
            ExchangeEvent::Finished {
                exchange_type: self.exchange_type,
                result,
                total,
                summary,
            },
        );
        state.tx = None;
    }

    fn send_started(&self, state: &mut EmitterState, total: u64) {
        state.started = true;
        state.total = total;
        state.amount = 0;
        Self::send(
            state,
            ExchangeEvent::Started {
                exchange_type: self.exchange_type,
                total,
            },
        );
    }

    fn send(state: &EmitterState, event: ExchangeEvent) {
        if let Some(tx) = &state.tx {
            // Receiver gone means the session was dropped; nothing to report to
            let _ = tx.send(event);
        }
    }
}

impl fmt::Debug for ExchangeEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ExchangeEmitter")
            .field("exchange_type", &self.exchange_type)
            .field("started", &state.started)
            .field("finished", &state.tx.is_none())
            .field("total", &state.total)
            .field("amount", &state.amount)
            .finish()
    }
}
