//! Import session
//!
//! Owns one importer for one run and mediates between the caller (commands:
//! `start`, `cancel`) and the importer (events: `Started`, `Progress`,
//! `Finished`).
//!
//! # Phases
//! IDLE → RUNNING → TERMINAL(result), never backwards. `start` is valid only
//! while idle; `cancel` is valid while running and a no-op once terminal.
//! Cancelling never changes the phase by itself: the session turns terminal
//! only when the importer's own `Finished` arrives, and the result the
//! importer reports is kept as-is.
//!
//! # Timeouts
//! None built in. An importer that never finishes leaves the session running;
//! wrap [`ImportSession::wait`] in `tokio::time::timeout` for bounded waits.

mod event_bridge;

use crate::error::{ImportError, ImportResult};
use crate::importer::{DiscardSink, ExchangeEmitter, ImportContext, ImportSink, Importer};
use crate::models::{ImportCommand, ImporterDescriptor, Phase, SessionStatus};
use impex_common::{ExchangeEvent, ExchangeType, OperationResult, ProgressSnapshot};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Ordered event stream of one session (single subscriber)
///
/// Yields `Started`, a baseline `Progress(total, 0)`, the importer's
/// progress ticks, a final `Progress(total, total)` and `Finished`, then ends.
#[derive(Debug)]
pub struct SessionEvents {
    rx: mpsc::UnboundedReceiver<ExchangeEvent>,
}

impl SessionEvents {
    /// Next event, or `None` once the session has finished (or was dropped)
    pub async fn recv(&mut self) -> Option<ExchangeEvent> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`SessionEvents::recv`]
    pub fn try_recv(&mut self) -> Option<ExchangeEvent> {
        self.rx.try_recv().ok()
    }
}

/// One import run
pub struct ImportSession {
    id: Uuid,
    descriptor: ImporterDescriptor,
    exchange_type: ExchangeType,
    importer: Option<Box<dyn Importer>>,
    sink: Arc<dyn ImportSink>,
    status: Arc<watch::Sender<SessionStatus>>,
    cancel_token: CancellationToken,
    observer: Option<mpsc::UnboundedSender<ExchangeEvent>>,
    subscribed: bool,
    tasks: Vec<JoinHandle<()>>,
}

impl ImportSession {
    /// Wrap a freshly resolved importer; the session takes exclusive ownership
    pub fn new(importer: Box<dyn Importer>) -> Self {
        let id = Uuid::new_v4();
        let descriptor = importer.descriptor();
        let exchange_type = importer.exchange_type();
        let (status, _) = watch::channel(SessionStatus::new(id));

        debug!(session_id = %id, importer = %descriptor.identifier, "Import session created");

        Self {
            id,
            descriptor,
            exchange_type,
            importer: Some(importer),
            sink: Arc::new(DiscardSink),
            status: Arc::new(status),
            cancel_token: CancellationToken::new(),
            observer: None,
            subscribed: false,
            tasks: Vec::new(),
        }
    }

    /// Destination for imported entries (defaults to discarding them)
    pub fn with_sink(mut self, sink: Arc<dyn ImportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn descriptor(&self) -> &ImporterDescriptor {
        &self.descriptor
    }

    pub fn exchange_type(&self) -> ExchangeType {
        self.exchange_type
    }

    /// Register the single observer
    ///
    /// Only allowed once, before `start`.
    pub fn subscribe(&mut self) -> ImportResult<SessionEvents> {
        let phase = self.phase();
        if phase != Phase::Idle || self.subscribed {
            return Err(ImportError::invalid_state("subscribe", phase));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.observer = Some(tx);
        self.subscribed = true;
        Ok(SessionEvents { rx })
    }

    /// Begin the run
    ///
    /// Valid only from IDLE; otherwise fails with `InvalidState` and changes
    /// nothing. Must be called from within a tokio runtime.
    pub fn start(&mut self, command: ImportCommand) -> ImportResult<()> {
        let phase = self.phase();
        if phase != Phase::Idle {
            return Err(ImportError::invalid_state("start", phase));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ImportError::invalid_state("start outside a tokio runtime", phase))?;
        let Some(importer) = self.importer.take() else {
            return Err(ImportError::invalid_state("start", phase));
        };

        let can_cancel = importer.can_cancel();
        let mut transition = None;
        self.status.send_modify(|s| {
            s.can_cancel = Some(can_cancel);
            transition = Some(s.transition_to(Phase::Running));
        });
        if let Some(Err(e)) = transition {
            return Err(e);
        }

        info!(
            session_id = %self.id,
            format = %self.descriptor.identifier,
            source = %command.source_path.display(),
            can_cancel,
            "Import session started"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let emitter = ExchangeEmitter::new(self.exchange_type, tx);
        let ctx = ImportContext::new(emitter, self.cancel_token.clone(), Arc::clone(&self.sink));

        let bridge = runtime.spawn(event_bridge::bridge_exchange_events(
            rx,
            Arc::clone(&self.status),
            self.observer.take(),
            self.id,
        ));
        let driver = runtime.spawn(event_bridge::drive_importer(importer, command, ctx, self.id));
        self.tasks = vec![bridge, driver];

        Ok(())
    }

    /// Ask the importer to stop
    ///
    /// - IDLE: `InvalidState`
    /// - RUNNING: request forwarded; the phase stays RUNNING until the
    ///   importer reports `Finished`
    /// - TERMINAL: no-op, no events
    pub fn cancel(&self) -> ImportResult<()> {
        match self.phase() {
            Phase::Idle => Err(ImportError::invalid_state("cancel", Phase::Idle)),
            Phase::Running => {
                self.cancel_token.cancel();
                self.status.send_modify(|s| {
                    if !s.is_terminal() {
                        s.cancel_requested = true;
                    }
                });
                info!(session_id = %self.id, "Cancellation requested");
                Ok(())
            }
            Phase::Terminal(result) => {
                debug!(session_id = %self.id, ?result, "Cancel after finish ignored");
                Ok(())
            }
        }
    }

    /// Wait for the terminal result
    pub async fn wait(&self) -> ImportResult<OperationResult> {
        let mut rx = self.status.subscribe();
        let phase = self.phase();
        if phase == Phase::Idle {
            return Err(ImportError::invalid_state("wait", phase));
        }

        let terminal = rx
            .wait_for(|s| s.is_terminal())
            .await
            .map(|s| s.phase.result())
            .map_err(|_| ImportError::invalid_state("wait", self.phase()))?;

        terminal.ok_or_else(|| ImportError::invalid_state("wait", self.phase()))
    }

    pub fn phase(&self) -> Phase {
        self.status.borrow().phase
    }

    /// Latest progress snapshot (None before `Started`)
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.status.borrow().progress
    }

    /// Full status copy
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// `can_cancel()` of the importer as queried at start (None while idle)
    pub fn can_cancel(&self) -> Option<bool> {
        self.status.borrow().can_cancel
    }

    /// Importer's summary for a failed run
    pub fn failure_summary(&self) -> Option<String> {
        self.status.borrow().failure_summary.clone()
    }
}

impl Drop for ImportSession {
    fn drop(&mut self) {
        if self.phase() == Phase::Running {
            debug!(session_id = %self.id, "Dropping running session, cancelling importer");
            self.cancel_token.cancel();
            for task in &self.tasks {
                task.abort();
            }
        }
    }
}
