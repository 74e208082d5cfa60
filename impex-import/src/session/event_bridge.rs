//! Importer execution and event bridging for one session
//!
//! Two tasks per run:
//! - the driver runs `Importer::import_data` and converts errors and panics
//!   into `Finished(Failed)`
//! - the bridge reads the importer's events in order, updates the session
//!   status and forwards them to the single observer
//!
//! The bridge is the only writer to the observer channel, so observers see
//! events strictly in emission order and never concurrently.

use crate::importer::{EventReceiver, ImportContext, Importer};
use crate::models::{ImportCommand, Phase, SessionStatus};
use futures::FutureExt;
use impex_common::{ExchangeEvent, ProgressSnapshot};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Run the importer to completion, guaranteeing a `Finished` event
pub(crate) async fn drive_importer(
    mut importer: Box<dyn Importer>,
    command: ImportCommand,
    ctx: ImportContext,
    session_id: Uuid,
) {
    let emitter = ctx.emitter().clone();

    // The emitter flushes the sink as part of whichever Finished goes out
    let outcome = AssertUnwindSafe(importer.import_data(command, ctx))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {
            if !emitter.is_finished() {
                warn!(session_id = %session_id, "Importer returned without reporting a result");
                emitter.failed("Importer stopped without reporting a result");
            }
        }
        Ok(Err(e)) => {
            error!(session_id = %session_id, error = %format!("{:#}", e), "Importer failed");
            emitter.failed(format!("{:#}", e));
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(session_id = %session_id, panic = %message, "Importer panicked");
            emitter.failed(format!("Importer crashed: {}", message));
        }
    }

    // Importer released here, at the end of the run
    drop(importer);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Forward importer events to the observer, keeping the status current
pub(crate) async fn bridge_exchange_events(
    mut importer_rx: EventReceiver,
    status: Arc<watch::Sender<SessionStatus>>,
    mut observer: Option<mpsc::UnboundedSender<ExchangeEvent>>,
    session_id: Uuid,
) {
    debug!(session_id = %session_id, "Event bridge started");
    let mut last_amount = 0u64;

    while let Some(event) = importer_rx.recv().await {
        debug!(session_id = %session_id, ?event, "Bridge: importer event");

        match event {
            ExchangeEvent::Started {
                exchange_type,
                total,
            } => {
                status.send_modify(|s| {
                    s.update_progress(ProgressSnapshot::new(exchange_type, total, 0))
                });
                forward(&mut observer, event, session_id);
                // Baseline so observers always see progress before the first tick
                forward(
                    &mut observer,
                    ExchangeEvent::Progress {
                        exchange_type,
                        total,
                        amount: 0,
                    },
                    session_id,
                );
            }

            ExchangeEvent::Progress {
                exchange_type,
                total,
                amount,
            } => {
                last_amount = last_amount.max(amount);
                status.send_modify(|s| {
                    s.update_progress(ProgressSnapshot::new(exchange_type, total, amount))
                });
                forward(&mut observer, event, session_id);
            }

            ExchangeEvent::Finished {
                exchange_type,
                result,
                total,
                ref summary,
            } => {
                let total = total.max(last_amount);
                let mut transition = None;
                status.send_modify(|s| {
                    s.update_progress(ProgressSnapshot::new(exchange_type, total, total));
                    s.failure_summary = summary.clone();
                    transition = Some(s.transition_to(Phase::Terminal(result)));
                });

                match transition {
                    Some(Ok(t)) => info!(
                        session_id = %session_id,
                        old_phase = %t.old_phase,
                        new_phase = %t.new_phase,
                        total,
                        "Import session finished"
                    ),
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, error = %e, "Terminal transition rejected")
                    }
                    None => {}
                }

                // Indicator reaches completion before the outcome is shown
                forward(
                    &mut observer,
                    ExchangeEvent::Progress {
                        exchange_type,
                        total,
                        amount: total,
                    },
                    session_id,
                );
                forward(&mut observer, event, session_id);

                // Unsubscribe: the observer's stream ends after Finished
                observer = None;
                break;
            }
        }
    }

    drop(observer);
    debug!(session_id = %session_id, "Event bridge stopped");
}

fn forward(
    observer: &mut Option<mpsc::UnboundedSender<ExchangeEvent>>,
    event: ExchangeEvent,
    session_id: Uuid,
) {
    if let Some(tx) = observer {
        if tx.send(event).is_err() {
            debug!(session_id = %session_id, "Observer went away, no longer forwarding");
            *observer = None;
        }
    }
}
