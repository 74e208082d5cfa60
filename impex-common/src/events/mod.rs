//! Event types for the impex exchange protocol
//!
//! Every importer emits, over its lifetime, exactly:
//! one `Started`, zero or more `Progress` with non-decreasing `amount`,
//! then exactly one `Finished`.

// Sub-modules (supporting types)
mod exchange_types;
mod progress;

pub use exchange_types::{ExchangeType, OperationResult};
pub use progress::{ProgressDisplay, ProgressSnapshot};

use serde::{Deserialize, Serialize};

/// Exchange lifecycle events
///
/// Produced by importers, forwarded by the import session to its observer,
/// and serializable so front ends can stream them as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExchangeEvent {
    /// Work began
    ///
    /// `total == 0` announces an indeterminate run.
    Started {
        exchange_type: ExchangeType,
        total: u64,
    },

    /// Work advanced
    Progress {
        exchange_type: ExchangeType,
        /// Total units (0 = unknown)
        total: u64,
        /// Units completed so far
        amount: u64,
    },

    /// Work ended; no event follows this one
    Finished {
        exchange_type: ExchangeType,
        result: OperationResult,
        total: u64,
        /// Human-readable summary supplied by the importer (failures)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
}

impl ExchangeEvent {
    pub fn exchange_type(&self) -> ExchangeType {
        match self {
            ExchangeEvent::Started { exchange_type, .. }
            | ExchangeEvent::Progress { exchange_type, .. }
            | ExchangeEvent::Finished { exchange_type, .. } => *exchange_type,
        }
    }

    pub fn total(&self) -> u64 {
        match self {
            ExchangeEvent::Started { total, .. }
            | ExchangeEvent::Progress { total, .. }
            | ExchangeEvent::Finished { total, .. } => *total,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangeEvent::Finished { .. })
    }

    /// Progress snapshot implied by this event
    ///
    /// `Finished` implies a completed indicator (`amount == total`).
    pub fn snapshot(&self) -> ProgressSnapshot {
        match self {
            ExchangeEvent::Started {
                exchange_type,
                total,
            } => ProgressSnapshot::new(*exchange_type, *total, 0),
            ExchangeEvent::Progress {
                exchange_type,
                total,
                amount,
            } => ProgressSnapshot::new(*exchange_type, *total, *amount),
            ExchangeEvent::Finished {
                exchange_type,
                total,
                ..
            } => ProgressSnapshot::new(*exchange_type, *total, *total),
        }
    }
}
