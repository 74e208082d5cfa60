//! Error types for impex-import
//!
//! Only `UnknownFormat` (at resolve time) and `InvalidState` (at command time)
//! cross the session boundary as errors. Everything that goes wrong during a
//! run is reported as a `Finished(Failed)` event instead.

use crate::models::Phase;
use thiserror::Error;

/// Import orchestration error type
#[derive(Debug, Error)]
pub enum ImportError {
    /// Registry has no importer for this identifier
    #[error("Unknown import format: {0}")]
    UnknownFormat(String),

    /// Command issued in a phase that forbids it (contract violation, no side effect)
    #[error("Invalid state: cannot {operation} while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },

    /// Importer options could not be decoded
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl ImportError {
    pub(crate) fn invalid_state(operation: &'static str, phase: Phase) -> Self {
        ImportError::InvalidState { operation, phase }
    }
}

/// Result type for import orchestration calls
pub type ImportResult<T> = Result<T, ImportError>;
