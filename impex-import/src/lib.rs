//! impex-import library interface
//!
//! Import orchestration: importer contract, format registry, per-run
//! session state machine, and the built-in importers.

pub mod config;
pub mod error;
pub mod importer;
pub mod importers;
pub mod models;
pub mod registry;
pub mod session;

pub use crate::error::{ImportError, ImportResult};
pub use crate::importer::{
    DiscardSink, ExchangeEmitter, ImportContext, ImportSink, Importer, JsonLinesSink, MemorySink,
};
pub use crate::models::{
    FileFilter, ImportCommand, ImportOptions, ImportedItem, ImporterDescriptor, Phase,
    SessionStatus,
};
pub use crate::registry::ImporterRegistry;
pub use crate::session::{ImportSession, SessionEvents};
