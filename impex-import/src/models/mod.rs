//! Data models for impex-import

pub mod command;
pub mod descriptor;
pub mod import_session;
pub mod imported_item;

pub use command::{ImportCommand, ImportOptions};
pub use descriptor::{FileFilter, ImporterDescriptor};
pub use import_session::{Phase, SessionStatus, StateTransition};
pub use imported_item::ImportedItem;
