//! # impex common library
//!
//! Shared code for the impex crates:
//! - Exchange event model (`ExchangeEvent`, `OperationResult`, `ProgressSnapshot`)
//! - Common error type
//! - TOML configuration loading

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{ExchangeEvent, ExchangeType, OperationResult, ProgressDisplay, ProgressSnapshot};
