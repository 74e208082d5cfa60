//! Importer registry
//!
//! Maps stable format identifiers to constructors. Identifiers are the only
//! "wire format" this crate exposes (menu entries and `impex import <FORMAT>`
//! refer to importers by them), so the built-in ones must not change.

use crate::error::{ImportError, ImportResult};
use crate::importer::Importer;
use crate::importers;
use crate::models::ImporterDescriptor;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Constructor producing a fresh, unconfigured importer
pub type ImporterConstructor = Arc<dyn Fn() -> Box<dyn Importer> + Send + Sync>;

/// Identifier → constructor mapping
#[derive(Clone, Default)]
pub struct ImporterRegistry {
    constructors: BTreeMap<String, ImporterConstructor>,
}

impl ImporterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format registered
    pub fn with_builtin_importers() -> Self {
        let mut registry = Self::new();
        importers::register_builtin(&mut registry);
        registry
    }

    /// Register a constructor under `identifier`
    ///
    /// Returns `true` if an existing registration was replaced. The same
    /// constructor may be registered under several identifiers.
    pub fn register<F>(&mut self, identifier: impl Into<String>, constructor: F) -> bool
    where
        F: Fn() -> Box<dyn Importer> + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        debug!(identifier = %identifier, "Registering importer");
        self.constructors
            .insert(identifier, Arc::new(constructor))
            .is_some()
    }

    /// Construct a fresh importer for `identifier`
    ///
    /// Unknown identifiers construct nothing and yield `UnknownFormat`.
    pub fn resolve(&self, identifier: &str) -> ImportResult<Box<dyn Importer>> {
        let constructor = self
            .constructors
            .get(identifier)
            .ok_or_else(|| ImportError::UnknownFormat(identifier.to_string()))?;
        Ok(constructor())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors.contains_key(identifier)
    }

    /// Registered identifiers in sorted order
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Descriptor of every registered importer, keyed by registry identifier
    pub fn descriptors(&self) -> Vec<(String, ImporterDescriptor)> {
        self.constructors
            .iter()
            .map(|(identifier, constructor)| (identifier.clone(), constructor().descriptor()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
