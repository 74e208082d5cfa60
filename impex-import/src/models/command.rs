//! Import command and importer-owned options

use crate::error::{ImportError, ImportResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// One import request, consumed by `ImportSession::start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCommand {
    /// Source file chosen by the caller
    pub source_path: PathBuf,

    /// Importer-specific configuration
    #[serde(default)]
    pub options: ImportOptions,
}

impl ImportCommand {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }
}

/// Opaque options blob
///
/// The orchestration layer never interprets the keys; each importer decodes
/// them into its own typed options with [`ImportOptions::decode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportOptions(Map<String, Value>);

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a TOML table (config file `[importers.<Id>]` section)
    pub fn from_toml(table: &toml::Table) -> ImportResult<Self> {
        match serde_json::to_value(table) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => Err(ImportError::InvalidOptions(format!(
                "expected a table, got {}",
                other
            ))),
            Err(e) => Err(ImportError::InvalidOptions(e.to_string())),
        }
    }

    /// Encode typed options (e.g. an importer's defaults)
    pub fn encode<T: Serialize>(options: &T) -> ImportResult<Self> {
        match serde_json::to_value(options) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(ImportError::InvalidOptions(
                "options must serialize to an object".to_string(),
            )),
            Err(e) => Err(ImportError::InvalidOptions(e.to_string())),
        }
    }

    /// Parse a `key=value` assignment
    ///
    /// The value is read as a TOML literal (`true`, `3`, `"x"`); anything that
    /// is not a valid literal is kept as a plain string.
    pub fn parse_assignment(assignment: &str) -> ImportResult<(String, Value)> {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            ImportError::InvalidOptions(format!("expected key=value, got '{}'", assignment))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ImportError::InvalidOptions(format!(
                "empty option name in '{}'",
                assignment
            )));
        }

        let raw = raw.trim();
        let value = format!("v = {}", raw)
            .parse::<toml::Table>()
            .ok()
            .and_then(|mut table| table.remove("v"))
            .and_then(|v| serde_json::to_value(v).ok())
            .unwrap_or_else(|| Value::String(raw.to_string()));

        Ok((key.to_string(), value))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: ImportOptions) {
        self.0.extend(other.0);
    }

    /// Decode into the importer's typed options
    pub fn decode<T: DeserializeOwned>(&self) -> ImportResult<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ImportError::InvalidOptions(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default, deny_unknown_fields)]
    struct SampleOptions {
        folder: Option<String>,
        allow_duplicates: bool,
    }

    #[test]
    fn assignments_parse_toml_literals() {
        assert_eq!(
            ImportOptions::parse_assignment("allow_duplicates=true").unwrap(),
            ("allow_duplicates".to_string(), Value::Bool(true))
        );
        assert_eq!(
            ImportOptions::parse_assignment("folder = Imported stuff").unwrap(),
            ("folder".to_string(), Value::String("Imported stuff".to_string()))
        );
        assert_eq!(
            ImportOptions::parse_assignment("folder=\"Quoted\"").unwrap().1,
            Value::String("Quoted".to_string())
        );
        assert!(ImportOptions::parse_assignment("no-equals").is_err());
        assert!(ImportOptions::parse_assignment("=x").is_err());
    }

    #[test]
    fn merge_overrides_and_decode_validates() {
        let mut table = toml::Table::new();
        table.insert("folder".into(), toml::Value::String("From config".into()));
        table.insert("allow_duplicates".into(), toml::Value::Boolean(false));

        let mut options = ImportOptions::from_toml(&table).unwrap();
        let mut overrides = ImportOptions::new();
        overrides.set("allow_duplicates", true);
        options.merge(overrides);

        let decoded: SampleOptions = options.decode().unwrap();
        assert_eq!(
            decoded,
            SampleOptions {
                folder: Some("From config".to_string()),
                allow_duplicates: true,
            }
        );

        options.set("bogus", 1);
        let err = options.decode::<SampleOptions>().unwrap_err();
        assert!(matches!(err, ImportError::InvalidOptions(_)));
    }
}
