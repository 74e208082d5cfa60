//! Per-run configuration resolution
//!
//! Source path priority:
//! 1. `--path` on the command line
//! 2. `opera_profile` from the config file, for importers whose suggested
//!    path lives in the default Opera profile
//! 3. The importer's suggested path
//!
//! Options are layered the same way: importer defaults, then the config
//! file's `[importers.<Id>]` table, then `--option key=value` pairs.

use crate::error::ImportResult;
use crate::importers::opera_profile_dir;
use crate::models::{ImportOptions, ImporterDescriptor};
use impex_common::config::TomlConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the file an import reads from
pub fn resolve_source_path(
    cli_path: Option<&Path>,
    config: &TomlConfig,
    descriptor: &ImporterDescriptor,
) -> PathBuf {
    if let Some(path) = cli_path {
        debug!(path = %path.display(), "Using source path from command line");
        return path.to_path_buf();
    }

    if let Some(profile) = &config.opera_profile {
        if let Ok(relative) = descriptor.suggested_path.strip_prefix(opera_profile_dir()) {
            let path = profile.join(relative);
            debug!(path = %path.display(), "Using configured Opera profile");
            return path;
        }
    }

    descriptor.suggested_path.clone()
}

/// Layer importer defaults, config file options and command-line assignments
pub fn resolve_options(
    defaults: ImportOptions,
    config: &TomlConfig,
    identifier: &str,
    assignments: &[String],
) -> ImportResult<ImportOptions> {
    let mut options = defaults;

    if let Some(table) = config.importer_options(identifier) {
        options.merge(ImportOptions::from_toml(table)?);
    }

    for assignment in assignments {
        let (key, value) = ImportOptions::parse_assignment(assignment)?;
        options.set(key, value);
    }

    Ok(options)
}
