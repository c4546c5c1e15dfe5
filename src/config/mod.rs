//! Configuration module
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use crate::error::Result;
use std::path::PathBuf;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "MAR_SETTINGS_PATH";

/// Locations searched for a settings file, in order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("mar-search.yml"),
        PathBuf::from("config/mar-search.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("mar-search/settings.yml"));
    }
    paths
}

/// Load settings from `explicit`, `MAR_SETTINGS_PATH` or the default paths,
/// falling back to defaults, then apply environment overrides and validate
///
/// An explicit path must exist; the others are skipped when missing.
pub fn load(explicit: Option<PathBuf>) -> Result<(Settings, Option<PathBuf>)> {
    let (mut settings, source) = match explicit {
        Some(path) => (Settings::from_file(&path)?, Some(path)),
        None => {
            let found = std::env::var(SETTINGS_PATH_VAR)
                .ok()
                .map(PathBuf::from)
                .into_iter()
                .chain(default_paths())
                .find(|path| path.exists());
            match found {
                Some(path) => (Settings::from_file(&path)?, Some(path)),
                None => (Settings::default(), None),
            }
        }
    };

    settings.merge_env();
    settings.validate()?;
    Ok((settings, source))
}
