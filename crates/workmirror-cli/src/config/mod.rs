//! Settings loading.

mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

pub use settings::{ResolvedSource, Settings, SourceSettings};

use crate::cli::GlobalArgs;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "workmirror").context("Could not determine home directory")
}

/// `config.json` in the platform config directory.
fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.json"))
}

/// `store` in the platform data directory.
pub fn default_store_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("store"))
}

/// Build settings from the settings file and CLI/env overrides.
///
/// An explicit `--config` must exist. The default location is optional, so
/// `list` and `get` work with just `--store`.
pub fn load(args: &GlobalArgs) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => {
            let path = default_config_path()?;
            if path.exists() {
                Settings::from_file(&path)?
            } else {
                Settings::default()
            }
        }
    };

    if let Some(store) = &args.store {
        settings.store_path = Some(store.clone());
    }

    Ok(settings)
}
