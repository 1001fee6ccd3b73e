//! The settings file and its validation.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

use workmirror_core::sync::{DEFAULT_CHUNK_SIZE, DEFAULT_PAGE_SIZE, MAX_CHUNK_SIZE};
use workmirror_core::{AccessToken, ApiBase, Collection, Credential};
use workmirror_remote::DEFAULT_TIMEOUT;

/// Everything the binary is configured with, built once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub api_base: ApiBase,
    pub poll_interval_secs: u64,
    pub store_path: Option<PathBuf>,
    pub page_size: u32,
    pub chunk_size: usize,
    pub concurrent_sources: bool,
    pub request_timeout_secs: u64,
    pub sources: Vec<SourceSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: ApiBase::default(),
            poll_interval_secs: 300,
            store_path: None,
            page_size: DEFAULT_PAGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrent_sources: false,
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            sources: Vec::new(),
        }
    }
}

/// One tracked upstream source as written in the settings file.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSettings {
    pub name: String,
    pub organization: String,
    pub project: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Environment variable holding the token.
    #[serde(default)]
    pub access_token_env: Option<String>,
    pub item_type: String,
    #[serde(default)]
    pub states: Option<Vec<String>>,
    pub collection: Collection,
}

impl fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSettings")
            .field("name", &self.name)
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("access_token_env", &self.access_token_env)
            .field("item_type", &self.item_type)
            .field("states", &self.states)
            .field("collection", &self.collection)
            .finish()
    }
}

/// A source with its token looked up, ready to wire.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub name: String,
    pub credential: Credential,
    pub item_type: String,
    pub states: Vec<String>,
    pub collection: Collection,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check the settings needed to sync and resolve every source's token.
    ///
    /// `lookup` reads an environment variable; it is a parameter so tests
    /// need not touch the process environment.
    pub fn resolve_sources<F>(&self, lookup: F) -> Result<Vec<ResolvedSource>>
    where
        F: Fn(&str) -> Option<String>,
    {
        ensure!(!self.sources.is_empty(), "No sources configured");
        ensure!(self.page_size > 0, "page_size must be greater than 0");
        ensure!(
            (1..=MAX_CHUNK_SIZE).contains(&self.chunk_size),
            "chunk_size must be between 1 and {}",
            MAX_CHUNK_SIZE
        );
        ensure!(
            self.poll_interval_secs > 0,
            "poll_interval_secs must be greater than 0"
        );
        ensure!(
            self.request_timeout_secs > 0,
            "request_timeout_secs must be greater than 0"
        );

        let mut names = HashSet::new();
        self.sources
            .iter()
            .map(|source| {
                ensure!(
                    names.insert(source.name.as_str()),
                    "Duplicate source name '{}'",
                    source.name
                );
                source.resolve(&lookup)
            })
            .collect()
    }
}

impl SourceSettings {
    fn resolve<F>(&self, lookup: &F) -> Result<ResolvedSource>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = match (&self.access_token, &self.access_token_env) {
            (Some(_), Some(_)) => bail!(
                "Source '{}': set either access_token or access_token_env, not both",
                self.name
            ),
            (Some(token), None) => token.clone(),
            (None, Some(var)) => lookup(var.as_str()).with_context(|| {
                format!(
                    "Source '{}': environment variable {} is not set",
                    self.name, var
                )
            })?,
            (None, None) => bail!("Source '{}': no access token configured", self.name),
        };
        ensure!(
            !token.trim().is_empty(),
            "Source '{}': access token is empty",
            self.name
        );

        Ok(ResolvedSource {
            name: self.name.clone(),
            credential: Credential::new(
                self.organization.as_str(),
                self.project.as_str(),
                AccessToken::new(token),
            ),
            item_type: self.item_type.clone(),
            states: self.states.clone().unwrap_or_default(),
            collection: self.collection.clone(),
        })
    }
}
