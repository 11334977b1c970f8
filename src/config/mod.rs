//! Configuration management for vlmweave
//!
//! Values come from, in increasing precedence: built-in defaults, the TOML
//! file at `~/.config/vlmweave/config.toml`, `VLMWEAVE_*` environment
//! variables, and CLI flags (applied by the command handlers).

pub mod env;
mod io;
mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analyzer::{InjectionTimeouts, SessionOptions, WorkerConfig};
use crate::document::ParserOptions;
use crate::provider::{ProviderSettings, RetryPolicy, DEFAULT_PROMPT};

/// Placeholder shown instead of a configured API key.
pub const REDACTED: &str = "<redacted>";

impl Config {
    /// Get the config file path (~/.config/vlmweave/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        io::config_path()
    }

    /// Get the config directory path (~/.config/vlmweave)
    pub fn config_dir() -> Result<PathBuf> {
        io::config_dir()
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        io::load()
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        io::load_from(path)
    }

    /// Load the file, then apply environment overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        env::apply_process_env(&mut config);
        Ok(config)
    }

    /// Save configuration to file, returning the path written
    pub fn save(&self) -> Result<PathBuf> {
        io::save(self)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        io::save_to(self, path)
    }

    /// Copy of the configuration safe to print.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.provider.api_key.is_some() {
            config.provider.api_key = Some(REDACTED.to_string());
        }
        config
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        let provider = &self.provider;
        ProviderSettings {
            kind: provider.kind,
            api_key: provider.api_key.clone(),
            endpoint: provider.endpoint.clone(),
            model: provider.model.clone(),
            prompt: provider
                .prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            timeout: Duration::from_secs(provider.timeout_secs),
            max_image_bytes: provider.max_image_bytes,
            insecure_tls_fallback: provider.insecure_tls_fallback,
            retry: RetryPolicy::default(),
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            user_override: self.pool.threads,
            queue_capacity: self.pool.queue_capacity,
            ..Default::default()
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            timeouts: InjectionTimeouts {
                reference: Duration::from_secs(self.injection.reference_timeout_secs),
                drain: Duration::from_secs(self.injection.drain_timeout_secs),
            },
            ..Default::default()
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            inline: self.injection.inline,
        }
    }
}
