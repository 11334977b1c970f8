//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

use crate::analyzer::worker::DEFAULT_QUEUE_CAPACITY;
use crate::provider::{ProviderKind, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_TIMEOUT_SECS};

/// Longest accepted timeout, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Largest accepted explicit worker count.
pub const MAX_THREADS: usize = 64;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub injection: InjectionConfig,
}

/// Analysis provider configuration.
///
/// ```toml
/// [provider]
/// kind = "anthropic"
/// model = "claude-3-5-sonnet-latest"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider flavour ("openai", "anthropic", "custom")
    #[serde(default)]
    pub kind: ProviderKind,
    /// API key. Prefer VLMWEAVE_API_KEY over storing it here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint URL (None = provider default; required for "custom")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Model name (None = provider default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Prompt sent with every image (None = built-in prompt)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Images larger than this are not sent
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// Retry once without certificate verification when a TLS connection fails
    #[serde(default)]
    pub insecure_tls_fallback: bool,
}

pub fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

pub fn default_max_image_bytes() -> usize {
    DEFAULT_MAX_IMAGE_BYTES
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            endpoint: None,
            model: None,
            prompt: None,
            timeout_secs: default_timeout_secs(),
            max_image_bytes: default_max_image_bytes(),
            insecure_tls_fallback: false,
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker threads (None = available parallelism, at most 8)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Jobs that may wait before callers run them inline
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

pub fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: None,
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Result injection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Wait for a result at its image reference, in seconds
    #[serde(default = "default_reference_timeout_secs")]
    pub reference_timeout_secs: u64,
    /// Wait per result during the end-of-document drain, in seconds
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
    /// Inject results next to their image (false = only at the end)
    #[serde(default = "default_inline")]
    pub inline: bool,
}

pub fn default_reference_timeout_secs() -> u64 {
    120
}

pub fn default_drain_timeout_secs() -> u64 {
    60
}

pub fn default_inline() -> bool {
    true
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            reference_timeout_secs: default_reference_timeout_secs(),
            drain_timeout_secs: default_drain_timeout_secs(),
            inline: default_inline(),
        }
    }
}

fn check_timeout(name: &str, secs: u64) -> Result<(), String> {
    if secs == 0 {
        return Err(format!("{} must be > 0", name));
    }
    if secs > MAX_TIMEOUT_SECS {
        return Err(format!(
            "{} {} exceeds maximum ({}s)",
            name, secs, MAX_TIMEOUT_SECS
        ));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns `Ok(())` if all values are within acceptable bounds,
    /// or an error describing the first invalid value found.
    pub fn validate(&self) -> Result<(), String> {
        check_timeout("provider.timeout_secs", self.provider.timeout_secs)?;
        if self.provider.max_image_bytes == 0 {
            return Err("provider.max_image_bytes must be > 0".to_string());
        }
        match self.pool.threads {
            Some(0) => return Err("pool.threads must be > 0".to_string()),
            Some(t) if t > MAX_THREADS => {
                return Err(format!(
                    "pool.threads {} exceeds maximum ({})",
                    t, MAX_THREADS
                ))
            }
            _ => {}
        }
        if self.pool.queue_capacity == 0 {
            return Err("pool.queue_capacity must be > 0".to_string());
        }
        check_timeout(
            "injection.reference_timeout_secs",
            self.injection.reference_timeout_secs,
        )?;
        check_timeout(
            "injection.drain_timeout_secs",
            self.injection.drain_timeout_secs,
        )?;
        Ok(())
    }
}
