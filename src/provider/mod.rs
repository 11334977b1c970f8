//! Vision-model analysis providers.
//!
//! This module provides the Strategy pattern for the hosted model APIs an
//! image can be sent to. Each provider knows how to build its request and
//! read its response; HTTP, retries and TLS handling live in
//! [`HttpTransport`].
//!
//! # Supported Providers
//!
//! - **OpenAI**: chat completions with an `image_url` data URL
//! - **Anthropic**: messages API with a base64 `image` source block
//! - **Custom**: any OpenAI-compatible endpoint; responses in either the
//!   OpenAI or the Anthropic shape are accepted
//!
//! # Design
//!
//! Providers are stateless apart from their HTTP clients and are shared by
//! all worker threads. Every check that needs no network (configuration,
//! MIME type, size) runs before a request is built.

mod anthropic;
mod custom;
mod http;
mod openai;
pub mod prompt;
pub mod retry;

pub use anthropic::AnthropicProvider;
pub use custom::CustomProvider;
pub use http::HttpTransport;
pub use openai::OpenAiProvider;
pub use prompt::DEFAULT_PROMPT;
pub use retry::RetryPolicy;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Largest image sent to a provider by default (20 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Completion length requested from every provider.
pub const MAX_TOKENS: u32 = 1000;

/// MIME types providers accept.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/tiff",
];

/// Whether `mime` (parameters ignored) is an accepted image type.
pub fn is_supported_type(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or("").trim();
    SUPPORTED_IMAGE_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(essence))
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Analysis returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub text: String,
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl Analysis {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provider: None,
            model: None,
        }
    }

    pub fn with_labels(mut self, provider: &str, model: &str) -> Self {
        self.provider = Some(provider.to_string());
        self.model = Some(model.to_string());
        self
    }
}

/// Trait for analysis providers (Strategy pattern).
///
/// Implementors must be thread-safe: one instance serves every worker.
pub trait AnalysisProvider: Send + Sync {
    /// Name used in attribution and logs.
    fn name(&self) -> &str;

    /// Model used, when known.
    fn model(&self) -> Option<&str>;

    /// Analyse one image. May block for a long time.
    fn analyze(&self, bytes: &[u8], mime_type: &str) -> ProviderResult<Analysis>;
}

/// Errors from analysis providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("request failed: {0}")]
    Http(String),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("rate limited{}", .retry_after.map(|d| format!(" (retry after {}s)", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Failure class used in error tags.
    pub fn class(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not-configured",
            ProviderError::UnsupportedType(_) => "unsupported-type",
            ProviderError::TooLarge { .. } => "too-large",
            ProviderError::Http(_) => "http",
            ProviderError::Status { .. } => "http-status",
            ProviderError::RateLimited { .. } => "rate-limited",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::MalformedResponse(_) => "malformed-response",
            ProviderError::Json(_) => "json",
        }
    }

    /// Rate limits and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::Status { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Server-provided wait before retrying.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Hosted API flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Custom,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Custom => "custom",
        }
    }

    /// Endpoint used when none is configured. Custom endpoints have none.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            ProviderKind::Anthropic => Some("https://api.anthropic.com/v1/messages"),
            ProviderKind::Custom => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi | ProviderKind::Custom => "gpt-4-vision-preview",
            ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "custom" => Ok(ProviderKind::Custom),
            other => Err(format!(
                "unknown provider '{}' (expected openai, anthropic or custom)",
                other
            )),
        }
    }
}

/// Everything needed to build a provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub prompt: String,
    pub timeout: Duration,
    pub max_image_bytes: usize,
    pub insecure_tls_fallback: bool,
    pub retry: RetryPolicy,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            endpoint: None,
            model: None,
            prompt: DEFAULT_PROMPT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            insecure_tls_fallback: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Create the provider described by `settings`.
///
/// Missing credentials are not an error here: the provider reports
/// `NotConfigured` for each image instead.
pub fn build_provider(settings: &ProviderSettings) -> ProviderResult<Arc<dyn AnalysisProvider>> {
    let core = ProviderCore::new(settings)?;
    Ok(match settings.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(core)),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(core)),
        ProviderKind::Custom => Arc::new(CustomProvider::new(core)),
    })
}

/// State and pre-flight checks shared by the HTTP providers.
pub(crate) struct ProviderCore {
    pub(crate) api_key: Option<String>,
    pub(crate) endpoint: Option<String>,
    pub(crate) model: String,
    pub(crate) prompt: String,
    pub(crate) max_image_bytes: usize,
    pub(crate) transport: HttpTransport,
}

/// A request that passed the pre-flight checks.
pub(crate) struct Prepared<'a> {
    pub(crate) api_key: &'a str,
    pub(crate) endpoint: &'a str,
    pub(crate) base64: String,
}

impl ProviderCore {
    pub(crate) fn new(settings: &ProviderSettings) -> ProviderResult<Self> {
        let endpoint = settings
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| settings.kind.default_endpoint().map(str::to_string));
        let model = settings
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| settings.kind.default_model().to_string());

        Ok(Self {
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            endpoint,
            model,
            prompt: settings.prompt.clone(),
            max_image_bytes: settings.max_image_bytes,
            transport: HttpTransport::new(
                settings.timeout,
                settings.insecure_tls_fallback,
                settings.retry.clone(),
            )?,
        })
    }

    /// Check configuration, type and size, then encode the image.
    pub(crate) fn prepare(&self, bytes: &[u8], mime_type: &str) -> ProviderResult<Prepared<'_>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("no API key".to_string()))?;
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("no endpoint".to_string()))?;
        if !is_supported_type(mime_type) {
            return Err(ProviderError::UnsupportedType(mime_type.to_string()));
        }
        if bytes.len() > self.max_image_bytes {
            return Err(ProviderError::TooLarge {
                size: bytes.len(),
                limit: self.max_image_bytes,
            });
        }

        Ok(Prepared {
            api_key: api_key.trim(),
            endpoint,
            base64: STANDARD.encode(bytes),
        })
    }
}
