//! Per-resource failure classes.
//!
//! None of these fail a render. Each is captured in the resource's
//! [`AnalysisResult`](super::AnalysisResult) and shown in its result block.
//!
//! # Error Categories
//!
//! - `ResourceRead` - the resource bytes could not be read from the container
//! - `Analysis` - the provider failed, panicked or returned unusable data
//! - `Timeout` - the result was not available within the injection wait

use std::time::Duration;
use thiserror::Error;

use crate::provider::ProviderError;

/// Failure recorded in place of analysis text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorTag {
    #[error("resource read failed: {0}")]
    ResourceRead(String),

    #[error("analysis failed ({class}): {detail}")]
    Analysis { class: String, detail: String },

    #[error("analysis timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ErrorTag {
    pub fn analysis(class: impl Into<String>, detail: impl Into<String>) -> Self {
        ErrorTag::Analysis {
            class: class.into(),
            detail: detail.into(),
        }
    }

    /// Short machine-readable failure class (e.g. `analysis:http-status`).
    pub fn class(&self) -> String {
        match self {
            ErrorTag::ResourceRead(_) => "resource-read".to_string(),
            ErrorTag::Analysis { class, .. } => format!("analysis:{}", class),
            ErrorTag::Timeout(_) => "timeout".to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ErrorTag::Timeout(_))
    }
}

impl From<&ProviderError> for ErrorTag {
    fn from(err: &ProviderError) -> Self {
        ErrorTag::analysis(err.class(), err.to_string())
    }
}
