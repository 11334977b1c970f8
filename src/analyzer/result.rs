//! Analysis result record.

use super::error::ErrorTag;
use super::tracker::InjectionOutcome;
use crate::provider::Analysis;

/// Outcome of analysing one resource.
///
/// On a normal completion exactly one of `analysis_text` and `error_tag` is
/// set. Both are empty when no analysis ever ran; such a result is still
/// injected, as a neutral block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub analysis_text: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub error_tag: Option<ErrorTag>,
}

impl AnalysisResult {
    pub fn success(analysis: Analysis) -> Self {
        Self {
            analysis_text: Some(analysis.text),
            provider: analysis.provider,
            model: analysis.model,
            error_tag: None,
        }
    }

    pub fn failure(tag: ErrorTag) -> Self {
        Self {
            error_tag: Some(tag),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach provider/model labels (kept on failures for attribution).
    pub fn attributed(mut self, provider: Option<String>, model: Option<String>) -> Self {
        self.provider = self.provider.or(provider);
        self.model = self.model.or(model);
        self
    }

    pub fn is_success(&self) -> bool {
        self.analysis_text.is_some() && self.error_tag.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.analysis_text.is_none() && self.error_tag.is_none()
    }

    /// How this result is accounted for once injected.
    pub fn outcome(&self) -> InjectionOutcome {
        match (&self.analysis_text, &self.error_tag) {
            (_, Some(tag)) if tag.is_timeout() => InjectionOutcome::TimedOut,
            (_, Some(_)) => InjectionOutcome::Failed,
            (Some(_), None) => InjectionOutcome::Analyzed,
            (None, None) => InjectionOutcome::Empty,
        }
    }
}
