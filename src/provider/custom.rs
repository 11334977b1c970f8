//! OpenAI-compatible provider for self-hosted or third-party endpoints.

use super::openai::{bearer_headers, data_url, request_body};
use super::{anthropic, openai};
use super::{Analysis, AnalysisProvider, ProviderCore, ProviderError, ProviderResult};

/// Sends OpenAI-shaped requests to a configured endpoint.
///
/// Gateways differ in what they return, so the response is read as an
/// OpenAI completion first and as an Anthropic message second.
pub struct CustomProvider {
    core: ProviderCore,
}

impl CustomProvider {
    pub(crate) fn new(core: ProviderCore) -> Self {
        Self { core }
    }
}

impl AnalysisProvider for CustomProvider {
    fn name(&self) -> &str {
        "custom"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.core.model)
    }

    fn analyze(&self, bytes: &[u8], mime_type: &str) -> ProviderResult<Analysis> {
        let prepared = self.core.prepare(bytes, mime_type)?;
        let data_url = data_url(mime_type, &prepared.base64);
        let body = request_body(&self.core.model, &self.core.prompt, &data_url);
        let headers = bearer_headers(prepared.api_key)?;

        let response = self
            .core
            .transport
            .post_json(prepared.endpoint, &headers, &body)?;
        let text = parse_response(&response)?;
        Ok(Analysis::new(text).with_labels(self.name(), &self.core.model))
    }
}

fn parse_response(body: &str) -> ProviderResult<String> {
    match openai::parse_response(body) {
        Ok(text) => Ok(text),
        Err(ProviderError::Json(err)) => Err(ProviderError::Json(err)),
        Err(_) => anthropic::parse_response(body).map_err(|_| {
            ProviderError::MalformedResponse(
                "response is neither OpenAI nor Anthropic shaped".to_string(),
            )
        }),
    }
}
