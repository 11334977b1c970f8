//! Anthropic messages provider.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{Analysis, AnalysisProvider, ProviderCore, ProviderError, ProviderResult, MAX_TOKENS};

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    core: ProviderCore,
}

impl AnthropicProvider {
    pub(crate) fn new(core: ProviderCore) -> Self {
        Self { core }
    }
}

impl AnalysisProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.core.model)
    }

    fn analyze(&self, bytes: &[u8], mime_type: &str) -> ProviderResult<Analysis> {
        let prepared = self.core.prepare(bytes, mime_type)?;
        let body = request_body(
            &self.core.model,
            &self.core.prompt,
            mime_type,
            &prepared.base64,
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(prepared.api_key)
                .map_err(|_| ProviderError::NotConfigured("invalid API key".to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .core
            .transport
            .post_json(prepared.endpoint, &headers, &body)?;
        let text = parse_response(&response)?;
        Ok(Analysis::new(text).with_labels(self.name(), &self.core.model))
    }
}

fn request_body<'a>(
    model: &'a str,
    prompt: &'a str,
    mime_type: &'a str,
    base64: &'a str,
) -> AnthropicRequest<'a> {
    AnthropicRequest {
        model,
        max_tokens: MAX_TOKENS,
        messages: vec![AnthropicMessage {
            role: "user",
            content: vec![
                ContentBlock::Image {
                    source: ImageSource {
                        kind: "base64",
                        media_type: mime_type,
                        data: base64,
                    },
                },
                ContentBlock::Text { text: prompt },
            ],
        }],
    }
}

/// Join the text blocks of `content`.
pub(crate) fn parse_response(body: &str) -> ProviderResult<String> {
    let parsed: AnthropicResponse = serde_json::from_str(body)?;
    let text = parsed
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text),
            ResponseBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "response has no text content".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
