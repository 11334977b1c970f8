//! OpenAI chat-completions provider.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{Analysis, AnalysisProvider, ProviderCore, ProviderError, ProviderResult, MAX_TOKENS};

const TEMPERATURE: f32 = 0.5;

pub struct OpenAiProvider {
    core: ProviderCore,
}

impl OpenAiProvider {
    pub(crate) fn new(core: ProviderCore) -> Self {
        Self { core }
    }
}

impl AnalysisProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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

pub(crate) fn data_url(mime_type: &str, base64: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64)
}

pub(crate) fn bearer_headers(api_key: &str) -> ProviderResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {}", api_key))
        .map_err(|_| ProviderError::NotConfigured("invalid API key".to_string()))?;
    headers.insert(AUTHORIZATION, value);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

pub(crate) fn request_body<'a>(
    model: &'a str,
    prompt: &'a str,
    data_url: &'a str,
) -> OpenAiRequest<'a> {
    OpenAiRequest {
        model,
        messages: vec![OpenAiMessage {
            role: "user",
            content: vec![
                ContentPart::Text { text: prompt },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ],
        }],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

/// Extract `choices[0].message.content`.
pub(crate) fn parse_response(body: &str) -> ProviderResult<String> {
    let parsed: OpenAiResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::MalformedResponse("no message content in choices".to_string()))
}

#[derive(Serialize)]
pub(crate) struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
