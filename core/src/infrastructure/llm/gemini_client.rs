use std::error::Error as _;

use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::{
    analysis::{
        entities::{GenerationOptions, LLMRequest},
        ports::LLMClient,
    },
    common::{
        LLMConfig,
        entities::app_errors::{CoreError, InvocationError, InvocationErrorKind},
    },
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Clone)]
pub struct GeminiLLMClient {
    api_key: String,
    model_name: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

impl From<&GenerationOptions> for GenerationConfig {
    fn from(options: &GenerationOptions) -> Self {
        Self {
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
            max_output_tokens: options.max_output_tokens,
        }
    }
}

impl GeminiRequest {
    fn from_request(request: LLMRequest) -> Self {
        let mut parts = vec![Part::Text {
            text: request.prompt,
        }];

        if let Some(attachment) = request.attachment {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: attachment.mime_type,
                    data: general_purpose::STANDARD.encode(&attachment.data),
                },
            });
        }

        Self {
            contents: vec![Content { parts }],
            generation_config: Some(GenerationConfig::from(&request.generation)),
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }
}

impl GeminiResponse {
    fn into_text(self) -> Result<String, InvocationError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(InvocationError::new(
                InvocationErrorKind::EmptyResponse,
                "No response from LLM",
            ));
        }

        Ok(text)
    }
}

/// Maps a transport failure to an invocation error kind.
fn classify_transport_error(error: &reqwest::Error) -> InvocationError {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    if error.is_timeout() {
        return InvocationError::new(InvocationErrorKind::Timeout, message);
    }

    let classified = InvocationError::from_message(message);
    if classified.kind == InvocationErrorKind::Transport && error.is_connect() {
        InvocationError::new(InvocationErrorKind::ConnectionReset, classified.message)
    } else {
        classified
    }
}

fn classify_status(status: StatusCode, body: &str) -> InvocationError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        InvocationError::new(
            InvocationErrorKind::RateLimited,
            format!("Rate limit exceeded: {body}"),
        )
    } else {
        InvocationError::new(
            InvocationErrorKind::Upstream(status.as_u16()),
            format!("LLM API returned error: {status} - {body}"),
        )
    }
}

impl GeminiLLMClient {
    pub fn new(config: &LLMConfig) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            model_name: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    async fn call_gemini_api(&self, request: GeminiRequest) -> Result<String, CoreError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model_name
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini API request failed: {}", e);
                classify_transport_error(&e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API error: {} - {}", status, error_text);
            return Err(classify_status(status, &error_text).into());
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            InvocationError::new(
                InvocationErrorKind::Transport,
                format!("Failed to parse LLM response: {e}"),
            )
        })?;

        Ok(gemini_response.into_text()?)
    }
}

impl LLMClient for GeminiLLMClient {
    async fn generate(&self, request: LLMRequest) -> Result<String, CoreError> {
        self.call_gemini_api(GeminiRequest::from_request(request))
            .await
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::entities::ImageAttachment;
    use serde_json::json;

    fn options() -> GenerationOptions {
        GenerationOptions {
            temperature: 0.25,
            top_p: 0.5,
            top_k: 40,
            max_output_tokens: 4096,
        }
    }

    #[test]
    fn test_request_with_image_attachment() {
        let request = GeminiRequest::from_request(LLMRequest {
            prompt: "read the label".to_string(),
            attachment: Some(ImageAttachment {
                mime_type: "image/png".to_string(),
                data: b"abc".to_vec(),
            }),
            generation: options(),
        });

        let value = serde_json::to_value(&request).unwrap();
        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "read the label");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "YWJj");
        assert_eq!(value["generation_config"]["max_output_tokens"], 4096);
        assert_eq!(value["generation_config"]["temperature"], 0.25);
        assert_eq!(value["safety_settings"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_text_only_request_has_single_part() {
        let request = GeminiRequest::from_request(LLMRequest {
            prompt: "assess".to_string(),
            attachment: None,
            generation: options(),
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}]
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_empty_response_is_not_retryable() {
        let response: GeminiResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        let err = response.into_text().unwrap_err();
        assert_eq!(err.kind, InvocationErrorKind::EmptyResponse);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_classification() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "quota");
        assert_eq!(err.kind, InvocationErrorKind::RateLimited);
        assert!(err.is_retryable());

        let err = classify_status(StatusCode::BAD_REQUEST, "API key not valid");
        assert_eq!(err.kind, InvocationErrorKind::Upstream(400));
        assert!(!err.is_retryable());
    }
}
