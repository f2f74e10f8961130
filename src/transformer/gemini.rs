//! Gemini transformer using the Generative Language API
//!
//! Sends one `generateContent` request per image: the instruction as a text
//! part and the source image as an `inlineData` part, asking for an image
//! back. The first inline image in the answer is the result.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::RemoteTransformer;
use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use crate::util::constants::USER_AGENT;
use crate::util::{CONNECT_TIMEOUT, TRANSFORM_TIMEOUT};

pub struct GeminiTransformer {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl GeminiTransformer {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(TRANSFORM_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StudioError::ConfigError {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build from config (env vars should be merged first via `with_env()`)
    ///
    /// Validates the endpoint again since env overrides bypass the file check.
    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config
            .gemini_key()
            .ok_or_else(|| StudioError::MissingApiKey {
                provider: "gemini".to_string(),
            })?;
        Self::new(api_key, config.model(), config.endpoint())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl RemoteTransformer for GeminiTransformer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn process_image(
        &self,
        payload: &str,
        mime_type: &str,
        instruction: &str,
    ) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            mime_type,
            payload_len = payload.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "parts": [
                        { "text": instruction },
                        { "inlineData": { "mimeType": mime_type, "data": payload } }
                    ]
                }],
                "generationConfig": {
                    "responseModalities": ["IMAGE", "TEXT"]
                }
            }))
            .send()
            .await
            .map_err(|e| StudioError::remote(format!("Failed to reach the image service: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::remote(api_error_message(status.as_u16(), &body)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| StudioError::remote(format!("Invalid response from the image service: {}", e)))?;

        extract_image(body)
    }
}

// ═══════════════════════════════════════════════════════════════
// Response parsing
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// First inline image of the response, or a descriptive remote error
fn extract_image(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(StudioError::remote(format!("Request blocked: {}", reason)));
    }

    let mut text = None;
    let mut finish_reason = None;
    for candidate in response.candidates {
        finish_reason = finish_reason.or(candidate.finish_reason);
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(inline) = part.inline_data {
                if !inline.data.is_empty() {
                    return Ok(inline.data);
                }
            }
            text = text.or(part.text);
        }
    }

    let message = match (text, finish_reason) {
        (Some(text), _) => format!("No image returned by the model: {}", text.trim()),
        (None, Some(reason)) => format!("No image returned by the model (finish reason: {})", reason),
        (None, None) => "No image returned by the model".to_string(),
    };
    Err(StudioError::remote(message))
}

/// Message from an API error body (`{"error": {"message": ...}}`), else status + body
fn api_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Image service returned HTTP {}", status)
            } else {
                format!("Image service returned HTTP {}: {}", status, body.trim())
            }
        })
}
