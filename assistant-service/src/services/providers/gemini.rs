//! Gemini provider implementation.
//!
//! Multi-turn chat against Google's `generateContent` endpoint. The whole
//! session is sent with every request; the API itself is stateless.

use super::{
    ChatContent, ChatSession, GenerationParams, ProviderError, ProviderResponse, Role,
    TextProvider,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the configured model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn ensure_key(&self) -> Result<&str, ProviderError> {
        let key = self.config.api_key.expose_secret();
        if key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }
        Ok(key)
    }

    /// Build generation config from parameters.
    fn build_generation_config(params: &GenerationParams) -> Option<GenerationConfig> {
        if params.temperature.is_none() && params.max_tokens.is_none() && !params.json_output {
            return None;
        }

        Some(GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_tokens,
            response_mime_type: params
                .json_output
                .then(|| "application/json".to_string()),
        })
    }

    fn build_request(
        session: &ChatSession,
        message: &str,
        params: &GenerationParams,
    ) -> GenerateContentRequest {
        let mut contents: Vec<Content> = session.contents().iter().map(Content::from).collect();
        contents.push(Content::from(&ChatContent::user(message)));

        GenerateContentRequest {
            contents,
            generation_config: Self::build_generation_config(params),
        }
    }
}

/// Map a non-success HTTP status and body to a provider error.
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Unauthorized(format!("{}: {}", status, body)),
        429 => ProviderError::RateLimited,
        // Gemini answers an invalid key with 400 INVALID_ARGUMENT
        400 if body.contains("API_KEY_INVALID") || body.contains("API key not valid") => {
            ProviderError::Unauthorized(format!("API_KEY rejected: {}", body))
        }
        400 => ProviderError::InvalidRequest(body.to_string()),
        code => ProviderError::ApiError {
            status: Some(code),
            message: format!("Gemini API error {}: {}", status, body),
        },
    }
}

/// Pull the reply text out of a decoded response.
fn extract_text(response: GenerateContentResponse) -> Result<ProviderResponse, ProviderError> {
    if response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_ref())
        .is_some()
    {
        return Err(ProviderError::ContentFiltered);
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    if matches!(
        candidate.finish_reason.as_deref(),
        Some("SAFETY") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT")
    ) {
        return Err(ProviderError::ContentFiltered);
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    let usage = response.usage_metadata.unwrap_or_default();

    Ok(ProviderResponse {
        text,
        input_tokens: usage.prompt_token_count.unwrap_or(0),
        output_tokens: usage.candidates_token_count.unwrap_or(0),
    })
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn start_chat(&self, priming: Vec<ChatContent>) -> Result<ChatSession, ProviderError> {
        self.ensure_key()?;
        Ok(ChatSession::new(priming))
    }

    async fn send_message(
        &self,
        session: &ChatSession,
        message: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let key = self.ensure_key()?;
        let request = Self::build_request(session, message, params);

        tracing::debug!(
            model = %self.config.model,
            session_id = %session.id(),
            history_len = session.contents().len(),
            message_len = message.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header(API_KEY_HEADER, key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &error_text));
        }

        let api_response: GenerateContentResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: None,
                message: format!("Failed to parse response: {}", e),
            })?;

        extract_text(api_response)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let key = self.ensure_key()?;

        // Fetching the model metadata proves both reachability and the key
        let url = format!(
            "{}/models/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_status(status, &body))
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl From<&ChatContent> for Content {
    fn from(content: &ChatContent) -> Self {
        Self {
            role: Some(content.role),
            parts: vec![Part {
                text: Some(content.text.clone()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}
