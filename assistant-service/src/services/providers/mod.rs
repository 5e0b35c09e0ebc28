//! Remote text-generation provider abstractions and implementations.
//!
//! A provider opens primed chat sessions and sends one message at a time
//! against the accumulated session contents. Sessions are owned by the
//! caller; providers never mutate them.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use service_core::retry::Retryable;
use thiserror::Error;
use uuid::Uuid;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error: {message}")]
    ApiError { status: Option<u16>, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited (429): quota exceeded")]
    RateLimited,

    #[error("Content filtered: blocked by SAFETY settings")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider returned no text")]
    EmptyResponse,
}

impl ProviderError {
    /// Short stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Unauthorized(_) => "unauthorized",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
            ProviderError::EmptyResponse => "empty_response",
        }
    }
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            ProviderError::NetworkError(_)
            | ProviderError::RateLimited
            | ProviderError::EmptyResponse => true,
            ProviderError::ApiError { status, .. } => match status {
                Some(code) => *code >= 500,
                None => true,
            },
            ProviderError::NotConfigured(_)
            | ProviderError::Unauthorized(_)
            | ProviderError::InvalidRequest(_)
            | ProviderError::ContentFiltered => false,
        }
    }
}

/// Speaker of a piece of session content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry of the context sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContent {
    pub role: Role,
    pub text: String,
}

impl ChatContent {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// State of an ongoing exchange with the remote model: the fixed priming
/// contents followed by every completed user/model exchange.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    priming_len: usize,
    contents: Vec<ChatContent>,
}

impl ChatSession {
    pub fn new(priming: Vec<ChatContent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            priming_len: priming.len(),
            contents: priming,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Everything the provider should see before the next message.
    pub fn contents(&self) -> &[ChatContent] {
        &self.contents
    }

    /// Number of completed exchanges after the priming.
    pub fn exchange_count(&self) -> usize {
        (self.contents.len() - self.priming_len) / 2
    }

    /// Append a completed exchange. Only called after the provider replied.
    pub fn record_exchange(&mut self, message: &str, reply: &str) {
        self.contents.push(ChatContent::user(message));
        self.contents.push(ChatContent::model(reply));
    }

    /// Drop the oldest exchanges so at most `max_exchanges` remain. The
    /// priming contents are always kept.
    pub fn retain_recent_exchanges(&mut self, max_exchanges: usize) {
        let excess = self.exchange_count().saturating_sub(max_exchanges);
        if excess > 0 {
            let start = self.priming_len;
            self.contents.drain(start..start + excess * 2);
        }
    }
}

/// Generation parameters for a single request.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<i32>,

    /// Ask the model for a JSON document instead of free text.
    pub json_output: bool,
}

/// Result of a provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,
}

/// A remote text-generation endpoint that supports multi-turn sessions.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name for logs and metrics.
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Open a session seeded with `priming`.
    async fn start_chat(&self, priming: Vec<ChatContent>) -> Result<ChatSession, ProviderError>;

    /// Send `message` on top of the session contents.
    async fn send_message(
        &self,
        session: &ChatSession,
        message: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Verify the endpoint is reachable and the credential accepted.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primed() -> ChatSession {
        ChatSession::new(vec![
            ChatContent::user("system prompt"),
            ChatContent::model("greeting"),
        ])
    }

    #[test]
    fn test_new_session_has_only_priming() {
        let session = primed();
        assert_eq!(session.contents().len(), 2);
        assert_eq!(session.exchange_count(), 0);
    }

    #[test]
    fn test_record_exchange_appends_user_then_model() {
        let mut session = primed();
        session.record_exchange("hi", "hello");
        let contents = session.contents();
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[2], ChatContent::user("hi"));
        assert_eq!(contents[3], ChatContent::model("hello"));
        assert_eq!(session.exchange_count(), 1);
    }

    #[test]
    fn test_retain_recent_exchanges_keeps_priming() {
        let mut session = primed();
        for i in 0..5 {
            session.record_exchange(&format!("q{}", i), &format!("a{}", i));
        }
        session.retain_recent_exchanges(2);
        assert_eq!(session.exchange_count(), 2);
        assert_eq!(session.contents()[0].text, "system prompt");
        assert_eq!(session.contents()[2].text, "q3");
        assert_eq!(session.contents()[5].text, "a4");
    }

    #[test]
    fn test_retain_more_than_present_is_noop() {
        let mut session = primed();
        session.record_exchange("q", "a");
        session.retain_recent_exchanges(10);
        assert_eq!(session.exchange_count(), 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::NetworkError("reset".into()).is_retryable());
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::ApiError {
            status: Some(503),
            message: "overloaded".into()
        }
        .is_retryable());
        assert!(!ProviderError::ApiError {
            status: Some(400),
            message: "bad".into()
        }
        .is_retryable());
        assert!(!ProviderError::Unauthorized("key".into()).is_retryable());
        assert!(!ProviderError::ContentFiltered.is_retryable());
    }
}
