//! General-purpose conversational assistant.
//!
//! Owns one primed session and the user-visible turn history. Provider
//! failures never escape `send_message`: they are classified and the matching
//! fixed message is returned (and recorded) as the reply.

use super::failure::FailureKind;
use super::metrics;
use super::prompts::{self, QUICK_PROMPTS};
use super::providers::{ChatSession, GenerationParams, ProviderError, TextProvider};
use super::send_with_retry;
use crate::models::{ConversationHistory, ConversationTurn, HistoryRetention};
use service_core::retry::RetryPolicy;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("chat session unavailable: {0}")]
    SessionUnavailable(#[source] ProviderError),
}

impl AssistantError {
    /// Safe text to show instead of a reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            AssistantError::SessionUnavailable(source) => {
                FailureKind::classify(source).user_message()
            }
        }
    }
}

/// Tunables for one assistant instance.
#[derive(Debug, Clone, Default)]
pub struct AssistantOptions {
    pub retry: RetryPolicy,
    pub retention: HistoryRetention,
    pub params: GenerationParams,
}

pub struct ConversationalAssistant {
    provider: Arc<dyn TextProvider>,
    options: AssistantOptions,
    session: Option<ChatSession>,
    history: ConversationHistory,
}

impl ConversationalAssistant {
    /// Create an assistant without opening a session yet.
    pub fn new(provider: Arc<dyn TextProvider>, options: AssistantOptions) -> Self {
        let history = ConversationHistory::new(options.retention);
        Self {
            provider,
            options,
            session: None,
            history,
        }
    }

    /// Create an assistant and try to prime its session right away. A
    /// failure here is logged; the next `send_message` retries it.
    pub async fn start(provider: Arc<dyn TextProvider>, options: AssistantOptions) -> Self {
        let mut assistant = Self::new(provider, options);
        if let Err(e) = assistant.initialize().await {
            warn!(error = %e, "Assistant session not ready at startup");
        }
        assistant
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    /// Open a session primed with the persona and greeting. No-op when a
    /// session already exists.
    pub async fn initialize(&mut self) -> Result<(), AssistantError> {
        if self.session.is_none() {
            self.session = Some(self.open_session().await?);
        }
        Ok(())
    }

    async fn open_session(&self) -> Result<ChatSession, AssistantError> {
        let session = self
            .provider
            .start_chat(prompts::assistant_priming())
            .await
            .map_err(AssistantError::SessionUnavailable)?;

        info!(
            session_id = %session.id(),
            provider = self.provider.name(),
            "Chat session initialized"
        );
        Ok(session)
    }

    /// Send one user message and return the reply text. Once a session is
    /// available this always returns `Ok` with a non-empty string.
    #[instrument(skip(self, text), fields(message_len = text.len()))]
    pub async fn send_message(&mut self, text: &str) -> Result<String, AssistantError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => {
                info!("Chat session not initialized, reinitializing");
                self.open_session().await?
            }
        };

        self.history.push_user(text);

        let outcome = send_with_retry(
            self.provider.as_ref(),
            &session,
            text,
            &self.options.params,
            &self.options.retry,
            "assistant.send_message",
        )
        .await;

        let reply = match outcome {
            Ok(response) => {
                metrics::record_assistant_reply("reply");
                session.record_exchange(text, &response.text);
                if let Some(max) = self.options.retention.max_exchanges() {
                    session.retain_recent_exchanges(max);
                }
                response.text
            }
            Err(e) => {
                let kind = FailureKind::classify(&e);
                warn!(error = %e, failure = kind.as_str(), "Replying with failure message");
                metrics::record_assistant_reply(kind.as_str());
                kind.user_message().to_string()
            }
        };

        self.session = Some(session);
        self.history.push_assistant(reply.clone());
        Ok(reply)
    }

    /// Chronological snapshot of the conversation.
    pub fn history(&self) -> &[ConversationTurn] {
        self.history.turns()
    }

    /// Forget the conversation and prime a fresh session.
    pub async fn reset(&mut self) -> Result<(), AssistantError> {
        self.history.clear();
        self.session = None;
        self.initialize().await
    }

    /// Whether the provider currently accepts requests.
    pub async fn test_connection(&self) -> bool {
        match self.provider.health_check().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Provider connection test failed");
                false
            }
        }
    }

    pub fn quick_prompts() -> &'static [&'static str] {
        &QUICK_PROMPTS
    }
}
