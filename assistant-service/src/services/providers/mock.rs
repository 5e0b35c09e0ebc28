//! Mock provider implementation for tests and local runs without a key.

use super::{
    ChatContent, ChatSession, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Most recent attempts kept by [`ScriptedTextProvider::sent`].
pub const SENT_LOG_CAPACITY: usize = 256;

/// A provider that replays scripted outcomes in order. Once the script runs
/// out it echoes the message back.
#[derive(Default)]
pub struct ScriptedTextProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    sent: Mutex<VecDeque<SentMessage>>,
    attempts: AtomicUsize,
    sessions_started: AtomicUsize,
    refuse_sessions: AtomicBool,
}

/// What the provider saw for one attempt.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: String,
    pub history: Vec<ChatContent>,
    pub json_output: bool,
}

impl ScriptedTextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that answers the given outcomes in order.
    pub fn with_script<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ProviderError>>,
    {
        let provider = Self::default();
        provider.push_all(outcomes);
        provider
    }

    pub fn push_error(&self, error: ProviderError) {
        self.lock_script().push_back(Err(error));
    }

    pub fn push_all<I>(&self, outcomes: I)
    where
        I: IntoIterator<Item = Result<String, ProviderError>>,
    {
        self.lock_script().extend(outcomes);
    }

    /// Make `start_chat` fail until switched back.
    pub fn set_refuse_sessions(&self, refuse: bool) {
        self.refuse_sessions.store(refuse, Ordering::SeqCst);
    }

    /// Number of `send_message` calls so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::SeqCst)
    }

    /// The last [`SENT_LOG_CAPACITY`] attempts, oldest first.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, ProviderError>>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TextProvider for ScriptedTextProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn start_chat(&self, priming: Vec<ChatContent>) -> Result<ChatSession, ProviderError> {
        if self.refuse_sessions.load(Ordering::SeqCst) {
            return Err(ProviderError::NotConfigured(
                "Mock provider refusing sessions".to_string(),
            ));
        }
        self.sessions_started.fetch_add(1, Ordering::SeqCst);
        Ok(ChatSession::new(priming))
    }

    async fn send_message(
        &self,
        session: &ChatSession,
        message: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        {
            let mut sent = self
                .sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if sent.len() == SENT_LOG_CAPACITY {
                sent.pop_front();
            }
            sent.push_back(SentMessage {
                message: message.to_string(),
                history: session.contents().to_vec(),
                json_output: params.json_output,
            });
        }

        let outcome = self
            .lock_script()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("Mock response for: {}", message)));

        outcome.map(|text| ProviderResponse {
            input_tokens: message.len() as i32 / 4,
            output_tokens: text.len() as i32 / 4,
            text,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.refuse_sessions.load(Ordering::SeqCst) {
            Err(ProviderError::NotConfigured(
                "Mock provider refusing sessions".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
