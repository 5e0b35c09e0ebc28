//! Symptom triage advisor.
//!
//! Asks the model for a JSON analysis inside a session primed with a
//! clinical-education prompt. Every failure path (no session, provider
//! error, missing or invalid JSON) yields [`SymptomAnalysis::fallback`], so
//! callers always get a complete answer.

use super::extract::{parse_analysis, ExtractError};
use super::metrics;
use super::prompts;
use super::providers::{ChatSession, GenerationParams, ProviderError, TextProvider};
use super::send_with_retry;
use crate::models::SymptomAnalysis;
use service_core::retry::RetryPolicy;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Why an analysis was replaced by the fallback. Never returned to callers.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("triage session unavailable: {0}")]
    Session(#[source] ProviderError),

    #[error("provider call failed: {0}")]
    Provider(#[source] ProviderError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

/// Tunables for one advisor instance.
#[derive(Debug, Clone)]
pub struct TriageOptions {
    pub retry: RetryPolicy,
    pub params: GenerationParams,
}

impl Default for TriageOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            params: GenerationParams {
                json_output: true,
                ..Default::default()
            },
        }
    }
}

pub struct SymptomTriageAdvisor {
    provider: Arc<dyn TextProvider>,
    options: TriageOptions,
    session: Option<ChatSession>,
}

impl SymptomTriageAdvisor {
    pub fn new(provider: Arc<dyn TextProvider>, options: TriageOptions) -> Self {
        Self {
            provider,
            options,
            session: None,
        }
    }

    /// Create an advisor and prime its session right away. Failure is
    /// logged and retried on the first analysis.
    pub async fn start(provider: Arc<dyn TextProvider>, options: TriageOptions) -> Self {
        let mut advisor = Self::new(provider, options);
        if let Err(e) = advisor.initialize().await {
            warn!(error = %e, "Triage session not ready at startup");
        }
        advisor
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    pub async fn initialize(&mut self) -> Result<(), ProviderError> {
        if self.session.is_none() {
            self.session = Some(self.open_session().await?);
        }
        Ok(())
    }

    async fn open_session(&self) -> Result<ChatSession, ProviderError> {
        let session = self.provider.start_chat(prompts::triage_priming()).await?;
        info!(session_id = %session.id(), "Triage session initialized");
        Ok(session)
    }

    /// Analyze an initial symptom description. Never fails.
    #[instrument(skip(self, description), fields(description_len = description.len()))]
    pub async fn analyze_symptoms(&mut self, description: &str) -> SymptomAnalysis {
        let prompt = prompts::analysis_prompt(description);
        self.analyze(prompt).await
    }

    /// Update the analysis with follow-up information, in the same session
    /// so earlier context is kept. Never fails.
    #[instrument(skip_all, fields(follow_up_len = follow_up.len()))]
    pub async fn follow_up(&mut self, original: &str, follow_up: &str) -> SymptomAnalysis {
        let prompt = prompts::follow_up_prompt(original, follow_up);
        self.analyze(prompt).await
    }

    /// Drop the session and prime a new one.
    pub async fn reset(&mut self) {
        self.session = None;
        if let Err(e) = self.initialize().await {
            warn!(error = %e, "Triage session not ready after reset");
        }
    }

    async fn analyze(&mut self, prompt: String) -> SymptomAnalysis {
        match self.try_analyze(&prompt).await {
            Ok(analysis) => {
                metrics::record_triage_result("parsed");
                analysis
            }
            Err(e) => {
                warn!(error = %e, "Using fallback symptom analysis");
                metrics::record_triage_result("fallback");
                SymptomAnalysis::fallback()
            }
        }
    }

    async fn try_analyze(&mut self, prompt: &str) -> Result<SymptomAnalysis, TriageError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => self.open_session().await.map_err(TriageError::Session)?,
        };

        let outcome = send_with_retry(
            self.provider.as_ref(),
            &session,
            prompt,
            &self.options.params,
            &self.options.retry,
            "triage.analyze",
        )
        .await;

        // The model replied, so the exchange is context for follow-ups even
        // if the reply turns out not to parse
        if let Ok(response) = &outcome {
            session.record_exchange(prompt, &response.text);
        }
        self.session = Some(session);

        let response = outcome.map_err(TriageError::Provider)?;
        Ok(parse_analysis(&response.text)?)
    }
}
