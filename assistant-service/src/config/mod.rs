use crate::models::HistoryRetention;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider, GEMINI_API_BASE};
use crate::services::providers::mock::ScriptedTextProvider;
use crate::services::providers::{GenerationParams, TextProvider};
use crate::services::{AssistantOptions, TriageOptions};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for assistant-service.
///
/// Read from an optional `configuration` file and `APP__` environment
/// variables, e.g. `APP__GEMINI__API_KEY`, `APP__RETRY__MAX_ATTEMPTS`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub history: HistoryRetention,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Conversations and advisors unused for this long are evicted.
    #[serde(default = "default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    /// Scripted in-process provider, for local runs without a key.
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    #[serde(default = "empty_secret")]
    pub api_key: Secret<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: empty_secret(),
            model: default_model(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_base() -> String {
    GEMINI_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_sessions() -> usize {
    1000
}

fn default_session_idle_ttl_secs() -> u64 {
    30 * 60
}

impl AssistantConfig {
    pub fn load() -> Result<Self, AppError> {
        let config: Self = core_config::load_layered("configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.provider == ProviderKind::Gemini
            && self.gemini.api_key.expose_secret().trim().is_empty()
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "APP__GEMINI__API_KEY is required when provider is gemini"
            )));
        }
        if self.max_sessions == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "max_sessions must be at least 1"
            )));
        }
        if self.session_idle_ttl_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "session_idle_ttl_secs must be at least 1"
            )));
        }
        // History holds whole exchanges, so the cap must be a positive even number
        if let Some(max_turns) = self.history.max_turns {
            if max_turns == 0 || max_turns % 2 != 0 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "history.max_turns must be a positive even number, got {}",
                    max_turns
                )));
            }
        }
        Ok(())
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }

    /// Build the configured text provider.
    pub fn build_provider(&self) -> Result<Arc<dyn TextProvider>, AppError> {
        match self.provider {
            ProviderKind::Gemini => {
                let provider = GeminiTextProvider::new(GeminiConfig {
                    api_key: self.gemini.api_key.clone(),
                    model: self.gemini.model.clone(),
                    api_base: self.gemini.api_base.clone(),
                    timeout: Duration::from_secs(self.gemini.timeout_secs),
                })
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
                Ok(Arc::new(provider))
            }
            ProviderKind::Mock => Ok(Arc::new(ScriptedTextProvider::new())),
        }
    }

    fn params(&self, json_output: bool) -> GenerationParams {
        GenerationParams {
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
            json_output,
        }
    }

    pub fn assistant_options(&self) -> AssistantOptions {
        AssistantOptions {
            retry: self.retry.clone(),
            retention: self.history,
            params: self.params(false),
        }
    }

    pub fn triage_options(&self) -> TriageOptions {
        TriageOptions {
            retry: self.retry.clone(),
            params: self.params(true),
        }
    }
}
