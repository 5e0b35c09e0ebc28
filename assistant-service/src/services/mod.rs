pub mod assistant;
pub mod extract;
pub mod failure;
pub mod metrics;
pub mod prompts;
pub mod providers;
pub mod registry;
pub mod triage;

pub use assistant::{AssistantError, AssistantOptions, ConversationalAssistant};
pub use failure::FailureKind;
pub use registry::{RegistryError, SessionRegistry};
pub use triage::{SymptomTriageAdvisor, TriageOptions};

use providers::{ChatSession, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use service_core::retry::{retry_with_policy, RetryPolicy};
use std::time::Instant;

/// Send one message under the retry policy, timing every attempt.
pub(crate) async fn send_with_retry(
    provider: &dyn TextProvider,
    session: &ChatSession,
    message: &str,
    params: &GenerationParams,
    policy: &RetryPolicy,
    operation: &str,
) -> Result<ProviderResponse, ProviderError> {
    retry_with_policy(policy, operation, move || async move {
        let started = Instant::now();
        let result = provider.send_message(session, message, params).await;
        metrics::record_provider_latency(
            provider.name(),
            provider.model(),
            started.elapsed().as_secs_f64(),
        );
        if let Err(e) = &result {
            metrics::record_provider_error(provider.name(), e.label());
        }
        result
    })
    .await
}
