//! Conversational assistant behaviour against the scripted provider.

use assistant_service::models::HistoryRetention;
use assistant_service::services::providers::mock::ScriptedTextProvider;
use assistant_service::services::providers::ProviderError;
use assistant_service::services::{AssistantOptions, ConversationalAssistant, FailureKind};
use service_core::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

fn network_error() -> ProviderError {
    ProviderError::NetworkError("connection reset".to_string())
}

async fn started(provider: &Arc<ScriptedTextProvider>) -> ConversationalAssistant {
    let mut assistant =
        ConversationalAssistant::new(provider.clone(), AssistantOptions::default());
    assistant.initialize().await.expect("initialize");
    assistant
}

#[tokio::test(start_paused = true)]
async fn replies_are_never_empty() {
    let provider = Arc::new(ScriptedTextProvider::new());
    provider.push_error(ProviderError::Unauthorized("API_KEY_INVALID".to_string()));
    provider.push_error(ProviderError::ContentFiltered);
    provider.push_all(vec![Err(network_error()), Err(network_error()), Err(network_error())]);
    let mut assistant = started(&provider).await;

    let long = "symptom ".repeat(5_000);
    for input in ["", "   ", "hello", long.as_str(), "what about fever?"] {
        let reply = assistant.send_message(input).await.expect("reply");
        assert!(!reply.trim().is_empty(), "empty reply for {:?}", input);
    }
}

#[tokio::test]
async fn history_is_chronological() {
    let provider = Arc::new(ScriptedTextProvider::new());
    let mut assistant = started(&provider).await;

    for i in 0..4 {
        assistant.send_message(&format!("question {}", i)).await.unwrap();
    }

    let history = assistant.history();
    assert_eq!(history.len(), 8);
    for (i, pair) in history.chunks(2).enumerate() {
        assert!(pair[0].is_user);
        assert_eq!(pair[0].text, format!("question {}", i));
        assert!(!pair[1].is_user);
        assert_eq!(pair[1].text, format!("Mock response for: question {}", i));
    }
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test(start_paused = true)]
async fn transport_failures_are_retried() {
    let provider = Arc::new(ScriptedTextProvider::with_script(vec![
        Err(network_error()),
        Err(network_error()),
        Ok("Drink plenty of fluids.".to_string()),
    ]));
    let mut assistant = started(&provider).await;

    let start = tokio::time::Instant::now();
    let reply = assistant.send_message("I have a cold").await.unwrap();

    assert_eq!(reply, "Drink plenty of fluids.");
    assert_eq!(provider.attempts(), 3);
    // linear delays of 1s then 2s
    assert!(start.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_give_classified_message() {
    let provider = Arc::new(ScriptedTextProvider::with_script(vec![
        Err(network_error()),
        Err(network_error()),
        Err(network_error()),
    ]));
    let mut assistant = started(&provider).await;

    let reply = assistant.send_message("hello").await.unwrap();

    assert_eq!(reply, FailureKind::Transport.user_message());
    assert_eq!(provider.attempts(), 3);
    assert_eq!(assistant.history().len(), 2);
    assert_eq!(assistant.history()[1].text, reply);
}

#[tokio::test]
async fn authentication_failure_is_not_retried() {
    let provider = Arc::new(ScriptedTextProvider::with_script(vec![Err(
        ProviderError::Unauthorized("API key not valid".to_string()),
    )]));
    let mut assistant = started(&provider).await;

    let reply = assistant.send_message("hello").await.unwrap();

    assert_eq!(reply, FailureKind::Authentication.user_message());
    assert_eq!(provider.attempts(), 1);
}

#[tokio::test]
async fn reset_clears_history_and_reprimes() {
    let provider = Arc::new(ScriptedTextProvider::new());
    let mut assistant = started(&provider).await;

    assistant.send_message("first").await.unwrap();
    assistant.reset().await.unwrap();

    assert!(assistant.history().is_empty());
    assert_eq!(provider.sessions_started(), 2);

    assistant.send_message("second").await.unwrap();
    let sent = provider.sent();
    // only persona and greeting precede the new message
    assert_eq!(sent[1].history.len(), 2);
    assert_eq!(assistant.history().len(), 2);
}

#[tokio::test]
async fn session_recovers_after_failed_start() {
    let provider = Arc::new(ScriptedTextProvider::new());
    provider.set_refuse_sessions(true);
    let mut assistant =
        ConversationalAssistant::start(provider.clone(), AssistantOptions::default()).await;
    assert!(!assistant.is_ready());
    assert!(assistant.send_message("hello").await.is_err());

    provider.set_refuse_sessions(false);
    let reply = assistant.send_message("hello").await.unwrap();
    assert_eq!(reply, "Mock response for: hello");
    assert!(assistant.is_ready());
}

#[tokio::test]
async fn retention_keeps_latest_turns() {
    let provider = Arc::new(ScriptedTextProvider::new());
    let mut assistant = ConversationalAssistant::new(
        provider.clone(),
        AssistantOptions {
            retry: RetryPolicy::no_retry(),
            retention: HistoryRetention::capped(6),
            ..Default::default()
        },
    );

    for i in 0..10 {
        assistant.send_message(&format!("m{}", i)).await.unwrap();
    }

    let texts: Vec<_> = assistant.history().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts.len(), 6);
    assert_eq!(texts[0], "m7");
    assert_eq!(texts[5], "Mock response for: m9");
}
