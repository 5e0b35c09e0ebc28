//! HTTP surface tests. The router is driven in-process with a scripted
//! provider, so no network or API key is needed.

use assistant_service::config::AssistantConfig;
use assistant_service::services::providers::mock::ScriptedTextProvider;
use assistant_service::services::providers::ProviderError;
use assistant_service::services::FailureKind;
use assistant_service::startup::{build_router, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(provider: Arc<ScriptedTextProvider>, config: Value) -> Router {
    let config: AssistantConfig = serde_json::from_value(config).expect("config");
    build_router(AppState::new(&config, provider))
}

fn app(provider: Arc<ScriptedTextProvider>) -> Router {
    app_with(provider, json!({"provider": "mock", "retry": {"max_attempts": 1}}))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn create(app: &Router, path: &str) -> String {
    let (status, body) = call(app, "POST", path, None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("id").to_string()
}

#[tokio::test]
async fn health_and_readiness() {
    let provider = Arc::new(ScriptedTextProvider::new());
    let app = app(provider.clone());

    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "assistant-service");

    let (status, _) = call(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    provider.set_refuse_sessions(true);
    let (status, _) = call(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = app(Arc::new(ScriptedTextProvider::new()));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn chat_round_trip() {
    let provider = Arc::new(ScriptedTextProvider::with_script(vec![Ok(
        "Stay hydrated and rest.".to_string(),
    )]));
    let app = app(provider);
    let id = create(&app, "/api/chat").await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/chat/{}/messages", id),
        Some(json!({"message": "I feel tired"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Stay hydrated and rest.");

    let (status, body) = call(&app, "GET", &format!("/api/chat/{}/history", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let turns = body.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["isUser"], true);
    assert_eq!(turns[0]["text"], "I feel tired");
    assert_eq!(turns[1]["isUser"], false);
    assert!(turns[1]["timestamp"].is_string());
}

#[tokio::test]
async fn chat_failure_is_a_normal_reply() {
    let provider = Arc::new(ScriptedTextProvider::with_script(vec![Err(
        ProviderError::RateLimited,
    )]));
    let app = app(provider);
    let id = create(&app, "/api/chat").await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/chat/{}/messages", id),
        Some(json!({"message": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], FailureKind::QuotaExceeded.user_message());
}

#[tokio::test]
async fn chat_without_session_returns_safe_reply() {
    let provider = Arc::new(ScriptedTextProvider::new());
    provider.set_refuse_sessions(true);
    let app = app(provider);
    let id = create(&app, "/api/chat").await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/chat/{}/messages", id),
        Some(json!({"message": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["reply"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn chat_reset_and_delete() {
    let app = app(Arc::new(ScriptedTextProvider::new()));
    let id = create(&app, "/api/chat").await;
    let messages = format!("/api/chat/{}/messages", id);
    let history = format!("/api/chat/{}/history", id);

    call(&app, "POST", &messages, Some(json!({"message": "one"}))).await;
    let (status, _) = call(&app, "POST", &format!("/api/chat/{}/reset", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = call(&app, "GET", &history, None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = call(&app, "DELETE", &format!("/api/chat/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", &history, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_conversation_is_not_found() {
    let app = app(Arc::new(ScriptedTextProvider::new()));
    let uri = format!("/api/chat/{}/messages", uuid::Uuid::new_v4());
    let (status, _) = call(&app, "POST", &uri, Some(json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_limit_is_enforced() {
    let app = app_with(
        Arc::new(ScriptedTextProvider::new()),
        json!({"provider": "mock", "max_sessions": 1}),
    );
    create(&app, "/api/chat").await;

    let (status, body) = call(&app, "POST", "/api/chat", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn quick_prompts_listed() {
    let app = app(Arc::new(ScriptedTextProvider::new()));
    let (status, body) = call(&app, "GET", "/api/chat/quick-prompts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prompts"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn triage_analyze_and_follow_up() {
    let provider = Arc::new(ScriptedTextProvider::with_script(vec![
        Ok(r#"{"severity":"low","response":"Probably a tension headache.","recommendations":["Rest"],"suggestions":["How long has it lasted?"],"urgency":"routine","possibleCauses":["tension"]}"#.to_string()),
        Ok("not json at all".to_string()),
    ]));
    let app = app(provider);
    let id = create(&app, "/api/triage").await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/triage/{}/analyze", id),
        Some(json!({"description": "headache"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["severity"], "low");
    assert_eq!(body["urgency"], "routine");
    assert_eq!(body["possibleCauses"], json!(["tension"]));

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/triage/{}/follow-up", id),
        Some(json!({"originalDescription": "headache", "followUp": "with blurred vision"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["severity"], "medium");
    assert_eq!(body["urgency"], "soon");

    let (status, _) = call(&app, "POST", &format!("/api/triage/{}/reset", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "DELETE", &format!("/api/triage/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "DELETE", &format!("/api/triage/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_endpoint_serves_text() {
    use assistant_service::services::metrics;
    metrics::init_metrics().unwrap();
    metrics::record_assistant_reply("reply");
    let app = app(Arc::new(ScriptedTextProvider::new()));
    let (status, body) = call(&app, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("assistant_"));
}

#[tokio::test(start_paused = true)]
async fn idle_conversations_free_their_slots() {
    let app = app_with(
        Arc::new(ScriptedTextProvider::new()),
        json!({"provider": "mock", "max_sessions": 2, "session_idle_ttl_secs": 60}),
    );
    create(&app, "/api/chat").await;
    create(&app, "/api/chat").await;

    let (status, _) = call(&app, "POST", "/api/chat", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    tokio::time::advance(std::time::Duration::from_secs(61)).await;
    create(&app, "/api/chat").await;
    create(&app, "/api/chat").await;
}

#[tokio::test(start_paused = true)]
async fn sweeper_evicts_idle_advisors() {
    let config: AssistantConfig = serde_json::from_value(
        json!({"provider": "mock", "session_idle_ttl_secs": 60}),
    )
    .unwrap();
    let state = AppState::new(&config, Arc::new(ScriptedTextProvider::new()));
    let sweeper = state.spawn_idle_sweeper(std::time::Duration::from_secs(15));
    let app = build_router(state.clone());

    let id = create(&app, "/api/triage").await;
    assert_eq!(state.advisors.len(), 1);

    tokio::time::sleep(std::time::Duration::from_secs(90)).await;

    assert!(state.advisors.is_empty());
    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/triage/{}/analyze", id),
        Some(json!({"description": "cough"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    sweeper.abort();
}
