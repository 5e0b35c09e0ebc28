//! Application startup and lifecycle management.

use crate::config::AssistantConfig;
use crate::handlers::{chat, health, metrics, triage};
use crate::services::providers::TextProvider;
use crate::services::{
    AssistantOptions, ConversationalAssistant, SessionRegistry, SymptomTriageAdvisor,
    TriageOptions,
};
use axum::{
    http::{HeaderName, Request},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn TextProvider>,
    pub assistants: Arc<SessionRegistry<ConversationalAssistant>>,
    pub advisors: Arc<SessionRegistry<SymptomTriageAdvisor>>,
    pub assistant_options: AssistantOptions,
    pub triage_options: TriageOptions,
}

impl AppState {
    pub fn new(config: &AssistantConfig, provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            assistants: Arc::new(SessionRegistry::new(
                config.max_sessions,
                config.session_idle_ttl(),
            )),
            advisors: Arc::new(SessionRegistry::new(
                config.max_sessions,
                config.session_idle_ttl(),
            )),
            assistant_options: config.assistant_options(),
            triage_options: config.triage_options(),
        }
    }

    /// Periodically evict idle conversations and advisors. The task stops
    /// when the returned handle is aborted or the runtime shuts down.
    pub fn spawn_idle_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let assistants = self.assistants.clone();
        let advisors = self.advisors.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                assistants.evict_idle();
                advisors.evict_idle();
            }
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let api = Router::new()
        .route("/chat/quick-prompts", get(chat::quick_prompts))
        .route("/chat", post(chat::create_conversation))
        .route("/chat/:id/messages", post(chat::send_message))
        .route("/chat/:id/history", get(chat::history))
        .route("/chat/:id/reset", post(chat::reset))
        .route("/chat/:id", axum::routing::delete(chat::delete_conversation))
        .route("/triage", post(triage::create_advisor))
        .route("/triage/:id/analyze", post(triage::analyze))
        .route("/triage/:id/follow-up", post(triage::follow_up))
        .route("/triage/:id/reset", post(triage::reset))
        .route("/triage/:id", axum::routing::delete(triage::delete_advisor));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(metrics::metrics))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    sweep_every: Duration,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: AssistantConfig) -> Result<Self, AppError> {
        let provider = config.build_provider()?;
        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            "Initialized text provider"
        );

        Self::build_with_provider(config, provider).await
    }

    /// Build the application around an already constructed provider.
    pub async fn build_with_provider(
        config: AssistantConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(&config, provider);

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Assistant service listening on port {}", port);

        // Sweep a few times per TTL so idle entries do not linger long past it
        let sweep_every = (config.session_idle_ttl() / 4).max(Duration::from_secs(1));

        Ok(Self {
            port,
            listener,
            state,
            sweep_every,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let sweeper = self.state.spawn_idle_sweeper(self.sweep_every);
        let result = axum::serve(self.listener, build_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweeper.abort();
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
