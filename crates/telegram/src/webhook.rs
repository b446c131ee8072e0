//! Webhook transport: an axum listener that feeds Telegram pushes into the
//! dispatch channel. Handler behavior is identical to long polling; only
//! delivery differs.

use {
    axum::{
        Json, Router,
        extract::State,
        http::StatusCode,
        routing::{get, post},
    },
    teloxide::types::Update,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::config::WebhookConfig;

#[derive(Clone)]
struct WebhookState {
    tx: mpsc::Sender<Update>,
}

#[must_use]
pub fn router(tx: mpsc::Sender<Update>) -> Router {
    Router::new()
        .route("/webhook", post(receive_update))
        .route("/health", get(health))
        .with_state(WebhookState { tx })
}

async fn receive_update(
    State(state): State<WebhookState>,
    Json(update): Json<Update>,
) -> StatusCode {
    debug!(update_id = update.id.0, "webhook update received");
    if state.tx.send(update).await.is_err() {
        warn!("dispatch channel closed, dropping webhook update");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Bind and serve until the token is cancelled.
pub async fn serve(config: WebhookConfig, tx: mpsc::Sender<Update>, cancel: CancellationToken) {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!(addr = %addr, error = %e, "failed to bind webhook listener");
            cancel.cancel();
            return;
        },
    };
    info!(addr = %addr, "webhook listener started");

    let shutdown = cancel.clone();
    if let Err(e) = axum::serve(listener, router(tx))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    {
        warn!(error = %e, "webhook server error");
    }
}
