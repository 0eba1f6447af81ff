//! HTTP handlers for the chat, insights and health routes.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, instrument, Instrument};
use uuid::Uuid;

use super::state::AppState;

/// Tokens buffered between the relay task and the response body
const RELAY_CHANNEL_CAPACITY: usize = 64;

/// `POST /api/claude` body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User prompt; missing or blank is a 400
    #[serde(default)]
    pub prompt: Option<String>,
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// `POST /api/claude`: stream the model reply as plain text
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let Some(prompt) = request.prompt.filter(|p| !p.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing prompt").into_response();
    };

    let Some(relay) = state.relay.clone() else {
        error!("chat requested but no model API key is configured");
        return internal_error();
    };

    let stream = match relay.open(&prompt).await {
        Ok(stream) => stream,
        Err(err) => {
            error!(error = %err, "failed to open model stream");
            return internal_error();
        }
    };

    let (tx, rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);
    tokio::spawn(
        async move {
            let end = relay.pump(stream, tx).await;
            debug!(?end, "chat relay finished");
        }
        .in_current_span(),
    );

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

/// `POST /api/captain-insights`: forward UI data to the agent
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn captain_insights(State(state): State<AppState>, Json(data): Json<Value>) -> Response {
    info!("received captain insights request");

    match state.gateway.analyze(data).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            error!(error = %err, "failed to process captain insights request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": err.to_string(),
                    "timestamp": Utc::now(),
                    "success": false
                })),
            )
                .into_response()
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "service": state.service_name
    }))
}
