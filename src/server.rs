//! HTTP server for the chat endpoint.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Chat with optional snippet search (also served at `/`) |
//! | `OPTIONS` | `/api/chat` | CORS preflight, empty `200` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Any other method on the chat path answers `405`.
//!
//! # Error Contract
//!
//! ```json
//! { "success": false, "error": "Nachricht darf nicht leer sein" }
//! ```
//!
//! `400` for an empty message or malformed body, `405` for a wrong method,
//! `500` for internal faults. A `details` field is added to `500` bodies only
//! when error details are enabled (`[server].expose_error_details` or
//! `LUACHAT_ENV=development`).
//!
//! # CORS
//!
//! Every response carries a wildcard origin, the allowed methods and
//! headers, and `Access-Control-Allow-Credentials: true`.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::catalog::catalog_from_config;
use crate::chat::{ChatError, ChatService};
use crate::completion::OpenAiGateway;
use crate::config::Config;
use crate::models::{ChatRequest, ChatResponse, ErrorResponse};
use crate::prompts;

const ALLOW_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";
const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    chat: Arc<ChatService>,
    expose_error_details: bool,
}

/// Build the chat service described by `config`.
///
/// Loads the catalog (builtin or file-backed) and an OpenAI gateway whose
/// credential is resolved once here. A missing credential is not an error:
/// every completion then takes its fallback path.
pub fn build_service(config: &Config) -> anyhow::Result<ChatService> {
    let catalog = catalog_from_config(&config.catalog)?;
    let gateway = OpenAiGateway::from_config(&config.completion)?;
    if !gateway.has_credential() {
        tracing::warn!("no completion API key configured; responses will use fallbacks");
    }
    Ok(ChatService::new(Arc::from(catalog), Arc::new(gateway)))
}

/// Build the router around an existing [`ChatService`].
pub fn build_router(chat: ChatService, expose_error_details: bool) -> Router {
    let state = AppState {
        chat: Arc::new(chat),
        expose_error_details,
    };

    Router::new()
        .route("/api/chat", any(handle_chat))
        .route("/", any(handle_chat))
        .route("/health", get(handle_health))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let chat = build_service(config)?;
    let app = build_router(chat, config.expose_error_details());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("chat server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    body: ErrorResponse,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn method_not_allowed() -> AppError {
    AppError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        body: ErrorResponse::new(prompts::METHOD_NOT_ALLOWED),
    }
}

fn bad_request(message: impl Into<String>, details: Option<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        body: ErrorResponse::new(message).with_details(details),
    }
}

fn internal_error(details: Option<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse::new(prompts::INTERNAL_ERROR).with_details(details),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /api/chat ============

/// Handler for every method on the chat path.
///
/// The body is parsed by hand so that malformed JSON yields the endpoint's
/// own error shape instead of Axum's plain-text rejection. An empty body is
/// treated as `{}` and therefore reported as an empty message.
async fn handle_chat(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if method != Method::POST {
        return method_not_allowed().into_response();
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id);
    match process_chat(&state, &body).instrument(span).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn process_chat(state: &AppState, body: &[u8]) -> Result<ChatResponse, AppError> {
    let request: ChatRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ChatRequest::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| bad_request(prompts::INVALID_BODY, Some(e.to_string())))?
    };

    info!(search = request.search_for_code, "chat request");

    state.chat.handle(request).await.map_err(|e| match e {
        ChatError::Validation(msg) => bad_request(msg, None),
        ChatError::Internal(err) => {
            let detail = format!("{:#}", err);
            error!(error = %detail, "chat request failed");
            internal_error(state.expose_error_details.then_some(detail))
        }
    })
}
