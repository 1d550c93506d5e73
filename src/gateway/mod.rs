/// HTTP server for the inbound webhook.
///
/// The webhook endpoint always acknowledges with a 200 TwiML document once
/// the request has been accepted; pipeline failures only change the reply
/// text. The only non-200 answers are for oversized payloads and, when
/// enabled, bad request signatures.
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{debug, info, warn};

use crate::channels::twilio::validate_twilio_signature;
use crate::config::TwilioConfig;
use crate::dispatch::Dispatcher;
use crate::message::{InboundMessage, parse_form};

/// Max webhook payload size: 1 MB.
const WEBHOOK_MAX_BODY: usize = 1_048_576;

const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Credentials for checking `X-Twilio-Signature` on inbound requests.
#[derive(Clone)]
struct SignatureCheck {
    auth_token: String,
    webhook_url: String,
}

/// Shared state between HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    signature: Option<Arc<SignatureCheck>>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            signature: None,
        }
    }

    /// Require a valid request signature computed against `webhook_url`.
    #[must_use]
    pub fn with_signature_check(
        mut self,
        auth_token: impl Into<String>,
        webhook_url: impl Into<String>,
    ) -> Self {
        self.signature = Some(Arc::new(SignatureCheck {
            auth_token: auth_token.into(),
            webhook_url: webhook_url.into(),
        }));
        self
    }

    pub fn from_config(dispatcher: Arc<Dispatcher>, twilio: &TwilioConfig) -> Self {
        let state = Self::new(dispatcher);
        if twilio.validate_signature {
            state.with_signature_check(&twilio.auth_token, &twilio.webhook_url)
        } else {
            state
        }
    }
}

/// Wrap reply text in the acknowledgment markup the platform expects.
pub fn render_twiml(text: &str) -> String {
    format!(
        "<Response><Message>{}</Message></Response>",
        html_escape::encode_text(text)
    )
}

fn twiml_response(text: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        render_twiml(text),
    )
        .into_response()
}

/// Build the HTTP router.
pub fn build_router(state: AppState, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// GET /health: health check endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let provider = state.dispatcher.provider();
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "model": provider.model(),
        "analysis": provider.metrics(),
    }))
}

/// POST {webhook path}: inbound message from the chat platform.
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.len() > WEBHOOK_MAX_BODY {
        warn!("webhook: payload too large ({} bytes)", body.len());
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    }

    let params = parse_form(&body);

    if let Some(check) = &state.signature {
        let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
            warn!("webhook: missing signature header");
            return StatusCode::FORBIDDEN.into_response();
        };
        if !validate_twilio_signature(&check.auth_token, signature, &check.webhook_url, &params) {
            warn!("webhook: invalid signature");
            return StatusCode::FORBIDDEN.into_response();
        }
        debug!("webhook: signature valid");
    }

    let msg = InboundMessage::from_form(&params);
    let outcome = state.dispatcher.dispatch(&msg).await;
    debug!("webhook {}: outcome={:?}", msg.message_sid, outcome);
    twiml_response(outcome.reply_text())
}

/// Bind `host:port` and serve `app` until Ctrl-C or SIGTERM.
pub async fn serve(host: &str, port: u16, app: Router) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("webhook server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server error")?;

    info!("webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
