// Shared test helpers; not every test binary uses every item.
#![allow(unused)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use receipt_relay::channels::TwilioSender;
use receipt_relay::config::Config;
use receipt_relay::dispatch::Dispatcher;
use receipt_relay::gateway::{AppState, build_router};
use receipt_relay::media::MediaStore;
use receipt_relay::providers::anthropic::AnthropicClient;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;

pub const SENDER: &str = "whatsapp:+15551234567";
pub const RELAY_NUMBER: &str = "+14155238886";
pub const ACCOUNT_SID: &str = "AC123";
pub const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC123/Messages.json";
pub const ANALYSIS_PATH: &str = "/v1/messages";

/// Config wired to mock Anthropic and Twilio servers, storing media in `media_dir`.
pub fn relay_config(media_dir: &Path, anthropic: &MockServer, twilio: &MockServer) -> Config {
    let mut config = Config::default();
    config.analysis.api_key = "test-key".to_string();
    config.analysis.endpoint = format!("{}{}", anthropic.uri(), ANALYSIS_PATH);
    config.twilio.account_sid = ACCOUNT_SID.to_string();
    config.twilio.auth_token = "token".to_string();
    config.twilio.whatsapp_number = RELAY_NUMBER.to_string();
    config.twilio.api_base = twilio.uri();
    config.media.dir = media_dir.to_string_lossy().into_owned();
    config
}

/// Assemble the full relay the same way `serve` does.
pub fn build_app(config: &Config) -> Router {
    let store = Arc::new(MediaStore::new(&config.media));
    let provider = Arc::new(AnthropicClient::new(&config.analysis));
    let sender = Arc::new(TwilioSender::new(&config.twilio));
    let dispatcher = Dispatcher::new(store, provider, sender)
        .with_notify_recipient(config.twilio.notify_number.clone());
    let state = AppState::from_config(Arc::new(dispatcher), &config.twilio);
    build_router(state, &config.server.webhook_path)
}

pub fn form(pairs: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

pub fn image_form(sid: &str, media_url: &str, media_type: &str) -> String {
    form(&[
        ("From", SENDER),
        ("To", "whatsapp:+14155238886"),
        ("MessageSid", sid),
        ("NumMedia", "1"),
        ("MediaUrl0", media_url),
        ("MediaContentType0", media_type),
    ])
}

pub async fn post_webhook(app: Router, body: String) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("build request");
    let resp = app.oneshot(req).await.expect("router response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
}

pub fn twiml(text: &str) -> String {
    receipt_relay::gateway::render_twiml(text)
}

/// A successful Messages API response carrying `text`.
pub fn analysis_response(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-opus-20240229",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 1500, "output_tokens": 40}
    })
}

pub fn twilio_created() -> serde_json::Value {
    json!({"sid": "SMout", "status": "queued"})
}

pub fn files_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
