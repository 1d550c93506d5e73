use crate::channels::base::{ReplySender, SentMessage, split_message};
use crate::config::TwilioConfig;
use crate::errors::{RelayError, RelayResult};
use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

type HmacSha1 = Hmac<Sha1>;

const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Twilio rejects message bodies longer than this.
pub const MAX_BODY_LEN: usize = 1600;

/// Prefix `address` with `whatsapp:` unless it already carries it.
pub fn normalize_whatsapp_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.starts_with(WHATSAPP_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{trimmed}")
    }
}

/// Check an `X-Twilio-Signature` header: base64 HMAC-SHA1 of the webhook URL
/// followed by every form parameter as key+value, sorted by key.
pub fn validate_twilio_signature(
    auth_token: &str,
    signature: &str,
    url: &str,
    params: &HashMap<String, String>,
) -> bool {
    // Build the data string: URL, then key+value for each param in key order
    let mut data = url.to_string();
    let mut sorted_keys: Vec<&String> = params.keys().collect();
    sorted_keys.sort();
    for key in sorted_keys {
        data.push_str(key);
        data.push_str(&params[key]);
    }

    let Ok(mut mac) = HmacSha1::new_from_slice(auth_token.as_bytes()) else {
        return false;
    };
    mac.update(data.as_bytes());
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    // Constant-time compare against the header value
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[derive(Debug, Deserialize)]
struct CreateMessageResponse {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Sends WhatsApp messages through the Twilio Messages REST API.
pub struct TwilioSender {
    account_sid: String,
    auth_token: String,
    from: String,
    api_base: String,
    client: reqwest::Client,
}

impl TwilioSender {
    pub fn new(config: &TwilioConfig) -> Self {
        Self::with_client(config, crate::utils::http::default_http_client())
    }

    pub fn with_client(config: &TwilioConfig, client: reqwest::Client) -> Self {
        Self {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: normalize_whatsapp_address(&config.whatsapp_number),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base,
            urlencoding::encode(&self.account_sid)
        )
    }

    fn channel_error(message: impl Into<String>) -> RelayError {
        RelayError::Channel {
            channel: "twilio".to_string(),
            message: message.into(),
        }
    }

    async fn send_chunk(&self, to: &str, body: &str) -> RelayResult<SentMessage> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("Body", body), ("To", to), ("From", self.from.as_str())])
            .send()
            .await
            .map_err(|e| Self::channel_error(format!("error sending request: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        if !status.is_success() {
            return Err(Self::channel_error(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let created: CreateMessageResponse = serde_json::from_str(&text)
            .map_err(|e| Self::channel_error(format!("unexpected response: {e}")))?;
        Ok(SentMessage {
            sid: created.sid.unwrap_or_default(),
            status: created.status.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ReplySender for TwilioSender {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn send(&self, recipient: &str, text: &str) -> RelayResult<SentMessage> {
        let to = normalize_whatsapp_address(recipient);
        let chunks = split_message(text, MAX_BODY_LEN);
        debug!("twilio send: to={}, chunks={}", to, chunks.len());

        let mut last = SentMessage::default();
        for chunk in chunks {
            last = self.send_chunk(&to, &chunk).await?;
            info!("twilio message queued: sid={}, status={}", last.sid, last.status);
        }
        Ok(last)
    }
}
