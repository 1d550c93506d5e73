use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// `NumMedia` value for a message carrying exactly one attachment. Only the
/// first attachment slot (`MediaUrl0`) is ever inspected.
pub const SINGLE_ATTACHMENT: &str = "1";

/// A WhatsApp message as delivered by the Twilio webhook.
///
/// Fields keep the raw form values; absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InboundMessage {
    pub from: String,
    pub to: String,
    pub body: String,
    pub message_sid: String,
    pub num_media: String,
    pub media_url: String,
    pub media_type: String,
    /// When the webhook delivered the message to us.
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn from_form(params: &HashMap<String, String>) -> Self {
        let field = |key: &str| params.get(key).cloned().unwrap_or_default();
        Self {
            from: field("From"),
            to: field("To"),
            body: field("Body"),
            message_sid: field("MessageSid"),
            num_media: field("NumMedia"),
            media_url: field("MediaUrl0"),
            media_type: field("MediaContentType0"),
            received_at: Utc::now(),
        }
    }

    /// Parse a form-encoded webhook body. Never fails: malformed pairs are
    /// decoded leniently and missing fields stay empty.
    pub fn from_form_body(body: &[u8]) -> Self {
        Self::from_form(&parse_form(body))
    }

    pub fn has_single_attachment(&self) -> bool {
        self.num_media.trim() == SINGLE_ATTACHMENT
    }
}

/// Decode a form-encoded body into a map. Later duplicates win.
pub fn parse_form(body: &[u8]) -> HashMap<String, String> {
    form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
