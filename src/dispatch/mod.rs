//! Per-request pipeline: inbound message → (media → encode → analyze) → reply.
//!
//! Every failure inside the pipeline is logged and turned into a fixed
//! user-facing reply; the webhook acknowledgment is always produced.

use crate::channels::ReplySender;
use crate::errors::{RelayError, RelayResult};
use crate::media::encode::encode_file;
use crate::media::{MediaFetcher, is_supported_media_type};
use crate::message::InboundMessage;
use crate::providers::base::{AnalysisProvider, build_invoice_request};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const APOLOGY_REPLY: &str = "Sorry, there was an error processing your image.";
pub const UNSUPPORTED_MEDIA_REPLY: &str = "Sorry, we only support image files (JPEG, PNG, WebP).";
pub const WELCOME_REPLY: &str =
    "Welcome. Please send me a receipt image to extract the data. Thank you!";
pub const EMPTY_MESSAGE_REPLY: &str = "Please send either a text message or an image.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The image was analyzed; carries the extracted text.
    Analyzed(String),
    /// Fetching, encoding or analysis failed.
    AnalysisFailed,
    UnsupportedMedia,
    Welcome,
    Empty,
}

impl DispatchOutcome {
    pub fn reply_text(&self) -> &str {
        match self {
            Self::Analyzed(text) => text,
            Self::AnalysisFailed => APOLOGY_REPLY,
            Self::UnsupportedMedia => UNSUPPORTED_MEDIA_REPLY,
            Self::Welcome => WELCOME_REPLY,
            Self::Empty => EMPTY_MESSAGE_REPLY,
        }
    }
}

pub struct Dispatcher {
    fetcher: Arc<dyn MediaFetcher>,
    provider: Arc<dyn AnalysisProvider>,
    sender: Arc<dyn ReplySender>,
    notify_recipient: Option<String>,
}

impl Dispatcher {
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        provider: Arc<dyn AnalysisProvider>,
        sender: Arc<dyn ReplySender>,
    ) -> Self {
        Self {
            fetcher,
            provider,
            sender,
            notify_recipient: None,
        }
    }

    /// Deliver analysis results to a fixed number instead of the sender.
    /// An empty value keeps the default.
    #[must_use]
    pub fn with_notify_recipient(mut self, recipient: impl Into<String>) -> Self {
        let recipient = recipient.into();
        self.notify_recipient = (!recipient.trim().is_empty()).then_some(recipient);
        self
    }

    pub fn provider(&self) -> &Arc<dyn AnalysisProvider> {
        &self.provider
    }

    pub async fn dispatch(&self, msg: &InboundMessage) -> DispatchOutcome {
        info!(
            "inbound message: sid={}, from={}, num_media={}, media_type={}, received_at={}",
            msg.message_sid,
            msg.from,
            msg.num_media,
            msg.media_type,
            msg.received_at.to_rfc3339()
        );
        if let Ok(details) = serde_json::to_string_pretty(msg) {
            debug!("complete message details: {}", details);
        }

        if msg.has_single_attachment() {
            if !is_supported_media_type(&msg.media_type) {
                warn!("unsupported media type: {}", msg.media_type);
                return DispatchOutcome::UnsupportedMedia;
            }
            return match self.analyze_attachment(msg).await {
                Ok(text) => {
                    self.deliver(msg, &text).await;
                    DispatchOutcome::Analyzed(text)
                }
                Err(e) => {
                    error!(
                        kind = e.kind(),
                        "failed to process image for message {}: {}", msg.message_sid, e
                    );
                    DispatchOutcome::AnalysisFailed
                }
            };
        }

        if msg.body.is_empty() {
            info!("received empty or invalid message");
            DispatchOutcome::Empty
        } else {
            info!("received text message: {}", msg.body);
            DispatchOutcome::Welcome
        }
    }

    async fn analyze_attachment(&self, msg: &InboundMessage) -> RelayResult<String> {
        let path = self
            .fetcher
            .fetch(&msg.media_url, &msg.message_sid, &msg.media_type)
            .await?;
        let encoded = encode_file(&path).await;
        self.fetcher.discard(&path).await;

        let request = build_invoice_request(
            self.provider.model(),
            self.provider.max_tokens(),
            encoded?,
            &msg.media_type,
        );
        let response = self.provider.analyze(&request).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| RelayError::Decode("analysis response has no text content".into()))
    }

    /// Push the result over the chat platform. Failures are logged only.
    async fn deliver(&self, msg: &InboundMessage, text: &str) {
        let recipient = self.notify_recipient.as_deref().unwrap_or(&msg.from);
        if recipient.is_empty() {
            warn!("no recipient for analysis result of {}", msg.message_sid);
            return;
        }
        match self.sender.send(recipient, text).await {
            Ok(sent) => info!(
                "{} reply sent: sid={}, status={}",
                self.sender.name(),
                sent.sid,
                sent.status
            ),
            Err(e) => error!(
                kind = e.kind(),
                "failed to send {} reply: {}",
                self.sender.name(),
                e
            ),
        }
    }
}
