use crate::errors::RelayResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Instruction sent alongside every invoice image.
pub const INVOICE_PROMPT: &str = "This image is an invoice. Extract key invoice details in JSON format. Do not include any other text.";

/// Base64 image payload of an image content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Always `"base64"`.
    #[serde(rename = "type")]
    pub encoding: String,
    pub media_type: String,
    pub data: String,
}

impl ImageSource {
    pub fn base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            encoding: "base64".to_string(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

/// One tagged unit of a request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: "user".into(),
            content,
        }
    }
}

/// Body of a Messages API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

impl AnalysisRequest {
    /// Content blocks of the first (and only) message.
    pub fn content_blocks(&self) -> &[ContentBlock] {
        self.messages
            .first()
            .map(|m| m.content.as_slice())
            .unwrap_or_default()
    }
}

/// Build the invoice extraction request: the image block first, then the
/// fixed instruction text.
pub fn build_invoice_request(
    model: &str,
    max_tokens: u32,
    base64_image: String,
    media_type: &str,
) -> AnalysisRequest {
    AnalysisRequest {
        model: model.to_string(),
        max_tokens,
        messages: vec![Message::user(vec![
            ContentBlock::Image {
                source: ImageSource::base64(media_type, base64_image),
            },
            ContentBlock::Text {
                text: INVOICE_PROMPT.to_string(),
            },
        ])],
    }
}

/// Content block of an API response. Anything that is not text is kept as
/// `Other` so unexpected block types don't fail decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Error object carried in an API response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// Decoded Messages API response.
///
/// When `error` is present the remaining fields are not meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

impl AnalysisResponse {
    /// Text of the first content entry, if that entry is a text block.
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first()? {
            ResponseBlock::Text { text } => Some(text.as_str()),
            ResponseBlock::Other => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderMetrics {
    pub request_count: u64,
    pub error_count: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> RelayResult<AnalysisResponse>;

    fn model(&self) -> &str;

    fn max_tokens(&self) -> u32;

    /// Accumulated request/error/token counters.
    /// Default returns zeroed metrics for providers that don't track them.
    fn metrics(&self) -> ProviderMetrics {
        ProviderMetrics::default()
    }
}
