use crate::errors::RelayError;
use serde::{Deserialize, Serialize};

/// Generate a `Debug` impl that redacts sensitive fields.
///
/// Usage:
/// ```ignore
/// redact_debug!(StructName,
///     normal_field,
///     redact(secret_field),
/// );
/// ```
///
/// - `field`: printed normally via `Debug`
/// - `redact(field)`: `String` field: prints `"[empty]"` or `"[REDACTED]"`
macro_rules! redact_debug {
    (@field $builder:ident, $self:ident, redact($field:ident)) => {
        $builder.field(
            stringify!($field),
            &if $self.$field.is_empty() {
                "[empty]"
            } else {
                "[REDACTED]"
            },
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };

    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };

    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Analysis API
// ---------------------------------------------------------------------------

pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_analysis_timeout_secs() -> u64 {
    120
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_api_version", rename = "apiVersion")]
    pub api_version: String,
    #[serde(default = "default_max_tokens", rename = "maxTokens")]
    pub max_tokens: u32,
    #[serde(
        default = "default_connect_timeout_secs",
        rename = "connectTimeoutSecs"
    )]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_analysis_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            endpoint: default_endpoint(),
            api_version: default_api_version(),
            max_tokens: default_max_tokens(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_analysis_timeout_secs(),
        }
    }
}

redact_debug!(
    AnalysisConfig,
    redact(api_key),
    model,
    endpoint,
    api_version,
    max_tokens,
    connect_timeout_secs,
    timeout_secs,
);

// ---------------------------------------------------------------------------
// Twilio
// ---------------------------------------------------------------------------

pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

fn default_twilio_api_base() -> String {
    DEFAULT_TWILIO_API_BASE.to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default, rename = "accountSid")]
    pub account_sid: String,
    #[serde(default, rename = "authToken")]
    pub auth_token: String,
    /// Sender number, without the `whatsapp:` prefix.
    #[serde(default, rename = "whatsappNumber")]
    pub whatsapp_number: String,
    /// Recipient of analysis results and the startup greeting. Empty means
    /// results go back to the sender of the image.
    #[serde(default, rename = "notifyNumber")]
    pub notify_number: String,
    #[serde(default = "default_twilio_api_base", rename = "apiBase")]
    pub api_base: String,
    #[serde(default, rename = "validateSignature")]
    pub validate_signature: bool,
    /// Public URL Twilio posts to; required for signature validation.
    #[serde(default, rename = "webhookUrl")]
    pub webhook_url: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            whatsapp_number: String::new(),
            notify_number: String::new(),
            api_base: default_twilio_api_base(),
            validate_signature: false,
            webhook_url: String::new(),
        }
    }
}

redact_debug!(
    TwilioConfig,
    redact(account_sid),
    redact(auth_token),
    whatsapp_number,
    notify_number,
    api_base,
    validate_signature,
    webhook_url,
);

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_webhook_path", rename = "webhookPath")]
    pub webhook_path: String,
    #[serde(default = "default_true", rename = "startupGreeting")]
    pub startup_greeting: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
            startup_greeting: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Media storage
// ---------------------------------------------------------------------------

fn default_media_dir() -> String {
    "media".to_string()
}

fn default_media_max_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_media_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_dir")]
    pub dir: String,
    /// Keep downloaded files after analysis. When false the file is removed
    /// as soon as it has been encoded.
    #[serde(default, rename = "keepFiles")]
    pub keep_files: bool,
    /// Prune kept files older than this at startup. 0 disables pruning.
    #[serde(default, rename = "maxAgeHours")]
    pub max_age_hours: u64,
    #[serde(default = "default_media_max_bytes", rename = "maxBytes")]
    pub max_bytes: u64,
    #[serde(default = "default_media_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
            keep_files: false,
            max_age_hours: 0,
            max_bytes: default_media_max_bytes(),
            timeout_secs: default_media_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

impl Config {
    pub fn validate(&self) -> Result<(), RelayError> {
        self.validate_analysis()?;
        self.validate_twilio()?;
        self.validate_server()?;
        self.validate_media()?;
        Ok(())
    }

    fn validate_analysis(&self) -> Result<(), RelayError> {
        let a = &self.analysis;
        if a.max_tokens == 0 {
            return Err(RelayError::Config("analysis.maxTokens must be > 0".into()));
        }
        if a.max_tokens > 1_000_000 {
            return Err(RelayError::Config(
                "analysis.maxTokens is unreasonably large (> 1,000,000)".into(),
            ));
        }
        if a.model.trim().is_empty() {
            return Err(RelayError::Config("analysis.model must not be empty".into()));
        }
        if a.api_version.trim().is_empty() {
            return Err(RelayError::Config(
                "analysis.apiVersion must not be empty".into(),
            ));
        }
        if !is_http_url(&a.endpoint) {
            return Err(RelayError::Config(format!(
                "analysis.endpoint is not an http(s) URL: {}",
                a.endpoint
            )));
        }
        Ok(())
    }

    fn validate_twilio(&self) -> Result<(), RelayError> {
        let t = &self.twilio;
        if !is_http_url(&t.api_base) {
            return Err(RelayError::Config(format!(
                "twilio.apiBase is not an http(s) URL: {}",
                t.api_base
            )));
        }
        if t.validate_signature && t.webhook_url.is_empty() {
            return Err(RelayError::Config(
                "twilio.validateSignature requires twilio.webhookUrl".into(),
            ));
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), RelayError> {
        let s = &self.server;
        if s.port == 0 {
            return Err(RelayError::Config("server.port must be > 0".into()));
        }
        if !s.webhook_path.starts_with('/') {
            return Err(RelayError::Config(format!(
                "server.webhookPath must start with '/': {}",
                s.webhook_path
            )));
        }
        Ok(())
    }

    fn validate_media(&self) -> Result<(), RelayError> {
        if self.media.max_bytes == 0 {
            return Err(RelayError::Config("media.maxBytes must be > 0".into()));
        }
        if self.media.dir.trim().is_empty() {
            return Err(RelayError::Config("media.dir must not be empty".into()));
        }
        Ok(())
    }
}
