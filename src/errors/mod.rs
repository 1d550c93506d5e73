use thiserror::Error;

/// Typed error hierarchy for the relay.
///
/// Use at component boundaries (media retrieval, analysis calls, reply delivery,
/// config validation). Leaf functions can keep using `anyhow::Result`; the
/// `Internal` variant allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Filesystem or network transport failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// The analysis API answered with a non-success HTTP status.
    #[error("API returned non-200 status: {status}, body: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Failed to decode API response: {0}")]
    Decode(String),

    /// Structured error payload returned by the analysis API.
    #[error("API error: {kind} - {message}")]
    Api { kind: String, message: String },

    #[error("Channel error: {channel}: {message}")]
    Channel { channel: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience alias for results using `RelayError`.
pub type RelayResult<T> = std::result::Result<T, RelayError>;

impl RelayError {
    pub(crate) fn io(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Io(format!("{context}: {err}"))
    }

    /// Short stable label, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::ApiStatus { .. } => "api_status",
            Self::Decode(_) => "decode",
            Self::Api { .. } => "api",
            Self::Channel { .. } => "channel",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests;
