#![warn(clippy::pedantic)]
// Noisy doc/signature lints on every pub function
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Keep format!("{}", x) over format!("{x}")
#![allow(clippy::uninlined_format_args)]
// Byte counts and token counts cross between u64/usize
#![allow(clippy::cast_possible_truncation)]
// providers::anthropic::AnthropicClient and similar
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod gateway;
pub mod media;
pub mod message;
pub mod providers;
pub(crate) mod utils;

/// Re-exports for fuzz targets. Not part of the public API.
#[doc(hidden)]
pub mod fuzz_api {
    pub use crate::channels::twilio::validate_twilio_signature;
    pub use crate::gateway::render_twiml;
    pub use crate::message::{InboundMessage, parse_form};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
