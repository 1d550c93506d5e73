pub mod base;
pub mod twilio;

pub use base::{ReplySender, SentMessage};
pub use twilio::TwilioSender;
