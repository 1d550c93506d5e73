use super::schema::Config;
use tracing::{debug, warn};

macro_rules! define_credentials {
    ($( $name:literal, $env:literal => $($path:ident).+ );* $(;)?) => {
        /// (slot name, env var name) pairs.
        pub const CREDENTIAL_ENV_VARS: &[(&str, &str)] = &[$(($name, $env)),*];

        /// Apply overrides from an arbitrary variable source.
        ///
        /// Any variable that is set and non-empty overwrites the corresponding
        /// config field.
        pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
        where
            F: Fn(&str) -> Option<String>,
        {
            $(
                if let Some(val) = lookup($env) {
                    if !val.is_empty() {
                        debug!("config override from {}", $env);
                        config.$($path).+ = val;
                    }
                }
            )*
            apply_port_override(config, &lookup);
        }
    };
}

define_credentials! {
    // Analysis API
    "claude-api-key",         "CLAUDE_API_KEY"         => analysis.api_key;
    "claude-model",           "CLAUDE_MODEL"           => analysis.model;
    "claude-api-endpoint",    "CLAUDE_API_ENDPOINT"    => analysis.endpoint;
    "claude-api-version",     "CLAUDE_API_VERSION"     => analysis.api_version;
    // Twilio
    "twilio-account-sid",     "TWILIO_ACCOUNT_SID"     => twilio.account_sid;
    "twilio-auth-token",      "TWILIO_AUTH_TOKEN"      => twilio.auth_token;
    "twilio-whatsapp-number", "TWILIO_WHATSAPP_NUMBER" => twilio.whatsapp_number;
    "whatsapp-number",        "WHATSAPP_NUMBER"        => twilio.notify_number;
}

fn apply_port_override<F>(config: &mut Config, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup("PORT") else {
        return;
    };
    if raw.is_empty() {
        return;
    }
    match raw.trim().parse::<u16>() {
        Ok(port) => config.server.port = port,
        Err(_) => warn!("ignoring invalid PORT value: {}", raw),
    }
}

/// Env vars from the override table (plus `PORT`) that are currently set and
/// non-empty. Names only; values are never returned.
pub fn set_overrides_from<F>(lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    CREDENTIAL_ENV_VARS
        .iter()
        .map(|(_, env)| *env)
        .chain(std::iter::once("PORT"))
        .filter(|env| lookup(env).is_some_and(|v| !v.is_empty()))
        .collect()
}

pub fn set_env_overrides() -> Vec<&'static str> {
    set_overrides_from(|name| std::env::var(name).ok())
}

/// Apply environment variable overrides.
///
/// Secrets are usually injected this way (or through a `.env` file loaded
/// beforehand) rather than written to the config file.
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

#[cfg(test)]
mod tests;
