use reqwest::Client;
use std::time::Duration;

/// Build a `reqwest::Client` with the given connect and overall timeouts.
///
/// Falls back to the default client if the builder fails.
pub fn client_with_timeouts(connect_secs: u64, total_secs: u64) -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_secs))
        .timeout(Duration::from_secs(total_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Build a `reqwest::Client` with standard timeouts (10 s connect, 30 s overall).
pub fn default_http_client() -> Client {
    client_with_timeouts(10, 30)
}

#[cfg(test)]
mod tests;
