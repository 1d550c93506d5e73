use crate::errors::{RelayError, RelayResult};
use crate::providers::base::AnalysisResponse;
use reqwest::header::HeaderMap;
use tracing::{error, warn};

/// Status the Messages API returns on success. Any other status, 2xx
/// included, is treated as a failure.
const SUCCESS_STATUS: u16 = 200;

/// Common response handling for the analysis API.
///
/// Functions are designed to be used as static methods.
pub struct ProviderErrorHandler;

impl ProviderErrorHandler {
    /// Read the full body, then interpret status and payload.
    pub async fn check_response(
        resp: reqwest::Response,
        provider: &str,
    ) -> RelayResult<AnalysisResponse> {
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| RelayError::io(&format!("reading {provider} response"), e))?;
        Self::interpret(status, &headers, &body, provider)
    }

    /// Order of checks: HTTP status, then JSON decoding, then the embedded
    /// `error` object. An embedded error wins over a 200 status.
    pub fn interpret(
        status: u16,
        headers: &HeaderMap,
        body: &str,
        provider: &str,
    ) -> RelayResult<AnalysisResponse> {
        if status != SUCCESS_STATUS {
            Self::log_diagnostics(status, headers, body, provider);
            return Err(RelayError::ApiStatus {
                status,
                body: body.to_string(),
            });
        }

        let response: AnalysisResponse = serde_json::from_str(body).map_err(|e| {
            error!("{} response is not valid JSON: {}", provider, e);
            RelayError::Decode(format!("parsing {provider} response: {e}"))
        })?;

        if let Some(api_error) = &response.error {
            error!(
                "{} returned error payload: {} - {}",
                provider, api_error.kind, api_error.message
            );
            return Err(RelayError::Api {
                kind: api_error.kind.clone(),
                message: api_error.message.clone(),
            });
        }

        Ok(response)
    }

    /// Surface headers and the raw body of a failed call for operators.
    pub fn log_diagnostics(status: u16, headers: &HeaderMap, body: &str, provider: &str) {
        let header_lines: Vec<String> = headers
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
            .collect();
        warn!(
            "{} returned non-200 status {}; headers: [{}]",
            provider,
            status,
            header_lines.join(", ")
        );
        if let Ok(parsed) = serde_json::from_str::<AnalysisResponse>(body)
            && let Some(api_error) = parsed.error
        {
            warn!(
                "{} error payload: {} - {}",
                provider, api_error.kind, api_error.message
            );
        }
        warn!("{} response body: {}", provider, body);
    }
}
