use crate::config::AnalysisConfig;
use crate::errors::{RelayError, RelayResult};
use crate::providers::base::{AnalysisProvider, AnalysisRequest, AnalysisResponse, ProviderMetrics};
use crate::providers::errors::ProviderErrorHandler;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const PROVIDER_NAME: &str = "Anthropic";

/// Messages API client used for invoice extraction.
pub struct AnthropicClient {
    api_key: String,
    model: String,
    endpoint: String,
    api_version: String,
    max_tokens: u32,
    client: Client,
    metrics: Arc<Mutex<ProviderMetrics>>,
}

impl AnthropicClient {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self::with_client(
            config,
            crate::utils::http::client_with_timeouts(
                config.connect_timeout_secs,
                config.timeout_secs,
            ),
        )
    }

    pub fn with_client(config: &AnalysisConfig, client: Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            api_version: config.api_version.clone(),
            max_tokens: config.max_tokens,
            client,
            metrics: Arc::new(Mutex::new(ProviderMetrics::default())),
        }
    }

    fn record(&self, result: &RelayResult<AnalysisResponse>) {
        let Ok(mut metrics) = self.metrics.lock() else {
            return;
        };
        metrics.request_count += 1;
        match result {
            Ok(resp) => {
                if let Some(usage) = &resp.usage {
                    metrics.input_tokens += usage.input_tokens;
                    metrics.output_tokens += usage.output_tokens;
                }
            }
            Err(_) => metrics.error_count += 1,
        }
    }
}

#[async_trait]
impl AnalysisProvider for AnthropicClient {
    async fn analyze(&self, request: &AnalysisRequest) -> RelayResult<AnalysisResponse> {
        debug!(
            "anthropic analyze: model={}, blocks={}",
            request.model,
            request.content_blocks().len()
        );
        let start = std::time::Instant::now();

        let result = match self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(resp) => ProviderErrorHandler::check_response(resp, PROVIDER_NAME).await,
            Err(e) => Err(RelayError::io("sending request to Anthropic API", e)),
        };

        self.record(&result);
        if let Ok(resp) = &result {
            info!(
                "anthropic analysis complete: id={}, stop_reason={:?}, elapsed_ms={}",
                resp.id.as_deref().unwrap_or("-"),
                resp.stop_reason,
                start.elapsed().as_millis()
            );
        }
        result
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn metrics(&self) -> ProviderMetrics {
        self.metrics
            .lock()
            .map_or_else(|_| ProviderMetrics::default(), |m| m.clone())
    }
}
