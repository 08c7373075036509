use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{error_message, Content, GenerateContentRequest, GenerateContentResponse};
use super::AnalysisProvider;
use crate::config::{AnalysisConfig, RequestConfig};
use crate::error::{AnalysisError, AnalysisResult};
use crate::prompts::{analysis_request, ASSESSMENT_ANALYSIS_PROMPT};
use crate::scoring::CategoryScores;
use crate::suggestions::SuggestionObject;

/// Client for the Gemini `generateContent` API
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    request_config: RequestConfig,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &AnalysisConfig, request_config: RequestConfig) -> AnalysisResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(AnalysisError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            request_config,
        })
    }

    /// Run a generation request, retrying transient failures with exponential backoff
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> AnalysisResult<GenerateContentResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(backoff_ms(
                    self.request_config.retry_delay_ms,
                    retries,
                ));
                warn!(
                    model = %self.model,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying analysis request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, request).await {
                Ok(response) => {
                    let usage = response.usage_metadata.as_ref();
                    info!(
                        model = %self.model,
                        latency_ms = start.elapsed().as_millis(),
                        prompt_tokens = usage.and_then(|u| u.prompt_token_count),
                        completion_tokens = usage.and_then(|u| u.candidates_token_count),
                        total_tokens = usage.and_then(|u| u.total_token_count),
                        "Analysis call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        model = %self.model,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Analysis call failed"
                    );
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(AnalysisError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries: self.request_config.max_retries,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        request: &GenerateContentRequest,
    ) -> AnalysisResult<GenerateContentResponse> {
        debug!(
            model = %self.model,
            contents = request.contents.len(),
            "Calling analysis provider"
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    AnalysisError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message: error_message(&error_body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the configured model
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Delay before retry number `retry` (1-based), doubling each time and
/// saturating at `u64::MAX`.
fn backoff_ms(base_ms: u64, retry: u32) -> u64 {
    base_ms.saturating_mul(2_u64.saturating_pow(retry.saturating_sub(1)))
}

#[async_trait]
impl AnalysisProvider for GeminiClient {
    async fn analyze(&self, scores: &CategoryScores) -> AnalysisResult<SuggestionObject> {
        let request = GenerateContentRequest::new(vec![Content::user(analysis_request(scores))])
            .with_system_instruction(ASSESSMENT_ANALYSIS_PROMPT)
            .with_json_output()
            .with_temperature(0.7)
            .with_max_output_tokens(1024);

        self.generate(&request).await?.into_suggestion_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = AnalysisConfig {
            api_key: "test_key".to_string(),
            base_url: "https://generativelanguage.googleapis.com/".to_string(),
            model: "gemini-1.5-flash".to_string(),
        };

        let client = GeminiClient::new(&config, RequestConfig::default()).unwrap();
        assert_eq!(client.base_url(), "https://generativelanguage.googleapis.com");
        assert_eq!(client.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 4), 4000);
    }

    #[test]
    fn test_backoff_saturates_instead_of_overflowing() {
        assert_eq!(backoff_ms(0, 70), 0);
        assert_eq!(backoff_ms(10, 70), u64::MAX);
        assert_eq!(backoff_ms(u64::MAX, 2), u64::MAX);
        assert_eq!(backoff_ms(1, 64), 1 << 63);
        assert_eq!(backoff_ms(1, 65), u64::MAX);
    }
}
