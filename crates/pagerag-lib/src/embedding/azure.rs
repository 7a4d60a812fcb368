//! Azure OpenAI embeddings client.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AzureSettings;
use crate::embedding::Embedder;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: usize = 5;

/// Blocking embeddings client for an Azure OpenAI deployment.
pub struct AzureOpenAiEmbedder {
    client: Client,
    endpoint: String,
    deployment: String,
    max_retries: usize,
}

impl AzureOpenAiEmbedder {
    pub fn new(settings: &AzureSettings) -> Result<Self> {
        anyhow::ensure!(
            !settings.embedding_deployment.trim().is_empty(),
            "missing Azure embedding deployment name"
        );
        let client = azure_client(&settings.api_key, DEFAULT_TIMEOUT)?;
        let endpoint = deployment_url(settings, &settings.embedding_deployment, "embeddings");
        Ok(Self {
            client,
            endpoint,
            deployment: settings.embedding_deployment.clone(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Override the number of attempts made per request.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Embedder for AzureOpenAiEmbedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest { input: text };
            match self.client.post(&self.endpoint).json(&request).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: EmbeddingResponse = resp
                            .json()
                            .context("failed to parse Azure embedding response")?;
                        let embedding = parsed
                            .data
                            .into_iter()
                            .min_by_key(|entry| entry.index)
                            .map(|entry| entry.embedding)
                            .context("Azure returned no embedding")?;
                        debug!(dimension = embedding.len(), "Embedding received");
                        return Ok(embedding);
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!(%status, attempt, "Retrying Azure embedding request");
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    anyhow::bail!("Azure embeddings request failed ({status}): {body}");
                }
                Err(err) => {
                    if is_retryable_error(&err) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!(error = %err, attempt, "Retrying Azure embedding request");
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(err).context("failed to call Azure embeddings");
                }
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.deployment
    }
}

/// Build a blocking client carrying the `api-key` header.
pub(crate) fn azure_client(api_key: &str, timeout: Duration) -> Result<Client> {
    anyhow::ensure!(!api_key.trim().is_empty(), "missing Azure OpenAI API key");
    let mut headers = HeaderMap::new();
    headers.insert(
        "api-key",
        HeaderValue::from_str(api_key.trim()).context("invalid Azure OpenAI API key")?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .context("failed to build Azure OpenAI HTTP client")
}

/// `{endpoint}/openai/deployments/{deployment}/{operation}?api-version=…`
pub(crate) fn deployment_url(settings: &AzureSettings, deployment: &str, operation: &str) -> String {
    format!(
        "{}/openai/deployments/{}/{}?api-version={}",
        settings.endpoint.trim_end_matches('/'),
        deployment,
        operation,
        settings.api_version
    )
}

pub(crate) fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

pub(crate) fn retry_backoff(attempt: usize) -> Duration {
    let capped = u32::try_from(attempt.min(5)).unwrap_or(5);
    Duration::from_millis(500 * (1 << capped))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AzureSettings {
        AzureSettings {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: "secret".to_string(),
            api_version: "2023-05-15".to_string(),
            embedding_deployment: "ada".to_string(),
            chat_deployment: "gpt".to_string(),
        }
    }

    #[test]
    fn endpoint_targets_embedding_deployment() {
        let embedder = AzureOpenAiEmbedder::new(&settings()).unwrap();
        assert_eq!(
            embedder.endpoint(),
            "https://example.openai.azure.com/openai/deployments/ada/embeddings?api-version=2023-05-15"
        );
        assert_eq!(embedder.model_id(), "ada");
    }

    #[test]
    fn blank_key_is_rejected() {
        let mut s = settings();
        s.api_key = "  ".to_string();
        assert_eq!(
            AzureOpenAiEmbedder::new(&s).err().unwrap().to_string(),
            "missing Azure OpenAI API key"
        );
    }

    #[test]
    fn retries_only_throttling_and_server_errors() {
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::BAD_GATEWAY));
        assert!(!should_retry(StatusCode::UNAUTHORIZED));
        assert!(!should_retry(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(retry_backoff(1), Duration::from_millis(1000));
        assert_eq!(retry_backoff(2), Duration::from_millis(2000));
        assert_eq!(retry_backoff(5), Duration::from_millis(16_000));
        assert_eq!(retry_backoff(50), Duration::from_millis(16_000));
    }

    #[test]
    fn response_picks_lowest_index() {
        let parsed: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"embedding":[0.5],"index":1},{"embedding":[0.25,0.75],"index":0}]}"#,
        )
        .unwrap();
        let first = parsed.data.into_iter().min_by_key(|e| e.index).unwrap();
        assert_eq!(first.embedding, vec![0.25, 0.75]);
    }
}
