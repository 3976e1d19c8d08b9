//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, SiliconFlow, DeepSeek, LM Studio and any other
//! endpoint that speaks `/chat/completions`.
//!
//! Supports:
//! - Chat completions (non-streaming and streaming SSE)
//! - Tool use / function calling
//! - Retry of transient failures, waiting out `Retry-After` on rate limits

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use steward_core::error::ProviderError;
use steward_core::provider::*;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::wire::{self, ApiResponse, StreamResponse};

/// Retry budget for a single request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts including the first one; at least 1
    pub max_attempts: u32,
    /// Sleep between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// How long to wait before retrying after `error`. A rate limit waits
    /// at least as long as the server asked.
    pub fn delay_for(&self, error: &ProviderError) -> Duration {
        match error {
            ProviderError::RateLimited { retry_after_secs } => {
                Duration::from_secs(*retry_after_secs).max(self.delay)
            }
            _ => self.delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to configure HTTP client, using defaults");
            reqwest::Client::new()
        })
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: build_client(Duration::from_secs(120)),
            retry: RetryPolicy::default(),
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    pub fn siliconflow(api_key: impl Into<String>) -> Self {
        Self::new("siliconflow", "https://api.siliconflow.cn/v1", api_key)
    }

    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self::new("deepseek", "https://api.deepseek.com", api_key)
    }

    /// A local LM Studio server (convenience constructor).
    pub fn local(base_url: Option<&str>) -> Self {
        Self::new(
            "local",
            base_url.unwrap_or("http://127.0.0.1:1234/v1"),
            "lm-studio", // LM Studio ignores the key but wants one
        )
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            delay: retry.delay,
        };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": wire::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": stream,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(wire::to_api_tools(&request.tools));
        }

        if stream {
            body["stream_options"] = serde_json::json!({ "include_usage": true });
        }

        body
    }

    /// Run `attempt` until it succeeds, fails permanently, or the retry
    /// budget is spent.
    async fn with_retries<T, F, Fut>(&self, mut attempt: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ProviderError>>,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && tries < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(&e);
                    warn!(
                        provider = %self.name,
                        attempt = tries,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send one request and map non-success statuses to errors.
    async fn send(&self, body: &serde_json::Value, sse: bool) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        if sse {
            builder = builder.header("Accept", "text/event-stream");
        }

        let response = builder.json(body).send().await.map_err(map_reqwest_error)?;
        check_status(response).await
    }

    async fn complete_once(&self, body: &serde_json::Value) -> Result<ProviderResponse, ProviderError> {
        let response = self.send(body, false).await?;

        let text = response.text().await.map_err(map_reqwest_error)?;
        let api_response: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        Ok(ProviderResponse {
            message: wire::from_api_message(choice.message),
            usage: api_response.usage.map(Usage::from),
            model: api_response.model,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(5);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ));
    }

    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "Provider returned error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}

/// Splits an SSE byte stream into `data:` payloads.
///
/// Bytes are buffered until a newline so multi-byte characters split
/// across network chunks decode intact.
#[derive(Debug, Default)]
struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            // Skip empty lines and SSE comments
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim().to_string());
            }
        }
        payloads
    }
}

/// Pump an SSE response into `tx` until `[DONE]`, end of body, or the
/// receiver goes away. Dropping `tx` ends the stream for the consumer.
async fn pump_sse(
    provider_name: String,
    response: reqwest::Response,
    tx: mpsc::Sender<Result<StreamEvent, ProviderError>>,
) {
    let mut byte_stream = response.bytes_stream();
    let mut sse = SseBuffer::default();

    while let Some(chunk_result) = byte_stream.next().await {
        let bytes = match chunk_result {
            Ok(b) => b,
            Err(e) => {
                let _ = tx
                    .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                    .await;
                return;
            }
        };

        for data in sse.push(&bytes) {
            if data == "[DONE]" {
                return;
            }

            match serde_json::from_str::<StreamResponse>(&data) {
                Ok(chunk) => {
                    let event = chunk.into_event();
                    if event.is_empty() {
                        continue;
                    }
                    if tx.send(Ok(event)).await.is_err() {
                        return; // receiver dropped
                    }
                }
                Err(e) => {
                    trace!(
                        provider = %provider_name,
                        data = %data,
                        error = %e,
                        "Ignoring unparseable SSE chunk"
                    );
                }
            }
        }
    }

    debug!(provider = %provider_name, "Stream ended without [DONE]");
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = Self::request_body(&request, false);
        debug!(provider = %self.name, model = %request.model, "Sending completion request");
        self.with_retries(|| self.complete_once(&body)).await
    }

    async fn stream(&self, request: ProviderRequest) -> Result<EventStream, ProviderError> {
        let body = Self::request_body(&request, true);
        debug!(provider = %self.name, model = %request.model, "Sending streaming request");

        let response = self.with_retries(|| self.send(&body, true)).await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(pump_sse(self.name.clone(), response, tx));
        Ok(rx)
    }
}
