/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - Anthropic: Anthropic Messages API (default)
 * - OpenAI: OpenAI chat completions, also used for LM Studio
 * - Ollama: Local LLM server
 * - Mock: scripted batch backend for tests
 *
 * All HTTP clients share the retry and rate-limit behavior in [`RetryPolicy`].
 */

use async_trait::async_trait;
use log::warn;
use parking_lot::Mutex;
use reqwest::{RequestBuilder, StatusCode};
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::errors::ProviderError;

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

/// A single system + user prompt completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// System prompt
    pub system: String,
    /// User prompt
    pub user: String,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Temperature for generation
    pub temperature: f32,
}

/// Provider answer reduced to what the translation service needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Prompt tokens, when the provider reports them
    pub prompt_tokens: Option<u64>,
    /// Completion tokens, when the provider reports them
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self, model: &str) -> Result<(), ProviderError>;

    /// Display name for logs
    fn name(&self) -> &'static str;
}

/// Retry, backoff and client-side rate limiting shared by the HTTP providers
#[derive(Debug)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    max_retries: u32,
    /// Backoff before the first retry; doubles on each further retry
    backoff_base_ms: u64,
    /// Requests per minute; `None` disables throttling
    rate_limit: Option<u32>,
    /// Earliest instant the next request may start
    next_slot: Mutex<Option<Instant>>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64, rate_limit: Option<u32>) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
            rate_limit: rate_limit.filter(|r| *r > 0),
            next_slot: Mutex::new(None),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << exponent))
    }

    /// Reserve the next request slot and return how long to wait for it
    fn reserve_slot(&self) -> Duration {
        let Some(rate_limit) = self.rate_limit else {
            return Duration::ZERO;
        };
        let interval = Duration::from_millis(60_000 / rate_limit as u64);
        let now = Instant::now();

        let mut next_slot = self.next_slot.lock();
        let start = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        *next_slot = Some(start + interval);
        start - now
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of retries
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            let wait = self.reserve_slot();
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} request failed: {} - retry {}/{}",
                        label, e, attempt, self.max_retries
                    );
                    tokio::time::sleep(self.backoff_delay(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000, None)
    }
}

/// Send a JSON request and return the body of a successful response
pub(crate) async fn send_request(label: &str, request: RequestBuilder) -> Result<String, ProviderError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            ProviderError::ConnectionError(format!("Failed to reach {}: {}", label, e))
        } else {
            ProviderError::RequestFailed(format!("{} request failed: {}", label, e))
        }
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::ConnectionError(format!("Failed to read {} response: {}", label, e)))?;

    if status.is_success() {
        return Ok(body);
    }

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::AuthenticationError(format!("{} rejected the credentials: {}", label, body))
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(format!("{}: {}", label, body)),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        },
    })
}

/// Deserialize a provider response body
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(label: &str, body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        ProviderError::ParseError(format!("{} response: {} (body starts with: {})", label, e, preview))
    })
}
