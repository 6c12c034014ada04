/*!
 * Core translation service implementation.
 *
 * `TranslationService` turns a `BatchRequest` into a system + user prompt,
 * sends it to the configured provider and hands the raw answer back to the
 * orchestrator. It also tracks token usage across the run.
 */

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

use crate::app_config::{Config, TranslationProvider as ConfigTranslationProvider};
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use crate::providers::{CompletionRequest, Provider, RetryPolicy};
use crate::translation::orchestrator::{BatchBackend, BatchRequest};
use crate::translation::prompts::{BatchPromptBuilder, PromptTemplate};

/// Token usage statistics for tracking API consumption
#[derive(Debug, Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Number of completed requests
    pub requests: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::with_provider_info(String::new(), String::new())
    }
}

impl TokenUsageStats {
    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            requests: 0,
            start_time: Instant::now(),
            api_duration: Duration::ZERO,
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Add the numbers reported for one request
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // API time when known, wall-clock time otherwise
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Requests: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider,
            self.model,
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.start_time.elapsed().as_secs_f64() / 60.0,
            self.api_duration.as_secs_f64() / 60.0,
            self.tokens_per_minute()
        )
    }
}

/// Sends batch prompts to a provider
#[derive(Debug)]
pub struct TranslationService {
    /// Provider client
    provider: Box<dyn Provider>,

    /// Model identifier sent with each request
    model: String,

    /// Rendered system prompt
    system_prompt: String,

    /// Temperature for generation
    temperature: f32,

    /// Maximum tokens per answer
    max_tokens: u32,

    /// Usage across every request made by this service
    usage: Mutex<TokenUsageStats>,
}

impl TranslationService {
    /// Create the service for the provider selected in `config`
    pub fn new(config: &Config) -> Result<Self> {
        let translation = &config.translation;
        let retry = RetryPolicy::new(
            translation.common.retry_count,
            translation.common.retry_backoff_ms,
            translation.get_rate_limit(),
        );
        let endpoint = translation.get_endpoint();
        let timeout_secs = translation.get_timeout_secs();

        let provider: Box<dyn Provider> = match translation.provider {
            ConfigTranslationProvider::Anthropic => {
                let api_key = translation.get_api_key();
                if api_key.is_empty() {
                    return Err(anyhow!("Anthropic API key is missing"));
                }
                Box::new(Anthropic::new(api_key, endpoint, timeout_secs, retry))
            }
            ConfigTranslationProvider::OpenAI => {
                let api_key = translation.get_api_key();
                if api_key.is_empty() {
                    return Err(anyhow!("OpenAI API key is missing"));
                }
                Box::new(OpenAI::new(api_key, endpoint, timeout_secs, retry))
            }
            ConfigTranslationProvider::LMStudio => {
                Box::new(OpenAI::lm_studio(translation.get_api_key(), endpoint, timeout_secs, retry))
            }
            ConfigTranslationProvider::Ollama => Box::new(Ollama::new(endpoint, timeout_secs, retry)),
        };

        Self::with_provider(
            provider,
            translation.get_model(),
            &config.source_language,
            &config.target_language,
            translation.common.temperature,
            translation.common.max_tokens,
        )
    }

    /// Create the service around an existing provider
    pub fn with_provider(
        provider: Box<dyn Provider>,
        model: impl Into<String>,
        source_language: &str,
        target_language: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self> {
        let source_name = language_utils::get_language_name(source_language)
            .context("Unknown source language")?;
        let target_name = language_utils::get_language_name(target_language)
            .context("Unknown target language")?;
        let model = model.into();

        Ok(Self {
            system_prompt: PromptTemplate::lesson_translator().render(&source_name, &target_name),
            usage: Mutex::new(TokenUsageStats::with_provider_info(provider.name(), model.clone())),
            provider,
            model,
            temperature,
            max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Snapshot of the usage so far
    pub fn token_usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<()> {
        info!("Testing connection to {} with model {}", self.provider.name(), self.model);
        self.provider
            .test_connection(&self.model)
            .await
            .with_context(|| format!("Failed to connect to {}", self.provider.name()))
    }

    /// Build the provider request for one batch
    pub fn build_request(&self, request: &BatchRequest) -> CompletionRequest {
        let user = BatchPromptBuilder::new(request.phase)
            .with_glossary(&request.glossary_text)
            .with_records(&request.records)
            .build();

        CompletionRequest {
            model: self.model.clone(),
            system: self.system_prompt.clone(),
            user,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl BatchBackend for TranslationService {
    async fn translate(&self, request: &BatchRequest) -> Result<String, ProviderError> {
        let completion = self.build_request(request);
        let started = Instant::now();
        let response = self.provider.complete(completion).await?;
        let elapsed = started.elapsed();

        debug!(
            "Batch {} answered by {} in {:.2}s",
            request.position + 1,
            self.provider.name(),
            elapsed.as_secs_f64()
        );

        let mut usage = self.usage.lock();
        usage.requests += 1;
        usage.api_duration += elapsed;
        usage.add_token_usage(response.prompt_tokens, response.completion_tokens);

        Ok(response.text)
    }
}
