/*!
 * Mock backends for testing.
 *
 * - `MockBackend` answers batch requests directly, so the orchestrator and the
 *   controller can be exercised without a network:
 *   - `MockBackend::tagged()` - translates every record as `[b<batch>] <source>`
 *   - `MockBackend::omitting(..)` - like tagged, but drops the given indices
 *   - `MockBackend::fenced()` - like tagged, wrapped in a Markdown code fence
 *   - `MockBackend::malformed()` - answers with prose instead of JSON
 *   - `MockBackend::failing()` - always fails with a server error
 *   - `MockBackend::scripted(..)` - answers with a custom function
 * - `MockProvider` stands in for an HTTP provider behind `TranslationService`.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};
use crate::translation::orchestrator::{BatchBackend, BatchRequest};
use crate::translation::response::TranslatedLine;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Translates every record
    Tagged,
    /// Translates every record except the listed indices
    Omitting(Vec<usize>),
    /// Tagged answer inside a code fence with surrounding prose
    Fenced,
    /// Answers without any JSON payload
    Malformed,
    /// Always fails with an error
    Failing,
}

type Script = Box<dyn Fn(&BatchRequest) -> String + Send + Sync>;

/// Scripted batch backend that records every request it receives
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Custom answer generator, overrides the behavior
    script: Option<Script>,
    /// Response delay per batch position
    delay: Option<fn(usize) -> u64>,
    /// Requests seen so far, in arrival order
    requests: Mutex<Vec<BatchRequest>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            script: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn tagged() -> Self {
        Self::new(MockBehavior::Tagged)
    }

    pub fn omitting(indices: Vec<usize>) -> Self {
        Self::new(MockBehavior::Omitting(indices))
    }

    pub fn fenced() -> Self {
        Self::new(MockBehavior::Fenced)
    }

    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Answer every request with `script`
    pub fn scripted<F>(script: F) -> Self
    where
        F: Fn(&BatchRequest) -> String + Send + Sync + 'static,
    {
        let mut backend = Self::tagged();
        backend.script = Some(Box::new(script));
        backend
    }

    /// Delay each answer by `delay(position)` milliseconds
    pub fn with_delay_by_position(mut self, delay: fn(usize) -> u64) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<BatchRequest> {
        self.requests.lock().clone()
    }

    /// Text the tagged behaviors produce for a record
    pub fn tagged_text(position: usize, source: &str) -> String {
        format!("[b{}] {}", position + 1, source)
    }

    fn tagged_lines(request: &BatchRequest, skip: &[usize]) -> String {
        let lines: Vec<TranslatedLine> = request
            .records
            .iter()
            .filter(|r| !skip.contains(&r.index))
            .map(|r| TranslatedLine {
                index: r.index,
                text: Self::tagged_text(request.position, &r.text),
            })
            .collect();
        serde_json::to_string_pretty(&lines).unwrap_or_else(|_| "[]".to_string())
    }
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend")
            .field("behavior", &self.behavior)
            .field("scripted", &self.script.is_some())
            .finish()
    }
}

#[async_trait]
impl BatchBackend for MockBackend {
    async fn translate(&self, request: &BatchRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(Duration::from_millis(delay(request.position))).await;
        }

        if let Some(script) = &self.script {
            return Ok(script(request));
        }

        match &self.behavior {
            MockBehavior::Tagged => Ok(Self::tagged_lines(request, &[])),
            MockBehavior::Omitting(indices) => Ok(Self::tagged_lines(request, indices)),
            MockBehavior::Fenced => Ok(format!(
                "Here are the translations:\n```json\n{}\n```",
                Self::tagged_lines(request, &[])
            )),
            MockBehavior::Malformed => Ok("I'm sorry, I can only translate one line at a time.".to_string()),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
        }
    }
}

/// Provider double returning a fixed completion and recording requests
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Completion text; `None` fails every request
    answer: Option<String>,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Requests seen so far, shared between clones
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a provider that always answers with `text`
    pub fn responding(text: impl Into<String>) -> Self {
        Self {
            answer: Some(text.into()),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self {
            answer: None,
            ..Self::responding("")
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let prompt_tokens = (request.system.len() + request.user.len()) as u64;
        self.requests.lock().push(request);

        match &self.answer {
            Some(text) => Ok(CompletionResponse {
                text: text.clone(),
                prompt_tokens: Some(prompt_tokens),
                completion_tokens: Some(text.len() as u64),
            }),
            None => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
        }
    }

    async fn test_connection(&self, _model: &str) -> Result<(), ProviderError> {
        match self.answer {
            Some(_) => Ok(()),
            None => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}
