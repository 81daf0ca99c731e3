//! Caseforge LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `caseforge-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `GeminiProvider`: Google generative-language API over HTTPS
//!
//! # Examples
//!
//! ```
//! use caseforge_llm::MockProvider;
//! use caseforge_domain::traits::LlmProvider;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod gemini;

use async_trait::async_trait;
use caseforge_domain::traits::LlmProvider as LlmProviderTrait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use gemini::GeminiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Credential missing at construction time
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen by the first registered pattern that occurs anywhere in the
/// prompt, falling back to the default reply. No network calls are made.
///
/// # Examples
///
/// ```
/// use caseforge_llm::MockProvider;
/// use caseforge_domain::traits::LlmProvider;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut provider = MockProvider::new("Fixed response");
/// provider.add_response("QA Reviewer", "Yes, the steps are logical.");
/// provider.add_error("broken chunk");
///
/// assert_eq!(provider.generate("any prompt").await.unwrap(), "Fixed response");
/// assert!(provider.generate("As a QA Reviewer ...").await.unwrap().starts_with("Yes"));
/// assert!(provider.generate("... broken chunk ...").await.is_err());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_reply: MockReply,
    replies: Arc<Mutex<Vec<(String, MockReply)>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_default(MockReply::Text(response.into()))
    }

    /// Create a MockProvider that fails every call not matched by a pattern
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_default(MockReply::Error(message.into()))
    }

    fn with_default(default_reply: MockReply) -> Self {
        Self {
            default_reply,
            replies: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reply with `response` to any prompt containing `pattern`
    pub fn add_response(&mut self, pattern: impl Into<String>, response: impl Into<String>) {
        self.push(pattern.into(), MockReply::Text(response.into()));
    }

    /// Fail any prompt containing `pattern`
    pub fn add_error(&mut self, pattern: impl Into<String>) {
        self.push(pattern.into(), MockReply::Error("Mock error".to_string()));
    }

    fn push(&mut self, pattern: String, reply: MockReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push((pattern, reply));
        }
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    fn reply_for(&self, prompt: &str) -> MockReply {
        let replies = match self.replies.lock() {
            Ok(replies) => replies,
            Err(poisoned) => poisoned.into_inner(),
        };
        replies
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match self.reply_for(prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(message) => Err(LlmError::Other(message)),
        }
    }
}
