//! Per-chunk test-case generation

use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::PromptBuilder;
use crate::retry::RetryPolicy;
use caseforge_domain::traits::LlmProvider;
use caseforge_domain::TestCaseRecord;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends one chunk to the model and parses the reply
pub struct TestCaseGenerator<L: LlmProvider> {
    llm: Arc<L>,
    retry: RetryPolicy,
}

impl<L: LlmProvider> TestCaseGenerator<L> {
    /// Create a generator sharing the given provider
    pub fn new(llm: Arc<L>, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    /// Generate records for a chunk, degrading to an empty list once retries run out
    ///
    /// An empty list is not an error: it also means the chunk held no actionable requirement.
    pub async fn generate(&self, chunk: &str) -> Vec<TestCaseRecord> {
        match self.try_generate(chunk).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "All attempts failed for chunk ({} chars): {}. Returning empty list.",
                    chunk.chars().count(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Generate records for a chunk, returning the last model error once retries run out
    pub async fn try_generate(&self, chunk: &str) -> Result<Vec<TestCaseRecord>, ExtractorError> {
        let prompt = PromptBuilder::new(chunk).build();
        let llm = &self.llm;
        let prompt = prompt.as_str();

        let response = self
            .retry
            .run(move |attempt| async move {
                debug!("Generation attempt {}", attempt);
                llm.generate(prompt)
                    .await
                    .map_err(|e| ExtractorError::Llm(e.to_string()))
            })
            .await?;

        let records = parse_response(&response);
        debug!("Parsed {} records from chunk", records.len());
        Ok(records)
    }
}
