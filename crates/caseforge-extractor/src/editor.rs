//! AI-assisted bulk editing of a record list

use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::edit_prompt;
use caseforge_domain::traits::LlmProvider;
use caseforge_domain::TestCaseRecord;
use std::sync::Arc;
use tracing::{info, warn};

/// Applies a free-text instruction to a whole record list in one model call
pub struct TestCaseEditor<L: LlmProvider> {
    llm: Arc<L>,
}

impl<L: LlmProvider> TestCaseEditor<L> {
    /// Create an editor sharing the given provider
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    /// Replace the list with the model's revision
    ///
    /// The list is replaced as a whole or not at all: when the reply yields no records,
    /// the original list comes back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::InvalidRequest`] for a blank instruction or an empty list,
    /// and [`ExtractorError::Llm`] if the model call fails.
    pub async fn edit(
        &self,
        instruction: &str,
        records: Vec<TestCaseRecord>,
    ) -> Result<Vec<TestCaseRecord>, ExtractorError> {
        if instruction.trim().is_empty() || records.is_empty() {
            return Err(ExtractorError::InvalidRequest(
                "A prompt and a list of test cases are required.".to_string(),
            ));
        }

        let prompt = edit_prompt(instruction, &records);
        let response = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| ExtractorError::Llm(e.to_string()))?;

        let edited = parse_response(&response);
        if edited.is_empty() {
            warn!("Edit reply contained no parsable test cases; keeping {} records", records.len());
            return Ok(records);
        }

        info!("Edited test cases: {} before, {} after", records.len(), edited.len());
        Ok(edited)
    }
}
