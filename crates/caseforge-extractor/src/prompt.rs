//! Prompts for test-case generation and bulk editing

use crate::parser::render_blocks;
use caseforge_domain::TestCaseRecord;

/// Builds the generation prompt for one chunk
pub struct PromptBuilder<'a> {
    chunk: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(chunk: &'a str) -> Self {
        Self { chunk }
    }

    /// Build the complete generation prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(GENERATION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("Document chunk:\n");
        prompt.push_str("---\n");
        prompt.push_str(self.chunk);
        prompt.push_str("\n---\n\n");

        prompt.push_str(BLOCK_FORMAT);
        prompt
    }
}

/// Build the prompt asking the model to apply `instruction` to the whole record list
pub fn edit_prompt(instruction: &str, records: &[TestCaseRecord]) -> String {
    let mut prompt = String::new();

    prompt.push_str(EDIT_INSTRUCTIONS);
    prompt.push_str("\n\n");

    prompt.push_str("User instruction:\n");
    prompt.push_str(instruction.trim());
    prompt.push_str("\n\n");

    prompt.push_str("Current test cases:\n");
    prompt.push_str(&render_blocks(records));
    prompt.push('\n');

    prompt.push_str(BLOCK_FORMAT);
    prompt
}

const GENERATION_INSTRUCTIONS: &str = r#"You are a senior QA engineer. Read the following chunk of a software requirement document and identify every specific, actionable requirement in it, functional or non-functional.

For each requirement, write one or more detailed test cases. Link each test case to the compliance rule it verifies when the text names one; otherwise use N/A. Rate how confident you are that each test case faithfully reflects the requirement as a percentage.

If the chunk contains no actionable requirement, return nothing at all."#;

const EDIT_INSTRUCTIONS: &str = r#"You are a senior QA engineer maintaining a list of test cases. Apply the user instruction below to the current test cases. You may change, add or remove test cases as the instruction requires; keep every test case the instruction does not affect exactly as it is.

Return the COMPLETE revised list, not only the changed test cases."#;

const BLOCK_FORMAT: &str = r#"Output format:
Write each test case as one block, exactly like this:

---TEST CASE START---
TC_ID: <test case id, e.g. TC-001>
REQ_ID: <requirement id, e.g. REQ-1>
DESC: <one-sentence description>
TYPE: <Functional, Negative, Performance, Security, ...>
PRIORITY: <High, Medium or Low>
STEP: <first step>
STEP: <second step, one STEP line per step, in execution order>
EXPECTED: <expected result>
RTM: <compliance rule mapping or N/A>
CONFIDENCE: <percentage, e.g. 90%>
---TEST CASE END---

Do not include any other text, explanation, JSON, or markdown formatting."#;
