//! Record quality checks

use crate::QualityConfig;
use caseforge_domain::traits::LlmProvider;
use caseforge_domain::{QualityAssessment, QualityCheck, TestCaseRecord};
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the structural check
pub const CHECK_STRUCTURE: &str = "Structure";

/// Name of the plausibility check
pub const CHECK_PLAUSIBILITY: &str = "Plausibility";

/// Name of the RTM linkage check
pub const CHECK_RTM: &str = "RTM Validation";

/// The quality checker annotates records with a [`QualityAssessment`]
pub struct QualityChecker<L: LlmProvider> {
    llm: Arc<L>,
    config: QualityConfig,
}

impl<L: LlmProvider> QualityChecker<L> {
    /// Create a new checker sharing the given provider
    pub fn new(llm: Arc<L>, config: QualityConfig) -> Self {
        Self { llm, config }
    }

    /// Active configuration
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Assess every record and attach the result in place
    pub async fn check_all(&self, records: &mut [TestCaseRecord]) {
        for record in records.iter_mut() {
            let assessment = self.assess(record).await;
            if !assessment.passed {
                debug!(
                    "Record '{}' failed quality checks",
                    record.test_case_id
                );
            }
            record.quality_assessment = Some(assessment);
        }
    }

    /// Run the ordered checks for one record
    ///
    /// Structure runs first; if it fails, no other check runs.
    pub async fn assess(&self, record: &TestCaseRecord) -> QualityAssessment {
        let mut assessment = QualityAssessment::new();

        let structure = check_structure(record);
        let structure_ok = structure.passed;
        assessment.record(structure);
        if !structure_ok {
            return assessment;
        }

        assessment.record(self.check_plausibility(record).await);
        assessment.record(self.check_rtm_link(record).await);

        assessment
    }

    /// Ask the model whether the test case is logically plausible
    async fn check_plausibility(&self, record: &TestCaseRecord) -> QualityCheck {
        if !self.config.plausibility_enabled {
            return skipped(CHECK_PLAUSIBILITY);
        }
        self.ask_yes_no(CHECK_PLAUSIBILITY, &plausibility_prompt(record)).await
    }

    /// Ask the model whether the description links to the compliance mapping
    async fn check_rtm_link(&self, record: &TestCaseRecord) -> QualityCheck {
        if !self.config.rtm_enabled {
            return skipped(CHECK_RTM);
        }
        self.ask_yes_no(CHECK_RTM, &rtm_prompt(record)).await
    }

    /// A reply starting with "yes" passes; an invocation error passes with a note
    async fn ask_yes_no(&self, name: &str, prompt: &str) -> QualityCheck {
        match self.llm.generate(prompt).await {
            Ok(reply) => {
                let reply = reply.trim().to_string();
                let passed = reply.to_lowercase().starts_with("yes");
                QualityCheck::new(name, passed, reply)
            }
            Err(e) => {
                warn!("{} check failed with error: {}", name, e);
                QualityCheck::new(
                    name,
                    true,
                    format!("{} could not be performed due to an error: {}", name, e),
                )
            }
        }
    }
}

/// Every required field present
fn check_structure(record: &TestCaseRecord) -> QualityCheck {
    let missing = record.missing_fields();
    if missing.is_empty() {
        QualityCheck::new(CHECK_STRUCTURE, true, "Structure is valid.")
    } else {
        QualityCheck::new(
            CHECK_STRUCTURE,
            false,
            format!("Missing required fields: {}", missing.join(", ")),
        )
    }
}

fn skipped(name: &str) -> QualityCheck {
    QualityCheck::new(name, true, format!("{} check skipped: disabled by configuration.", name))
}

fn plausibility_prompt(record: &TestCaseRecord) -> String {
    let steps = record
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "As a QA Reviewer, analyze the following test case.\n\
         Description: \"{}\"\n\
         Steps:\n{}\n\
         Expected Result: \"{}\"\n\
         Are the steps clear, logical, and easy to follow? Does the expected result directly test \
         the objective in the description? Based on your analysis, is this a plausible and \
         well-formed test case? Answer with only the word \"Yes\" or \"No\", followed by a brief \
         one-sentence justification.",
        record.description, steps, record.expected_result
    )
}

fn rtm_prompt(record: &TestCaseRecord) -> String {
    format!(
        "As a Compliance Auditor, analyze the following link between a test case and a \
         compliance rule. Test Case Description: \"{}\". Compliance Rule Mapping: \"{}\". \
         Is there a clear and logical connection between this test case and this compliance \
         rule? Answer with only the word \"Yes\" or \"No\", followed by a brief one-sentence \
         justification.",
        record.description, record.rtm_compliance_mapping
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseforge_llm::MockProvider;

    fn create_test_record() -> TestCaseRecord {
        TestCaseRecord {
            test_case_id: "TC-001".to_string(),
            requirement_id: "REQ-1".to_string(),
            description: "Verify login succeeds".to_string(),
            test_type: "Functional".to_string(),
            priority: "High".to_string(),
            steps: vec!["Open page".to_string(), "Enter credentials".to_string()],
            expected_result: "Dashboard shown".to_string(),
            rtm_compliance_mapping: "ISO-27001 A.9.4".to_string(),
            confidence_score: Some("90%".to_string()),
            quality_assessment: None,
        }
    }

    fn checker(provider: MockProvider) -> QualityChecker<MockProvider> {
        QualityChecker::new(Arc::new(provider), QualityConfig::default())
    }

    #[tokio::test]
    async fn test_valid_record_passes_all_checks() {
        let checker = checker(MockProvider::new("Yes, this is well formed."));
        let assessment = checker.assess(&create_test_record()).await;

        assert!(assessment.passed);
        let names: Vec<_> = assessment.checks.iter().map(|c| c.check.as_str()).collect();
        assert_eq!(names, vec![CHECK_STRUCTURE, CHECK_PLAUSIBILITY, CHECK_RTM]);
    }

    #[tokio::test]
    async fn test_missing_field_short_circuits() {
        let provider = MockProvider::new("Yes");
        let checker = checker(provider.clone());
        let mut record = create_test_record();
        record.expected_result.clear();

        let assessment = checker.assess(&record).await;

        assert!(!assessment.passed);
        assert_eq!(assessment.checks.len(), 1);
        assert_eq!(assessment.checks[0].check, CHECK_STRUCTURE);
        assert!(assessment.checks[0].notes.contains("expected_result"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plausibility_error_fails_open() {
        let mut provider = MockProvider::new("Yes");
        provider.add_error("QA Reviewer");
        let checker = checker(provider);

        let assessment = checker.assess(&create_test_record()).await;

        let plausibility = assessment.check(CHECK_PLAUSIBILITY).unwrap();
        assert!(plausibility.passed);
        assert!(plausibility.notes.contains("could not be performed"));
        assert!(assessment.passed);
    }

    #[tokio::test]
    async fn test_no_answer_fails_check() {
        let mut provider = MockProvider::new("Yes");
        provider.add_response("Compliance Auditor", "No, the mapping is unrelated.");
        let checker = checker(provider);

        let assessment = checker.assess(&create_test_record()).await;

        assert!(!assessment.passed);
        assert!(assessment.check(CHECK_PLAUSIBILITY).unwrap().passed);
        let rtm = assessment.check(CHECK_RTM).unwrap();
        assert!(!rtm.passed);
        assert_eq!(rtm.notes, "No, the mapping is unrelated.");
    }

    #[tokio::test]
    async fn test_yes_detection_is_case_insensitive() {
        let checker = checker(MockProvider::new("  YES. Clear steps."));
        let assessment = checker.assess(&create_test_record()).await;
        assert!(assessment.passed);
    }

    #[tokio::test]
    async fn test_disabled_checks_are_skipped() {
        let provider = MockProvider::new("No");
        let checker = QualityChecker::new(
            Arc::new(provider.clone()),
            QualityConfig::structural_only(),
        );

        let assessment = checker.assess(&create_test_record()).await;

        assert!(assessment.passed);
        assert_eq!(assessment.checks.len(), 3);
        assert!(assessment.checks[1].notes.contains("skipped"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_check_all_annotates_in_place() {
        let checker = checker(MockProvider::new("Yes"));
        let mut bad = create_test_record();
        bad.test_case_id.clear();
        let mut records = vec![create_test_record(), bad];

        checker.check_all(&mut records).await;

        assert!(records[0].quality_assessment.as_ref().unwrap().passed);
        assert!(!records[1].quality_assessment.as_ref().unwrap().passed);
        assert_eq!(records[0].steps, vec!["Open page", "Enter credentials"]);
    }

    #[test]
    fn test_plausibility_prompt_embeds_record() {
        let prompt = plausibility_prompt(&create_test_record());
        assert!(prompt.contains("Verify login succeeds"));
        assert!(prompt.contains("1. Open page\n2. Enter credentials"));
        assert!(prompt.contains("Dashboard shown"));
    }

    #[test]
    fn test_rtm_prompt_embeds_mapping() {
        let prompt = rtm_prompt(&create_test_record());
        assert!(prompt.contains("ISO-27001 A.9.4"));
        assert!(prompt.contains("Compliance Auditor"));
    }
}
