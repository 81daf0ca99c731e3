//! Test case record - the unit of value flowing through the pipeline

use crate::quality::QualityAssessment;
use serde::{Deserialize, Serialize};

/// Field names every well-formed record must carry, in canonical order
pub const REQUIRED_FIELDS: [&str; 8] = [
    "test_case_id",
    "requirement_id",
    "description",
    "test_type",
    "priority",
    "steps",
    "expected_result",
    "rtm_compliance_mapping",
];

/// A structured test case with requirement linkage and quality metadata
///
/// Required string fields hold an empty string when the model omitted them; the
/// quality checker reports those as missing. `steps` order is execution order and
/// is preserved end to end.
///
/// # Examples
///
/// ```
/// use caseforge_domain::TestCaseRecord;
///
/// let record = TestCaseRecord::new("Verify login succeeds")
///     .with_steps(vec!["Open page".to_string(), "Enter credentials".to_string()]);
/// assert_eq!(record.steps.len(), 2);
/// assert!(record.quality_assessment.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestCaseRecord {
    /// AI-assigned identifier, not guaranteed unique
    pub test_case_id: String,

    /// Requirement this test case verifies
    pub requirement_id: String,

    /// What the test case checks; records without one are discarded
    pub description: String,

    /// Free-form category (functional, negative, performance, ...)
    pub test_type: String,

    /// Free-form priority
    pub priority: String,

    /// Ordered execution steps, may be empty
    pub steps: Vec<String>,

    /// Expected outcome after the last step
    pub expected_result: String,

    /// Compliance rule this test case maps to, or "N/A"
    pub rtm_compliance_mapping: String,

    /// Model's self-reported confidence, e.g. "95%"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<String>,

    /// Appended by the quality checker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_assessment: Option<QualityAssessment>,
}

impl TestCaseRecord {
    /// Create a record with only a description set
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Replace the step list
    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = steps;
        self
    }

    /// Whether the record carries a usable description
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    /// Required string fields that are absent (blank), in canonical order
    ///
    /// `steps` is never reported: an empty step list is allowed.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| {
                self.scalar_field(name)
                    .is_some_and(|value| value.trim().is_empty())
            })
            .collect()
    }

    /// Look up a scalar field by its canonical name
    ///
    /// Returns `None` for unknown names and for `steps`, which is not scalar.
    pub fn scalar_field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "test_case_id" => &self.test_case_id,
            "requirement_id" => &self.requirement_id,
            "description" => &self.description,
            "test_type" => &self.test_type,
            "priority" => &self.priority,
            "expected_result" => &self.expected_result,
            "rtm_compliance_mapping" => &self.rtm_compliance_mapping,
            "confidence_score" => return self.confidence_score.as_deref(),
            _ => return None,
        };
        Some(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_record() -> TestCaseRecord {
        TestCaseRecord {
            test_case_id: "TC-001".to_string(),
            requirement_id: "REQ-1".to_string(),
            description: "Verify login succeeds".to_string(),
            test_type: "Functional".to_string(),
            priority: "High".to_string(),
            steps: vec!["Open page".to_string()],
            expected_result: "Dashboard shown".to_string(),
            rtm_compliance_mapping: "N/A".to_string(),
            confidence_score: Some("95%".to_string()),
            quality_assessment: None,
        }
    }

    #[test]
    fn test_complete_record_has_no_missing_fields() {
        assert!(complete_record().missing_fields().is_empty());
    }

    #[test]
    fn test_blank_fields_reported_in_order() {
        let mut record = complete_record();
        record.priority = "  ".to_string();
        record.test_case_id.clear();

        assert_eq!(record.missing_fields(), vec!["test_case_id", "priority"]);
    }

    #[test]
    fn test_default_record_reports_every_scalar_required_field() {
        let missing = TestCaseRecord::default().missing_fields();

        assert_eq!(missing.len(), REQUIRED_FIELDS.len() - 1);
        assert!(!missing.contains(&"steps"));
        assert_eq!(missing.first(), Some(&"test_case_id"));
        assert_eq!(missing.last(), Some(&"rtm_compliance_mapping"));
    }

    #[test]
    fn test_empty_steps_not_missing() {
        let record = complete_record().with_steps(Vec::new());
        assert!(record.missing_fields().is_empty());
    }

    #[test]
    fn test_lenient_deserialization() {
        let record: TestCaseRecord =
            serde_json::from_str(r#"{"description": "Only a description"}"#).unwrap();

        assert!(record.has_description());
        assert!(record.steps.is_empty());
        assert!(record.confidence_score.is_none());
        assert_eq!(record.missing_fields().len(), 6);
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let mut record = complete_record();
        record.confidence_score = None;

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("confidence_score").is_none());
        assert!(json.get("quality_assessment").is_none());
        assert_eq!(json["steps"][0], "Open page");
    }

    #[test]
    fn test_scalar_field_lookup() {
        let record = complete_record();
        assert_eq!(record.scalar_field("priority"), Some("High"));
        assert_eq!(record.scalar_field("confidence_score"), Some("95%"));
        assert_eq!(record.scalar_field("steps"), None);
        assert_eq!(record.scalar_field("unknown"), None);
    }
}
