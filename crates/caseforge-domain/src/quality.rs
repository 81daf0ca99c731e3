//! Quality assessment attached to a record by the quality checker

use serde::{Deserialize, Serialize};

/// Outcome of a single quality check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCheck {
    /// Check name ("Structure", "Plausibility", "RTM Validation")
    pub check: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable explanation
    pub notes: String,
}

impl QualityCheck {
    /// Create a check outcome
    pub fn new(check: impl Into<String>, passed: bool, notes: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed,
            notes: notes.into(),
        }
    }
}

/// Ordered list of executed checks plus the overall verdict
///
/// `passed` is always the logical AND of every recorded check; it is maintained
/// by [`QualityAssessment::record`] and never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// True only if every executed check passed
    pub passed: bool,

    /// Executed checks, in execution order
    pub checks: Vec<QualityCheck>,
}

impl QualityAssessment {
    /// An assessment with no checks yet
    pub fn new() -> Self {
        Self {
            passed: true,
            checks: Vec::new(),
        }
    }

    /// Append a check outcome and fold it into the overall verdict
    pub fn record(&mut self, check: QualityCheck) {
        self.passed &= check.passed;
        self.checks.push(check);
    }

    /// Find a check by name
    pub fn check(&self, name: &str) -> Option<&QualityCheck> {
        self.checks.iter().find(|c| c.check == name)
    }
}

impl Default for QualityAssessment {
    fn default() -> Self {
        Self::new()
    }
}
