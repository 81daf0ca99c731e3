//! Types for pipeline results

use caseforge_domain::TestCaseRecord;

/// Aggregated result of running every chunk of a document
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Records from all chunks, in completion order
    pub records: Vec<TestCaseRecord>,

    /// Number of chunks submitted
    pub chunks_total: usize,

    /// Chunks that produced no records
    pub empty_chunks: usize,

    /// Chunks whose generation failed or whose task did not complete
    pub failed_chunks: usize,
}

impl BatchOutcome {
    /// Records that passed every quality check
    pub fn passed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.quality_assessment.as_ref().is_some_and(|qa| qa.passed))
            .count()
    }
}
