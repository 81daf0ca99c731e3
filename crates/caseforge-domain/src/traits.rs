//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::TestCaseRecord;
use async_trait::async_trait;

/// Trait for generative model operations
///
/// Implemented by the infrastructure layer (caseforge-llm). A provider is built once at
/// process startup and shared by handle with every component that needs it.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Generate a text completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Summary of a persisted record batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Generated document identifier
    pub id: String,

    /// User/session key the batch was saved under
    pub user_key: String,

    /// Server timestamp (seconds since Unix epoch)
    pub saved_at: u64,

    /// Number of records in the batch
    pub record_count: usize,
}

/// Trait for persisting record batches per user
///
/// Implemented by the infrastructure layer (caseforge-store)
pub trait HistoryStore {
    /// Error type for store operations
    type Error;

    /// Persist a batch under the user key; returns the generated document id
    fn save_batch(&mut self, user_key: &str, records: &[TestCaseRecord]) -> Result<String, Self::Error>;

    /// List batches saved under the user key, newest first
    fn list_batches(&self, user_key: &str) -> Result<Vec<HistoryEntry>, Self::Error>;

    /// Load the records of a batch
    fn load_batch(&self, id: &str) -> Result<Option<Vec<TestCaseRecord>>, Self::Error>;
}

/// Trait for an issue tracker that can create issues in a project
///
/// Implemented by the export layer (caseforge-export)
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Error type for tracker operations
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Verify that the project exists and the credentials are accepted
    async fn check_project(&self, project_key: &str) -> Result<(), Self::Error>;

    /// Create an issue; returns the new issue key
    async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: &str,
        issue_type: &str,
    ) -> Result<String, Self::Error>;
}

/// Trait for a test-management service that stores structured test cases
///
/// Implemented by the export layer (caseforge-export)
#[async_trait]
pub trait TestManagement: Send + Sync {
    /// Error type for test-management operations
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Create a structured test case linked to an existing issue; returns its key if assigned
    async fn create_test_case(
        &self,
        project_key: &str,
        issue_key: &str,
        record: &TestCaseRecord,
    ) -> Result<Option<String>, Self::Error>;
}
