//! Issue-tracker export
//!
//! Plain mode files one Jira `Task` per record. Zephyr mode files a `Story` container per
//! record and links a structured Zephyr Scale test case to it. Every outcome, good or bad,
//! becomes a confirmation string; the batch never aborts part way.

use crate::ExportError;
use async_trait::async_trait;
use caseforge_domain::traits::{IssueTracker, TestManagement};
use caseforge_domain::TestCaseRecord;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{info, warn};

/// Zephyr Scale Cloud API base
pub const ZEPHYR_API_BASE: &str = "https://api.zephyrscale.smartbear.com/v2";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Export records as tracker issues and return one confirmation per outcome
///
/// In Zephyr mode a missing test-management client yields a per-record error string.
pub async fn export_to_tracker<T, Z>(
    tracker: &T,
    test_management: Option<&Z>,
    zephyr_mode: bool,
    project_key: &str,
    records: &[TestCaseRecord],
) -> Vec<String>
where
    T: IssueTracker,
    Z: TestManagement,
{
    if let Err(e) = tracker.check_project(project_key).await {
        warn!("Tracker project lookup failed for '{}': {}", project_key, e);
        return vec![format!(
            "Error connecting to Jira or finding project '{}'. Please check your Server URL, \
             Email, API Token, and Project Key. Error: {}",
            project_key, e
        )];
    }

    let mut confirmations = Vec::new();
    for record in records {
        if zephyr_mode {
            export_with_test_case(tracker, test_management, project_key, record, &mut confirmations).await;
        } else {
            match tracker
                .create_issue(project_key, &record.description, &issue_description(record), "Task")
                .await
            {
                Ok(key) => confirmations.push(format!("Successfully created issue: {}", key)),
                Err(e) => confirmations.push(record_error(record, &e)),
            }
        }
    }

    info!("Tracker export produced {} confirmations", confirmations.len());
    confirmations
}

async fn export_with_test_case<T, Z>(
    tracker: &T,
    test_management: Option<&Z>,
    project_key: &str,
    record: &TestCaseRecord,
    confirmations: &mut Vec<String>,
) where
    T: IssueTracker,
    Z: TestManagement,
{
    let Some(test_management) = test_management else {
        confirmations.push(
            "Error: Zephyr Scale API integration requires a Zephyr Scale API Token.".to_string(),
        );
        return;
    };

    let summary = format!("Test Case Container: {}", record.description);
    let issue_key = match tracker
        .create_issue(project_key, &summary, &issue_description(record), "Story")
        .await
    {
        Ok(key) => key,
        Err(e) => {
            confirmations.push(record_error(record, &e));
            return;
        }
    };
    confirmations.push(format!("Successfully created Jira container issue: {}", issue_key));

    match test_management.create_test_case(project_key, &issue_key, record).await {
        Ok(Some(key)) => confirmations.push(format!(
            "Successfully created Zephyr Scale Test Case: {} linked to {}",
            key, issue_key
        )),
        Ok(None) => confirmations.push(format!(
            "Failed to create Zephyr Scale Test Case for {}",
            issue_key
        )),
        Err(e) => confirmations.push(record_error(record, &e)),
    }
}

fn record_error(record: &TestCaseRecord, error: &dyn std::fmt::Display) -> String {
    let preview: String = record.description.chars().take(30).collect();
    warn!("Tracker export failed for '{}': {}", preview, error);
    format!(
        "Error creating issue for '{}...'. Jira/Zephyr API Error: {}",
        preview, error
    )
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Jira wiki-markup body describing one record
pub fn issue_description(record: &TestCaseRecord) -> String {
    let mut body = String::new();
    let sections = [
        ("Requirement ID", record.requirement_id.as_str()),
        ("Test Type", record.test_type.as_str()),
        ("Priority", record.priority.as_str()),
        ("RTM Compliance Mapping", record.rtm_compliance_mapping.as_str()),
        ("Confidence Score", record.confidence_score.as_deref().unwrap_or_default()),
    ];
    for (title, value) in sections {
        let _ = write!(body, "h3. {}\n{}\n\n", title, or_na(value));
    }

    body.push_str("-----\n\nh3. Steps to Reproduce\n");
    for step in &record.steps {
        let _ = writeln!(body, "# {}", step);
    }

    let _ = write!(
        body,
        "\n-----\n\nh3. Expected Result\n{}\n",
        or_na(&record.expected_result)
    );
    body
}

fn http_client() -> Result<reqwest::Client, ExportError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ExportError::Tracker(format!("Failed to build HTTP client: {}", e)))
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ExportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ExportError::Tracker(format!("HTTP {}: {}", status, text)))
}

/// Jira REST v2 client using basic auth (account email + API token)
pub struct JiraClient {
    server: String,
    email: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

impl JiraClient {
    /// Create a client for the given Jira server
    pub fn new(
        server: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ExportError> {
        Ok(Self {
            server: server.into().trim_end_matches('/').to_string(),
            email: email.into(),
            token: token.into(),
            client: http_client()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.server, path)
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    type Error = ExportError;

    async fn check_project(&self, project_key: &str) -> Result<(), ExportError> {
        let response = self
            .client
            .get(self.url(&format!("project/{}", project_key)))
            .basic_auth(&self.email, Some(&self.token))
            .send()
            .await
            .map_err(|e| ExportError::Tracker(e.to_string()))?;
        error_for_status(response).await?;
        Ok(())
    }

    async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: &str,
        issue_type: &str,
    ) -> Result<String, ExportError> {
        let body = json!({
            "fields": {
                "project": { "key": project_key },
                "summary": summary,
                "description": description,
                "issuetype": { "name": issue_type },
            }
        });

        let response = self
            .client
            .post(self.url("issue"))
            .basic_auth(&self.email, Some(&self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| ExportError::Tracker(e.to_string()))?;

        let created: CreatedIssue = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ExportError::Tracker(format!("Invalid issue response: {}", e)))?;
        Ok(created.key)
    }
}

/// Zephyr Scale Cloud client using a bearer token
pub struct ZephyrClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ZephyrTestCase<'a> {
    name: &'a str,
    project_key: &'a str,
    jira_issue_key: &'a str,
    status: &'static str,
    priority: &'a str,
    objective: &'a str,
    precondition: &'static str,
    test_script: ZephyrScript,
    labels: Vec<&'a str>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ZephyrScript {
    #[serde(rename = "type")]
    script_type: &'static str,
    steps: Vec<ZephyrStep>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ZephyrStep {
    step: String,
    test_data: String,
    expected_result: String,
}

#[derive(Deserialize)]
struct CreatedTestCase {
    key: Option<String>,
}

fn non_blank<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Zephyr payload; the expected result rides on the last step
fn zephyr_test_case<'a>(
    project_key: &'a str,
    issue_key: &'a str,
    record: &'a TestCaseRecord,
) -> ZephyrTestCase<'a> {
    let last = record.steps.len().saturating_sub(1);
    let steps = record
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| ZephyrStep {
            step: step.clone(),
            test_data: String::new(),
            expected_result: if i == last {
                record.expected_result.clone()
            } else {
                String::new()
            },
        })
        .collect();

    ZephyrTestCase {
        name: non_blank(&record.description, "No description provided"),
        project_key,
        jira_issue_key: issue_key,
        status: "Draft",
        priority: non_blank(&record.priority, "Normal"),
        objective: non_blank(&record.description, "No objective provided"),
        precondition: "",
        test_script: ZephyrScript {
            script_type: "STEP_BY_STEP",
            steps,
        },
        labels: vec![non_blank(&record.test_type, "Automated")],
    }
}

impl ZephyrClient {
    /// Create a client against the Zephyr Scale Cloud API
    pub fn new(token: impl Into<String>) -> Result<Self, ExportError> {
        Self::with_base_url(ZEPHYR_API_BASE, token)
    }

    /// Create a client against another API base
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ExportError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl TestManagement for ZephyrClient {
    type Error = ExportError;

    async fn create_test_case(
        &self,
        project_key: &str,
        issue_key: &str,
        record: &TestCaseRecord,
    ) -> Result<Option<String>, ExportError> {
        let payload = zephyr_test_case(project_key, issue_key, record);

        let response = self
            .client
            .post(format!("{}/testcases", self.base_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ExportError::Tracker(e.to_string()))?;

        let created: CreatedTestCase = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ExportError::Tracker(format!("Invalid test case response: {}", e)))?;
        Ok(created.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockTracker {
        reject_project: bool,
        fail_summary: Option<&'static str>,
        created: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl IssueTracker for MockTracker {
        type Error = ExportError;

        async fn check_project(&self, _project_key: &str) -> Result<(), ExportError> {
            if self.reject_project {
                Err(ExportError::Tracker("HTTP 404 Not Found".to_string()))
            } else {
                Ok(())
            }
        }

        async fn create_issue(
            &self,
            project_key: &str,
            summary: &str,
            _description: &str,
            issue_type: &str,
        ) -> Result<String, ExportError> {
            if self.fail_summary.is_some_and(|s| summary.contains(s)) {
                return Err(ExportError::Tracker("HTTP 400".to_string()));
            }
            let mut created = self.created.lock().unwrap();
            created.push((summary.to_string(), issue_type.to_string()));
            Ok(format!("{}-{}", project_key, created.len()))
        }
    }

    struct MockZephyr {
        assign_key: bool,
    }

    #[async_trait]
    impl TestManagement for MockZephyr {
        type Error = ExportError;

        async fn create_test_case(
            &self,
            _project_key: &str,
            issue_key: &str,
            _record: &TestCaseRecord,
        ) -> Result<Option<String>, ExportError> {
            Ok(self.assign_key.then(|| format!("{}-T", issue_key)))
        }
    }

    fn records() -> Vec<TestCaseRecord> {
        vec![
            TestCaseRecord::new("Verify login succeeds"),
            TestCaseRecord::new("Verify lockout after three failed attempts in a row"),
        ]
    }

    #[tokio::test]
    async fn test_plain_mode_creates_tasks() {
        let tracker = MockTracker::default();
        let confirmations =
            export_to_tracker::<_, MockZephyr>(&tracker, None, false, "QA", &records()).await;

        assert_eq!(
            confirmations,
            vec![
                "Successfully created issue: QA-1",
                "Successfully created issue: QA-2"
            ]
        );
        let created = tracker.created.lock().unwrap();
        assert_eq!(created[0], ("Verify login succeeds".to_string(), "Task".to_string()));
    }

    #[tokio::test]
    async fn test_failed_project_lookup_is_single_error() {
        let tracker = MockTracker {
            reject_project: true,
            ..MockTracker::default()
        };
        let confirmations =
            export_to_tracker::<_, MockZephyr>(&tracker, None, false, "QA", &records()).await;

        assert_eq!(confirmations.len(), 1);
        assert!(confirmations[0].starts_with("Error connecting to Jira or finding project 'QA'"));
        assert!(tracker.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_failure_does_not_abort_batch() {
        let tracker = MockTracker {
            fail_summary: Some("lockout"),
            ..MockTracker::default()
        };
        let mut batch = records();
        batch.push(TestCaseRecord::new("Verify logout"));

        let confirmations =
            export_to_tracker::<_, MockZephyr>(&tracker, None, false, "QA", &batch).await;

        assert_eq!(confirmations.len(), 3);
        assert_eq!(
            confirmations[1],
            "Error creating issue for 'Verify lockout after three fai...'. Jira/Zephyr API Error: HTTP 400"
        );
        assert_eq!(confirmations[2], "Successfully created issue: QA-2");
    }

    #[tokio::test]
    async fn test_zephyr_mode_links_test_cases() {
        let tracker = MockTracker::default();
        let zephyr = MockZephyr { assign_key: true };

        let confirmations =
            export_to_tracker(&tracker, Some(&zephyr), true, "QA", &records()[..1]).await;

        assert_eq!(
            confirmations,
            vec![
                "Successfully created Jira container issue: QA-1",
                "Successfully created Zephyr Scale Test Case: QA-1-T linked to QA-1"
            ]
        );
        let created = tracker.created.lock().unwrap();
        assert_eq!(created[0].0, "Test Case Container: Verify login succeeds");
        assert_eq!(created[0].1, "Story");
    }

    #[tokio::test]
    async fn test_zephyr_mode_without_key_or_token() {
        let tracker = MockTracker::default();
        let zephyr = MockZephyr { assign_key: false };

        let confirmations =
            export_to_tracker(&tracker, Some(&zephyr), true, "QA", &records()[..1]).await;
        assert_eq!(confirmations[1], "Failed to create Zephyr Scale Test Case for QA-1");

        let confirmations =
            export_to_tracker::<_, MockZephyr>(&tracker, None, true, "QA", &records()).await;
        assert_eq!(confirmations.len(), 2);
        assert!(confirmations
            .iter()
            .all(|c| c.contains("requires a Zephyr Scale API Token")));
    }

    #[test]
    fn test_issue_description_sections() {
        let record = TestCaseRecord {
            requirement_id: "REQ-7".to_string(),
            confidence_score: Some("85%".to_string()),
            expected_result: "Account locked".to_string(),
            ..TestCaseRecord::new("Verify lockout")
                .with_steps(vec!["Fail login".to_string(), "Fail again".to_string()])
        };

        let body = issue_description(&record);

        assert!(body.starts_with("h3. Requirement ID\nREQ-7\n\nh3. Test Type\nN/A\n"));
        assert!(body.contains("h3. Confidence Score\n85%\n"));
        assert!(body.contains("h3. Steps to Reproduce\n# Fail login\n# Fail again\n"));
        assert!(body.ends_with("h3. Expected Result\nAccount locked\n"));
    }

    #[test]
    fn test_zephyr_payload_shape() {
        let record = TestCaseRecord {
            expected_result: "Dashboard shown".to_string(),
            ..TestCaseRecord::new("Verify login")
                .with_steps(vec!["Open page".to_string(), "Submit".to_string()])
        };

        let payload = serde_json::to_value(zephyr_test_case("QA", "QA-9", &record)).unwrap();

        assert_eq!(payload["projectKey"], "QA");
        assert_eq!(payload["jiraIssueKey"], "QA-9");
        assert_eq!(payload["status"], "Draft");
        assert_eq!(payload["priority"], "Normal");
        assert_eq!(payload["labels"][0], "Automated");
        assert_eq!(payload["testScript"]["type"], "STEP_BY_STEP");
        assert_eq!(payload["testScript"]["steps"][0]["expectedResult"], "");
        assert_eq!(payload["testScript"]["steps"][1]["expectedResult"], "Dashboard shown");
        assert_eq!(payload["testScript"]["steps"][1]["testData"], "");
    }

    #[test]
    fn test_jira_urls() {
        let client = JiraClient::new("https://acme.atlassian.net/", "a@b.c", "t").unwrap();
        assert_eq!(
            client.url("issue"),
            "https://acme.atlassian.net/rest/api/2/issue"
        );
    }
}
