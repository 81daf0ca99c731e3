//! End-to-end scenarios for the generation pipeline

#[cfg(test)]
mod tests {
    use crate::{
        extract_document, extract_or_explain, parse_response, ExtractorConfig, ExtractorError,
        Pipeline, RetryPolicy, TestCaseEditor, TestCaseGenerator, TextChunker,
    };
    use caseforge_gatekeeper::{QualityConfig, CHECK_PLAUSIBILITY, CHECK_STRUCTURE};
    use caseforge_llm::MockProvider;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    const LOGIN_RESPONSE: &str = "---TEST CASE START---
TC_ID: TC-001
REQ_ID: REQ-1
DESC: Verify login succeeds
TYPE: Functional
PRIORITY: High
STEP: Open page
STEP: Enter credentials
EXPECTED: Dashboard shown
RTM: N/A
CONFIDENCE: 95%
---TEST CASE END---";

    fn zero_delay_config() -> ExtractorConfig {
        ExtractorConfig {
            initial_backoff_ms: 0,
            ..ExtractorConfig::default()
        }
    }

    #[test]
    fn test_login_sentence_through_chunker_and_parser() {
        let chunks = TextChunker::new(ExtractorConfig::default().max_chunk_size)
            .chunk("The system shall allow login with a username and password. ");
        assert_eq!(
            chunks,
            vec!["The system shall allow login with a username and password. "]
        );

        let records = parse_response(LOGIN_RESPONSE);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].steps, vec!["Open page", "Enter credentials"]);
    }

    #[tokio::test]
    async fn test_always_failing_model_returns_empty_quickly() {
        let provider = MockProvider::failing("");
        let generator = TestCaseGenerator::new(
            Arc::new(provider.clone()),
            RetryPolicy::new(3, Duration::ZERO),
        );

        let started = Instant::now();
        let records = generator.generate("The system shall allow login.").await;

        assert!(records.is_empty());
        assert_eq!(provider.call_count(), 3);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_document_to_assessed_records() {
        let mut provider = MockProvider::new("Yes, the steps are logical.");
        provider.add_response("Document chunk", LOGIN_RESPONSE);
        let pipeline = Pipeline::new(
            Arc::new(provider),
            &zero_delay_config(),
            QualityConfig::default(),
        );

        let text = extract_document(
            "requirements.md",
            b"# Access\n\nThe system shall allow login with a username and password.\n",
        )
        .unwrap();
        let outcome = pipeline.run_text(&text).await.unwrap();

        assert_eq!(outcome.chunks_total, 1);
        let record = &outcome.records[0];
        assert_eq!(record.steps, vec!["Open page", "Enter credentials"]);
        let qa = record.quality_assessment.as_ref().unwrap();
        assert!(qa.passed);
        assert_eq!(qa.checks[0].check, CHECK_STRUCTURE);
    }

    #[tokio::test]
    async fn test_explained_upload_feeds_pipeline() {
        let mut provider = MockProvider::new("Yes, the steps are logical.");
        provider.add_response("Document chunk", LOGIN_RESPONSE);
        let pipeline = Pipeline::new(
            Arc::new(provider),
            &zero_delay_config(),
            QualityConfig::default(),
        );

        let text = extract_or_explain(
            "requirements.txt",
            b"The system shall allow login with a username and password.",
        );
        let outcome = pipeline.run_text(&text).await.unwrap();
        assert_eq!(outcome.passed_count(), 1);

        let explanation = extract_or_explain("diagram.png", b"\x89PNG");
        assert!(explanation.starts_with("Unsupported file type"));
        let pipeline = Pipeline::new(
            Arc::new(MockProvider::new("No test cases here.")),
            &zero_delay_config(),
            QualityConfig::structural_only(),
        );
        let result = pipeline.run_text(&explanation).await;
        assert!(matches!(result, Err(ExtractorError::NoTestCases)));
    }

    #[tokio::test]
    async fn test_plausibility_outage_fails_open_end_to_end() {
        let mut provider = MockProvider::new("Yes");
        provider.add_response("Document chunk", LOGIN_RESPONSE);
        provider.add_error("QA Reviewer");
        let pipeline = Pipeline::new(
            Arc::new(provider),
            &zero_delay_config(),
            QualityConfig::default(),
        );

        let outcome = pipeline.run(vec!["chunk".to_string()]).await.unwrap();

        let qa = outcome.records[0].quality_assessment.as_ref().unwrap();
        assert!(qa.check(CHECK_PLAUSIBILITY).unwrap().passed);
        assert!(qa.passed);
    }

    #[tokio::test]
    async fn test_malformed_record_gets_single_structure_check() {
        let response = "---TEST CASE START---\nDESC: Only a description\n---TEST CASE END---";
        let mut provider = MockProvider::new("Yes");
        provider.add_response("Document chunk", response);
        let pipeline = Pipeline::new(
            Arc::new(provider),
            &zero_delay_config(),
            QualityConfig::default(),
        );

        let outcome = pipeline.run(vec!["chunk".to_string()]).await.unwrap();

        let qa = outcome.records[0].quality_assessment.as_ref().unwrap();
        assert!(!qa.passed);
        assert_eq!(qa.checks.len(), 1);
        assert_eq!(qa.checks[0].check, CHECK_STRUCTURE);
    }

    #[tokio::test]
    async fn test_unreachable_model_fails_whole_batch() {
        let pipeline = Pipeline::new(
            Arc::new(MockProvider::failing("offline")),
            &zero_delay_config(),
            QualityConfig::default(),
        );

        let result = pipeline.run_text("First requirement. Second requirement.").await;
        assert!(matches!(result, Err(ExtractorError::NoTestCases)));
    }

    #[tokio::test]
    async fn test_generate_then_edit() {
        let mut provider = MockProvider::new("Yes");
        provider.add_response("Document chunk", LOGIN_RESPONSE);
        provider.add_response(
            "User instruction",
            LOGIN_RESPONSE.replace("PRIORITY: High", "PRIORITY: Low"),
        );
        let provider = Arc::new(provider);
        let pipeline = Pipeline::new(
            Arc::clone(&provider),
            &zero_delay_config(),
            QualityConfig::structural_only(),
        );
        let editor = TestCaseEditor::new(provider);

        let outcome = pipeline.run(vec!["chunk".to_string()]).await.unwrap();
        let edited = editor
            .edit("Lower every priority", outcome.records)
            .await
            .unwrap();

        assert_eq!(edited.len(), 1);
        assert_eq!(edited[0].priority, "Low");
        assert!(edited[0].quality_assessment.is_none());
    }
}
