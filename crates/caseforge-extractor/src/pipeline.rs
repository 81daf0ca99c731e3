//! Concurrent fan-out over document chunks
//!
//! Each chunk runs generate → parse → quality-check in its own task. At most
//! `concurrency` chunks are in flight; results are gathered in completion order.

use crate::chunking::TextChunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::generator::TestCaseGenerator;
use crate::types::BatchOutcome;
use caseforge_domain::traits::LlmProvider;
use caseforge_domain::TestCaseRecord;
use caseforge_gatekeeper::{QualityChecker, QualityConfig};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Runs generation and quality checks over every chunk of a document
pub struct Pipeline<L: LlmProvider + 'static> {
    chunker: TextChunker,
    generator: Arc<TestCaseGenerator<L>>,
    checker: Arc<QualityChecker<L>>,
    concurrency: usize,
}

impl<L: LlmProvider + 'static> Pipeline<L> {
    /// Build a pipeline sharing one provider between generation and quality checks
    pub fn new(llm: Arc<L>, config: &ExtractorConfig, quality: QualityConfig) -> Self {
        Self {
            chunker: TextChunker::new(config.max_chunk_size),
            generator: Arc::new(TestCaseGenerator::new(
                Arc::clone(&llm),
                config.retry_policy(),
            )),
            checker: Arc::new(QualityChecker::new(llm, quality)),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Replace the generator, e.g. to inject a retry policy with a test sleeper
    pub fn with_generator(mut self, generator: TestCaseGenerator<L>) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    /// Chunk the document text and run every chunk
    pub async fn run_text(&self, text: &str) -> Result<BatchOutcome, ExtractorError> {
        let chunks = self.chunker.chunk(text);
        info!("Split document into {} chunks", chunks.len());
        self.run(chunks).await
    }

    /// Run every chunk and aggregate the surviving records
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::NoTestCases`] if no chunk contributed a record.
    /// Failing or panicking chunks are logged and excluded.
    pub async fn run(&self, chunks: Vec<String>) -> Result<BatchOutcome, ExtractorError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut outcome = BatchOutcome {
            chunks_total: chunks.len(),
            ..BatchOutcome::default()
        };

        for (index, chunk) in chunks.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let generator = Arc::clone(&self.generator);
            let checker = Arc::clone(&self.checker);

            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring only waits
                let _permit = semaphore.acquire_owned().await;
                (index, process_chunk(&generator, &checker, &chunk).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(records))) if records.is_empty() => {
                    debug!("Chunk {} produced no test cases", index);
                    outcome.empty_chunks += 1;
                }
                Ok((index, Ok(records))) => {
                    debug!("Chunk {} produced {} test cases", index, records.len());
                    outcome.records.extend(records);
                }
                Ok((index, Err(e))) => {
                    warn!("Chunk {} failed: {}", index, e);
                    outcome.failed_chunks += 1;
                }
                Err(e) => {
                    warn!("Chunk task did not complete: {}", e);
                    outcome.failed_chunks += 1;
                }
            }
        }

        if outcome.records.is_empty() {
            error!(
                "No test cases generated from {} chunks ({} empty, {} failed)",
                outcome.chunks_total, outcome.empty_chunks, outcome.failed_chunks
            );
            return Err(ExtractorError::NoTestCases);
        }

        info!(
            "Generated {} test cases ({} passed quality checks) from {} chunks",
            outcome.records.len(),
            outcome.passed_count(),
            outcome.chunks_total
        );
        Ok(outcome)
    }
}

async fn process_chunk<L: LlmProvider>(
    generator: &TestCaseGenerator<L>,
    checker: &QualityChecker<L>,
    chunk: &str,
) -> Result<Vec<TestCaseRecord>, ExtractorError> {
    let mut records = generator.try_generate(chunk).await?;
    checker.check_all(&mut records).await;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use async_trait::async_trait;
    use caseforge_llm::{LlmError, MockProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn block(desc: &str) -> String {
        format!(
            "---TEST CASE START---\nTC_ID: TC-{desc}\nREQ_ID: REQ-1\nDESC: {desc}\nTYPE: Functional\n\
             PRIORITY: High\nSTEP: Step one\nEXPECTED: Works\nRTM: N/A\n---TEST CASE END---"
        )
    }

    fn fast_config() -> ExtractorConfig {
        ExtractorConfig {
            initial_backoff_ms: 0,
            ..ExtractorConfig::default()
        }
    }

    fn pipeline(provider: MockProvider, quality: QualityConfig) -> Pipeline<MockProvider> {
        Pipeline::new(Arc::new(provider), &fast_config(), quality)
    }

    #[tokio::test]
    async fn test_one_failing_chunk_does_not_fail_batch() {
        let mut provider = MockProvider::new("Yes");
        provider.add_error("poison");
        provider.add_response("alpha", block("Alpha"));
        provider.add_response("beta", block("Beta"));
        let pipeline = pipeline(provider.clone(), QualityConfig::structural_only());

        let outcome = pipeline
            .run(vec!["alpha".into(), "poison".into(), "beta".into()])
            .await
            .unwrap();

        let mut descriptions: Vec<_> = outcome.records.iter().map(|r| r.description.clone()).collect();
        descriptions.sort();
        assert_eq!(descriptions, vec!["Alpha", "Beta"]);
        assert_eq!(outcome.failed_chunks, 1);
        assert_eq!(outcome.chunks_total, 3);
        // 3 attempts for the poisoned chunk, 1 for each healthy chunk
        assert_eq!(provider.call_count(), 5);
    }

    #[tokio::test]
    async fn test_all_chunks_empty_is_batch_failure() {
        let pipeline = pipeline(MockProvider::new(""), QualityConfig::default());
        let result = pipeline.run(vec!["one".into(), "two".into()]).await;
        assert!(matches!(result, Err(ExtractorError::NoTestCases)));
    }

    #[tokio::test]
    async fn test_empty_chunk_counted_separately() {
        let mut provider = MockProvider::new("Yes");
        provider.add_response("nothing here", "");
        provider.add_response("alpha", block("Alpha"));
        let pipeline = pipeline(provider, QualityConfig::structural_only());

        let outcome = pipeline
            .run(vec!["alpha".into(), "nothing here".into()])
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.empty_chunks, 1);
        assert_eq!(outcome.failed_chunks, 0);
    }

    #[tokio::test]
    async fn test_records_carry_quality_assessment() {
        let mut provider = MockProvider::new("Yes, plausible.");
        provider.add_response("Document chunk", block("Alpha"));
        let pipeline = pipeline(provider, QualityConfig::default());

        let outcome = pipeline.run_text("The system shall allow login.").await.unwrap();

        assert_eq!(outcome.records.len(), 1);
        let qa = outcome.records[0].quality_assessment.as_ref().unwrap();
        assert!(qa.passed);
        assert_eq!(qa.checks.len(), 3);
        assert_eq!(outcome.passed_count(), 1);
    }

    #[tokio::test]
    async fn test_with_generator_overrides_retry_policy() {
        let provider = MockProvider::failing("down");
        let generator =
            TestCaseGenerator::new(Arc::new(provider.clone()), RetryPolicy::new(1, Duration::ZERO));
        let pipeline = pipeline(provider.clone(), QualityConfig::default()).with_generator(generator);

        let result = pipeline.run(vec!["chunk".into()]).await;

        assert!(matches!(result, Err(ExtractorError::NoTestCases)));
        assert_eq!(provider.call_count(), 1);
    }

    /// Panics on any prompt containing "panic", tracks peak concurrency otherwise
    struct ProbeProvider {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for ProbeProvider {
        type Error = LlmError;

        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            if prompt.contains("panic") {
                panic!("provider exploded");
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(block("Probe"))
        }
    }

    #[tokio::test]
    async fn test_panicking_chunk_is_isolated_and_concurrency_bounded() {
        let provider = Arc::new(ProbeProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let config = ExtractorConfig {
            concurrency: 2,
            ..fast_config()
        };
        let pipeline = Pipeline::new(Arc::clone(&provider), &config, QualityConfig::structural_only());

        let mut chunks: Vec<String> = (0..6).map(|i| format!("chunk {}", i)).collect();
        chunks.push("panic".to_string());

        let outcome = pipeline.run(chunks).await.unwrap();

        assert_eq!(outcome.records.len(), 6);
        assert_eq!(outcome.failed_chunks, 1);
        assert!(provider.peak.load(Ordering::SeqCst) <= 2);
    }
}
