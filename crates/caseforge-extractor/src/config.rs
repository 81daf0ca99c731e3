//! Configuration for the generation pipeline

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for chunking, fan-out and retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum chunk size (characters)
    pub max_chunk_size: usize,

    /// Number of chunks processed at the same time
    pub concurrency: usize,

    /// Model calls per chunk before giving up
    pub max_attempts: u32,

    /// Delay after the first failed attempt; doubles after each further failure
    pub initial_backoff_ms: u64,

    /// Largest accepted upload (bytes)
    pub max_document_bytes: usize,
}

impl ExtractorConfig {
    /// Get the initial backoff as a Duration
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Retry policy for generation calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.initial_backoff())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.max_document_bytes == 0 {
            return Err("max_document_bytes must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 12_000,
            concurrency: 8,
            max_attempts: 3,
            initial_backoff_ms: 2_000,
            max_document_bytes: 20 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_chunk_size, 12_000);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff(), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ExtractorConfig {
            concurrency: 0,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("concurrency"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = ExtractorConfig {
            max_attempts: 0,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = ExtractorConfig::default().retry_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }
}
