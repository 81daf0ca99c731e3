//! Caseforge Extractor
//!
//! Turns requirement documents into test-case records using an LLM.
//!
//! # Architecture
//!
//! ```text
//! Document → text → TextChunker → chunks
//!     → Pipeline ─┬─ TestCaseGenerator → LLM → parse_response ─┐
//!                 │                                             ├→ QualityChecker → records
//!                 └─ ... one task per chunk, bounded ...        ┘
//! ```
//!
//! # Key Features
//!
//! - **Sentence-bounded chunking**: chunks never split a sentence
//! - **Tolerant parsing**: sentinel blocks, with a JSON-array fallback
//! - **Retry with backoff**: per-chunk model failures degrade to an empty chunk
//! - **Bounded fan-out**: one failing chunk never fails the batch
//! - **Bulk editing**: a free-text instruction rewrites the whole list
//!
//! # Example Usage
//!
//! ```no_run
//! use caseforge_extractor::{ExtractorConfig, Pipeline};
//! use caseforge_gatekeeper::QualityConfig;
//! use caseforge_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(MockProvider::new("Yes"));
//! let pipeline = Pipeline::new(llm, &ExtractorConfig::default(), QualityConfig::default());
//!
//! let outcome = pipeline.run_text("The system shall allow login.").await?;
//! println!("Generated {} test cases", outcome.records.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod document;
mod editor;
mod error;
mod generator;
mod parser;
mod pipeline;
mod prompt;
mod retry;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::TextChunker;
pub use config::ExtractorConfig;
pub use document::{extract_document, extract_or_explain, DocumentKind};
pub use editor::TestCaseEditor;
pub use error::{DocumentError, ExtractorError};
pub use generator::TestCaseGenerator;
pub use parser::{format_rtm, parse_response, render_blocks, BLOCK_END, BLOCK_START};
pub use pipeline::Pipeline;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use types::BatchOutcome;
