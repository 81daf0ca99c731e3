//! Caseforge Domain Layer
//!
//! Core types and trait seams shared by every other crate in the workspace.
//!
//! ## Key Concepts
//!
//! - **TestCaseRecord**: a structured test case synthesized from one chunk of a requirement document
//! - **QualityAssessment**: the pass/fail annotation appended by the quality checker
//! - **Chunk**: a bounded-size substring of the source document, the unit of concurrent work
//!
//! ## Architecture
//!
//! This crate holds no infrastructure. External collaborators (the generative model, the
//! history store, the issue tracker) are reached only through the traits in [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod quality;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use quality::{QualityAssessment, QualityCheck};
pub use record::{TestCaseRecord, REQUIRED_FIELDS};
