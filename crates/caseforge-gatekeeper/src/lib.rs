//! Caseforge Gatekeeper
//!
//! Quality control for generated test cases.
//!
//! The Gatekeeper runs three ordered checks per record:
//! - Structure: every required field present
//! - Plausibility: the model judges whether the steps and expected result fit the description
//! - RTM Validation: the model judges whether the description and compliance mapping connect
//!
//! A structural failure short-circuits the remaining checks. The two model-backed checks
//! fail open: an unreachable model counts as a pass with an explanatory note.
//!
//! # Examples
//!
//! ```no_run
//! use caseforge_gatekeeper::{QualityChecker, QualityConfig};
//! use caseforge_llm::MockProvider;
//! use std::sync::Arc;
//!
//! let checker = QualityChecker::new(Arc::new(MockProvider::new("Yes")), QualityConfig::default());
//! // checker.check_all(&mut records).await;
//! ```

#![warn(missing_docs)]

mod config;
mod validator;

pub use config::QualityConfig;
pub use validator::{
    QualityChecker, CHECK_PLAUSIBILITY, CHECK_RTM, CHECK_STRUCTURE,
};
