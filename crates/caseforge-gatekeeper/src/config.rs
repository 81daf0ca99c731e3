//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Configuration for the quality checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Ask the model whether steps and expected result are plausible
    pub plausibility_enabled: bool,

    /// Ask the model whether the description and compliance mapping connect
    pub rtm_enabled: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            plausibility_enabled: true,
            rtm_enabled: true,
        }
    }
}

impl QualityConfig {
    /// Structural validation only, no model calls
    pub fn structural_only() -> Self {
        Self {
            plausibility_enabled: false,
            rtm_enabled: false,
        }
    }
}
