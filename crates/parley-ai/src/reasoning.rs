//! Reasoning-effort compatibility policy.
//!
//! Some model families accept a `reasoning.effort` request parameter;
//! sending it to any other model is a request error. The rule is a prefix
//! table so new families are a one-line change.

use std::fmt;

/// Model-id prefixes that accept the reasoning parameter.
const REASONING_MODEL_PREFIXES: &[&str] = &["gpt-5"];

/// Whether `model` accepts the `reasoning.effort` request parameter.
pub fn supports_reasoning(model: &str) -> bool {
    REASONING_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Inference depth/cost knob for reasoning-compatible models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    #[default]
    Medium,
    High,
}

impl ReasoningEffort {
    /// Parse a user-supplied effort level; anything unrecognized (including
    /// absence) becomes `Medium`. The single defaulting point — every read
    /// of effort goes through this or the enum.
    pub fn normalize(value: Option<&str>) -> Self {
        match value {
            Some("low") => Self::Low,
            Some("medium") => Self::Medium,
            Some("high") => Self::High,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
