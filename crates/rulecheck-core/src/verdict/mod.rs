//! Verdicts: the per-rule outcome of an evaluation.
//!
//! A verdict is always complete. When the model cannot produce a valid
//! one, [`Verdict::fallback`] stands in with a fixed shape.

mod confidence;
mod parser;

pub use confidence::normalize_confidence;
pub use parser::{parse_verdict, VerdictError, REQUIRED_FIELDS};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::request::{Rule, RULES_PER_REQUEST};

/// Evidence text of the fallback verdict.
pub const FALLBACK_EVIDENCE: &str = "Unable to analyze";

/// Reasoning text of the fallback verdict.
pub const FALLBACK_REASONING: &str = "Error occurred during analysis";

/// Whether the document satisfies a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    /// Parse a status, ignoring case and surrounding whitespace.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("pass") {
            Some(Self::Pass)
        } else if text.eq_ignore_ascii_case("fail") {
            Some(Self::Fail)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured judgment for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verdict {
    /// The rule as the caller supplied it
    pub rule: String,

    /// Pass or fail
    pub status: Status,

    /// Excerpt or description supporting the status
    pub evidence: String,

    /// Why the status was chosen
    pub reasoning: String,

    /// Confidence on a 0-100 scale
    pub confidence: u8,
}

impl Verdict {
    /// The verdict returned whenever a rule could not be analyzed.
    pub fn fallback(rule: &Rule) -> Self {
        Self {
            rule: rule.as_str().to_string(),
            status: Status::Fail,
            evidence: FALLBACK_EVIDENCE.to_string(),
            reasoning: FALLBACK_REASONING.to_string(),
            confidence: 0,
        }
    }

    /// Whether this has the exact shape of a fallback verdict.
    pub fn is_fallback(&self) -> bool {
        self.status == Status::Fail
            && self.confidence == 0
            && self.evidence == FALLBACK_EVIDENCE
            && self.reasoning == FALLBACK_REASONING
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }
}

/// The three verdicts of one request, in rule order.
///
/// Serializes as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationResult {
    verdicts: [Verdict; RULES_PER_REQUEST],
}

impl EvaluationResult {
    pub fn new(verdicts: [Verdict; RULES_PER_REQUEST]) -> Self {
        Self { verdicts }
    }

    pub fn verdicts(&self) -> &[Verdict; RULES_PER_REQUEST] {
        &self.verdicts
    }

    pub fn into_verdicts(self) -> [Verdict; RULES_PER_REQUEST] {
        self.verdicts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter()
    }

    /// Number of rules that passed.
    pub fn passed_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed()).count()
    }
}
