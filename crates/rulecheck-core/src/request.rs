//! Evaluation requests and their validation.
//!
//! Validation is cheap and runs before any extraction or model work.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of rules every evaluation request must carry.
pub const RULES_PER_REQUEST: usize = 3;

/// Errors that reject a request before any work is done.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Exactly {expected} rules are required, got {found}", expected = RULES_PER_REQUEST)]
    WrongRuleCount { found: usize },

    #[error("Rule {index} is empty")]
    EmptyRule { index: usize },

    #[error("PDF document is required")]
    MissingDocument,
}

/// A natural-language rule the document is judged against.
///
/// The caller's text is kept verbatim, surrounding whitespace included;
/// only the emptiness check trims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rule(String);

impl Rule {
    /// Create a rule, or `None` if the text is blank.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Rule {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The validated, ordered rules of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet([Rule; RULES_PER_REQUEST]);

impl RuleSet {
    /// Validate raw rule strings into a rule set.
    ///
    /// The count is checked first, then each entry in order.
    pub fn new<S: AsRef<str>>(rules: &[S]) -> Result<Self, RequestError> {
        if rules.len() != RULES_PER_REQUEST {
            return Err(RequestError::WrongRuleCount { found: rules.len() });
        }

        let parsed = rules
            .iter()
            .enumerate()
            .map(|(index, text)| {
                Rule::new(text.as_ref()).ok_or(RequestError::EmptyRule { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rules: [Rule; RULES_PER_REQUEST] = parsed
            .try_into()
            .map_err(|v: Vec<Rule>| RequestError::WrongRuleCount { found: v.len() })?;

        Ok(Self(rules))
    }

    pub fn rules(&self) -> &[Rule; RULES_PER_REQUEST] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter()
    }
}

/// One document plus the rules to check it against.
#[derive(Debug, Clone, Default)]
pub struct EvaluationRequest {
    /// Raw bytes of the uploaded PDF
    pub document: Vec<u8>,

    /// Rules in caller order
    pub rules: Vec<String>,
}

impl EvaluationRequest {
    pub fn new(document: impl Into<Vec<u8>>, rules: Vec<String>) -> Self {
        Self {
            document: document.into(),
            rules,
        }
    }

    /// Validate the request. See [`validate_request`].
    pub fn validate(&self) -> Result<RuleSet, RequestError> {
        validate_request(&self.document, &self.rules)
    }
}

/// Validate a document buffer and its rules.
///
/// Rule problems are reported ahead of a missing document.
pub fn validate_request<S: AsRef<str>>(
    document: &[u8],
    rules: &[S],
) -> Result<RuleSet, RequestError> {
    let rules = RuleSet::new(rules)?;
    if document.is_empty() {
        return Err(RequestError::MissingDocument);
    }
    Ok(rules)
}
