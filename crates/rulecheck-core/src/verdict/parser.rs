//! Strict parsing of model responses into verdicts.
//!
//! The response must be a bare JSON object. There is no repair step:
//! anything that is not valid JSON, lacks a field, or carries the wrong
//! type is rejected and the caller falls back.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{normalize_confidence, Status, Verdict};
use crate::request::Rule;

/// Fields every model response must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["rule", "status", "evidence", "reasoning", "confidence"];

/// Reasons a model response was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerdictError {
    #[error("Response is not valid JSON: {0}")]
    NotJson(String),

    #[error("Response is not a JSON object")]
    NotObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Unsupported status: {0:?}")]
    InvalidStatus(String),

    #[error("Confidence out of range: {0}")]
    InvalidConfidence(f64),
}

/// Parse a raw model response for `rule`.
///
/// The returned verdict echoes `rule` rather than the model's copy of it.
pub fn parse_verdict(rule: &Rule, raw: &str) -> Result<Verdict, VerdictError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| VerdictError::NotJson(e.to_string()))?;
    let object = value.as_object().ok_or(VerdictError::NotObject)?;

    // Presence is checked for every field before any type check
    if let Some(field) = REQUIRED_FIELDS
        .iter()
        .find(|field| matches!(object.get(**field), None | Some(Value::Null)))
    {
        return Err(VerdictError::MissingField(*field));
    }

    required_text(object, "rule")?;
    let status_text = required_text(object, "status")?;
    let evidence = required_text(object, "evidence")?;
    let reasoning = required_text(object, "reasoning")?;
    let raw_confidence = required_number(object, "confidence")?;

    let status = Status::parse(status_text)
        .ok_or_else(|| VerdictError::InvalidStatus(status_text.to_string()))?;
    let confidence = normalize_confidence(raw_confidence)?;

    Ok(Verdict {
        rule: rule.as_str().to_string(),
        status,
        evidence: evidence.to_string(),
        reasoning: reasoning.to_string(),
        confidence,
    })
}

/// A non-empty string field. Blank strings count as missing.
fn required_text<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, VerdictError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(VerdictError::MissingField(field)),
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(VerdictError::MissingField(field))
        }
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(VerdictError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn required_number(object: &Map<String, Value>, field: &'static str) -> Result<f64, VerdictError> {
    let wrong_type = VerdictError::WrongType {
        field,
        expected: "a number",
    };
    match object.get(field) {
        None | Some(Value::Null) => Err(VerdictError::MissingField(field)),
        Some(Value::Number(n)) => n.as_f64().ok_or(wrong_type),
        Some(_) => Err(wrong_type),
    }
}
