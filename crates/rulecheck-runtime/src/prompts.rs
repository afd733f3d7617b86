//! Evaluation prompt.
//!
//! One user message per rule. The rule and the full document text are
//! embedded verbatim; the model is told to answer with the five verdict
//! fields and nothing else.

use rulecheck_core::Rule;

use crate::providers::ChatMessage;

/// Prompt template. `{rule}` and `{text}` are substituted.
pub const RULE_CHECK_PROMPT: &str = r#"You are an AI that checks if a document meets a rule.

Rule: {rule}
Document Text: {text}

Respond ONLY in the following JSON format:
{
  "rule": "...",
  "status": "pass" or "fail",
  "evidence": "...",
  "reasoning": "...",
  "confidence": number
}"#;

/// Build the messages for checking `rule` against `text`.
pub fn build_rule_prompt(rule: &Rule, text: &str) -> Vec<ChatMessage> {
    // Substitute the rule first so braces in the document are never expanded.
    let (head, tail) = RULE_CHECK_PROMPT
        .split_once("{text}")
        .unwrap_or((RULE_CHECK_PROMPT, ""));
    let content = format!("{}{}{}", head.replace("{rule}", rule.as_str()), text, tail);

    vec![ChatMessage::user(content)]
}
