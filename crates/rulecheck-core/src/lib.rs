//! # rulecheck-core
//!
//! Deterministic building blocks for checking a PDF against natural-language
//! rules.
//!
//! This crate answers the questions that need no language model:
//! - Is the request well formed (one document, exactly three rules)?
//! - What text does the document contain?
//! - Is a model's raw reply a valid verdict, and what does it normalize to?
//!
//! ## Key Guarantees
//!
//! 1. **No LLM calls**: model access lives in `rulecheck-runtime`
//! 2. **Strict parsing**: model replies are validated, never repaired
//! 3. **Complete verdicts**: every [`Verdict`] has all five fields, with a
//!    fixed [`Verdict::fallback`] for anything that cannot be analyzed
//!
//! ## Example
//!
//! ```rust,ignore
//! use rulecheck_core::{parse_verdict, validate_request, PdfTextExtractor, TextExtractor};
//!
//! let rules = validate_request(&pdf_bytes, &["Has a signature", "Has a date", "Names a vendor"])?;
//! let text = PdfTextExtractor::new().extract(&pdf_bytes)?;
//! let verdict = parse_verdict(&rules.rules()[0], model_reply)?;
//! ```

pub mod extract;
pub mod request;
pub mod verdict;

// Re-export main types at crate root
pub use extract::{ExtractedText, ExtractionError, PdfTextExtractor, TextExtractor};
pub use request::{
    validate_request, EvaluationRequest, RequestError, Rule, RuleSet, RULES_PER_REQUEST,
};
pub use verdict::{
    normalize_confidence, parse_verdict, EvaluationResult, Status, Verdict, VerdictError,
    FALLBACK_EVIDENCE, FALLBACK_REASONING, REQUIRED_FIELDS,
};
