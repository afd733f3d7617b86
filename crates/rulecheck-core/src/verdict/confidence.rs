//! Confidence normalization.

use super::VerdictError;

/// Normalize a model-reported confidence onto the 0-100 integer scale.
///
/// Values up to and including 1 are fractions and get scaled by 100.
/// Larger values are already percentages. Results are rounded to the
/// nearest integer and capped at 100; negative or non-finite input is
/// rejected.
pub fn normalize_confidence(raw: f64) -> Result<u8, VerdictError> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(VerdictError::InvalidConfidence(raw));
    }

    let percent = if raw <= 1.0 { raw * 100.0 } else { raw };
    let rounded = percent.round();
    if rounded > 100.0 {
        tracing::debug!(raw, "Confidence above 100 clamped");
        return Ok(100);
    }

    Ok(rounded as u8)
}
