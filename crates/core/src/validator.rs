//! Numeric validation and sanitization of upstream values.
//!
//! Every raw value is bounded into its domain range and graded. Invalid
//! input never fails: it is replaced by the field default, graded Low and
//! annotated with a message.

use crate::mental_health::fallback::{
    FALLBACK_EARLY_ONSET, FALLBACK_ECONOMIC_IMPACT, FALLBACK_PREVALENCE,
};
use crate::mental_health::{QualityLevel, ValidationResult};

/// Which domain rules apply to a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Percentage in `[0, 100]`.
    Prevalence,
    /// Non-negative amount, reported in thousands of the source unit.
    Economic,
    /// Percentage in `[0, 100]`; callers pre-multiply fractions by 100.
    EarlyOnset,
}

impl ValueKind {
    fn fallback(&self) -> f64 {
        match self {
            ValueKind::Prevalence => FALLBACK_PREVALENCE,
            ValueKind::Economic => FALLBACK_ECONOMIC_IMPACT,
            ValueKind::EarlyOnset => FALLBACK_EARLY_ONSET,
        }
    }

    fn invalid_message(&self) -> &'static str {
        match self {
            ValueKind::Prevalence => "Invalid prevalence value",
            ValueKind::Economic => "Invalid economic value",
            ValueKind::EarlyOnset => "Invalid early onset value",
        }
    }
}

fn invalid(kind: ValueKind) -> ValidationResult {
    ValidationResult {
        is_valid: false,
        value: kind.fallback(),
        quality: QualityLevel::Low,
        message: Some(kind.invalid_message().to_string()),
    }
}

/// Validate and sanitize `raw` according to `kind`.
///
/// Non-finite input (NaN, ±∞) is always invalid.
pub fn validate(raw: f64, kind: ValueKind) -> ValidationResult {
    if !raw.is_finite() {
        return invalid(kind);
    }

    match kind {
        ValueKind::Prevalence | ValueKind::EarlyOnset => {
            if !(0.0..=100.0).contains(&raw) {
                return invalid(kind);
            }
            // Boundary values are plausible but suspicious
            let quality = if raw > 0.0 && raw < 100.0 {
                QualityLevel::High
            } else {
                QualityLevel::Medium
            };
            ValidationResult {
                is_valid: true,
                value: raw.round(),
                quality,
                message: None,
            }
        }
        ValueKind::Economic => {
            if raw < 0.0 {
                return invalid(kind);
            }
            let quality = if raw > 0.0 {
                QualityLevel::High
            } else {
                QualityLevel::Medium
            };
            ValidationResult {
                is_valid: true,
                value: (raw / 1000.0).round(),
                quality,
                message: None,
            }
        }
    }
}
