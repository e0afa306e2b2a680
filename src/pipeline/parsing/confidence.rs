//! Extraction confidence factors.
//!
//! A measurement's confidence is the product of independent factors, each
//! in [0, 1], times the lowest OCR confidence among the tokens it was built
//! from. No learned weights.

/// Confidence thresholds used by the pipeline and reviewers
pub mod thresholds {
    /// Below this: extraction likely failed.
    pub const VERY_LOW: f32 = 0.30;

    /// Below this: significant uncertainty.
    pub const LOW: f32 = 0.50;

    /// Below this: a reviewer should confirm the measurement.
    pub const MODERATE: f32 = 0.70;

    /// Above this: high confidence. No special flagging.
    pub const HIGH: f32 = 0.85;

    /// Above this: very high confidence. Extracted from digital source.
    pub const VERY_HIGH: f32 = 0.95;
}

/// Name factor for a label that matched nothing in the catalog.
pub const UNKNOWN_NAME: f32 = 0.40;

/// Provenance factors.
pub const TEMPLATE_PROVENANCE: f32 = 1.0;
pub const FALLBACK_PROVENANCE: f32 = 0.90;

/// Unit factors.
pub const UNIT_KNOWN: f32 = 1.0;
pub const UNIT_GENERIC: f32 = 0.95;
pub const UNIT_MISSING: f32 = 0.85;

/// Applied when more than one value candidate competed for the row.
pub const AMBIGUITY_PENALTY: f32 = 0.80;

/// Numeric factors.
pub const NUMBER_CLEAN: f32 = 1.0;
pub const NUMBER_FOREIGN_SEPARATOR: f32 = 0.95;
pub const NUMBER_COMPARATOR: f32 = 0.90;
pub const NUMBER_THOUSANDS_GUESS: f32 = 0.85;

/// Decay per rank for alternative value candidates.
pub const ALTERNATIVE_DECAY: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceFactors {
    pub name: f32,
    pub numeric: f32,
    pub provenance: f32,
    pub unit: f32,
    pub ambiguity: f32,
    pub min_token: f32,
}

impl ConfidenceFactors {
    /// Product of all factors, clamped to [0, 1].
    pub fn combine(&self) -> f32 {
        let product = self.name * self.numeric * self.provenance * self.unit * self.ambiguity * self.min_token;
        if product.is_nan() {
            return 0.0;
        }
        product.clamp(0.0, 1.0)
    }
}

/// Confidence of the value candidate at `rank` (0 = best).
pub fn candidate_confidence(numeric: f32, rank: usize) -> f32 {
    (numeric * (1.0 - ALTERNATIVE_DECAY * rank as f32)).max(0.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors() -> ConfidenceFactors {
        ConfidenceFactors {
            name: 1.0,
            numeric: 1.0,
            provenance: TEMPLATE_PROVENANCE,
            unit: UNIT_KNOWN,
            ambiguity: 1.0,
            min_token: 1.0,
        }
    }

    #[test]
    fn perfect_factors_give_one() {
        assert_eq!(factors().combine(), 1.0);
    }

    #[test]
    fn factors_multiply() {
        let f = ConfidenceFactors {
            provenance: FALLBACK_PROVENANCE,
            ambiguity: AMBIGUITY_PENALTY,
            ..factors()
        };
        assert!((f.combine() - 0.72).abs() < 1e-6);
    }

    #[test]
    fn result_is_clamped() {
        let over = ConfidenceFactors { min_token: 3.0, ..factors() };
        assert_eq!(over.combine(), 1.0);
        let under = ConfidenceFactors { name: -1.0, ..factors() };
        assert_eq!(under.combine(), 0.0);
        let nan = ConfidenceFactors { name: f32::NAN, ..factors() };
        assert_eq!(nan.combine(), 0.0);
    }

    #[test]
    fn unknown_names_fall_below_review_threshold() {
        let f = ConfidenceFactors { name: UNKNOWN_NAME, ..factors() };
        assert!(f.combine() < thresholds::MODERATE);
    }

    #[test]
    fn alternatives_decay_by_rank() {
        assert_eq!(candidate_confidence(1.0, 0), 1.0);
        assert!(candidate_confidence(1.0, 1) < candidate_confidence(1.0, 0));
        assert!(candidate_confidence(1.0, 10) >= 0.1);
    }
}
