//! Status classification against a resolved reference range.
//!
//! `[low, high]` is normal. Outside it but within the critical bounds
//! (inclusive, or unbounded when a critical bound is absent) is a warning.
//! Beyond a critical bound is critical.

use crate::models::{AbnormalFlag, ReferenceRange, Status};

/// Directional flag for a canonical value.
pub fn flag(value: f64, range: &ReferenceRange) -> AbnormalFlag {
    if value < range.low {
        match range.critical_low {
            Some(critical) if value < critical => AbnormalFlag::CriticalLow,
            _ => AbnormalFlag::Low,
        }
    } else if value > range.high {
        match range.critical_high {
            Some(critical) if value > critical => AbnormalFlag::CriticalHigh,
            _ => AbnormalFlag::High,
        }
    } else {
        AbnormalFlag::Normal
    }
}

pub fn classify(value: f64, range: &ReferenceRange) -> Status {
    flag(value, range).status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn glucose() -> ReferenceRange {
        ReferenceRange::default_for("GLUCOSE", 3.3, 5.5).with_critical(Some(2.2), Some(25.0))
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(classify(3.3, &glucose()), Status::Normal);
        assert_eq!(classify(5.5, &glucose()), Status::Normal);
        assert_eq!(classify(4.4, &glucose()), Status::Normal);
    }

    #[test]
    fn outside_normal_is_warning() {
        assert_eq!(flag(6.8, &glucose()), AbnormalFlag::High);
        assert_eq!(classify(6.8, &glucose()), Status::Warning);
        assert_eq!(flag(3.0, &glucose()), AbnormalFlag::Low);
    }

    #[test]
    fn critical_bounds_inclusive_as_warning() {
        assert_eq!(classify(25.0, &glucose()), Status::Warning);
        assert_eq!(classify(2.2, &glucose()), Status::Warning);
    }

    #[test]
    fn beyond_critical_is_critical() {
        assert_eq!(flag(25.1, &glucose()), AbnormalFlag::CriticalHigh);
        assert_eq!(flag(1.9, &glucose()), AbnormalFlag::CriticalLow);
        assert_eq!(classify(30.0, &glucose()), Status::Critical);
    }

    #[test]
    fn cholesterol_scenario() {
        let range = ReferenceRange::default_for("CHOLESTEROL_TOTAL", 3.0, 5.2).with_critical(None, Some(7.8));
        assert_eq!(classify(6.2, &range), Status::Warning);
        assert_eq!(classify(8.1, &range), Status::Critical);
        assert_eq!(classify(0.5, &range), Status::Warning);
    }

    fn arb_range() -> impl Strategy<Value = ReferenceRange> {
        (-1000.0f64..1000.0, 0.0f64..500.0, proptest::option::of(0.0f64..500.0), proptest::option::of(0.0f64..500.0))
            .prop_map(|(low, width, below, above)| {
                ReferenceRange::default_for("X", low, low + width)
                    .with_critical(below.map(|b| low - b), above.map(|a| low + width + a))
            })
    }

    proptest! {
        #[test]
        fn normal_iff_within_bounds(range in arb_range(), value in -3000.0f64..3000.0) {
            let normal = classify(value, &range) == Status::Normal;
            prop_assert_eq!(normal, range.low <= value && value <= range.high);
        }

        #[test]
        fn without_critical_bounds_never_critical(low in -100.0f64..100.0, width in 0.0f64..50.0, value in -500.0f64..500.0) {
            let range = ReferenceRange::default_for("X", low, low + width);
            let status = classify(value, &range);
            prop_assert_ne!(status, Status::Critical);
            if value < low || value > low + width {
                prop_assert_eq!(status, Status::Warning);
            }
        }

        #[test]
        fn critical_only_beyond_critical_bounds(range in arb_range(), value in -3000.0f64..3000.0) {
            if classify(value, &range) == Status::Critical {
                let below = range.critical_low.is_some_and(|c| value < c);
                let above = range.critical_high.is_some_and(|c| value > c);
                prop_assert!(below || above);
            }
        }
    }
}
