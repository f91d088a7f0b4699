//! Property tests for the replicate-agreement statistics.

use elisa_core::stats::{mean, replicate_cv, sample_std};
use proptest::prelude::*;

proptest! {
    #[test]
    fn cv_matches_two_point_closed_form(a in 0.01f64..1e6, b in 0.01f64..1e6) {
        let cv = replicate_cv(&[a, b]);
        let mean = (a + b) / 2.0;
        let expected = ((a - b).abs() / std::f64::consts::SQRT_2) / mean * 100.0;
        if (a - b).abs() < f64::EPSILON {
            prop_assert!(cv.is_none_or(|cv| cv.abs() < 1e-9));
        } else {
            let cv = cv.expect("finite cv");
            prop_assert!((cv - expected).abs() <= 1e-9 * expected.max(1.0));
        }
    }

    #[test]
    fn cv_is_scale_invariant(a in 0.01f64..1e3, b in 0.01f64..1e3, scale in 0.1f64..1e3) {
        prop_assume!((a - b).abs() > 1e-9);
        let original = replicate_cv(&[a, b]).expect("finite cv");
        let scaled = replicate_cv(&[a * scale, b * scale]).expect("finite cv");
        prop_assert!((original - scaled).abs() <= 1e-6 * original.max(1.0));
    }

    #[test]
    fn std_is_never_negative(values in proptest::collection::vec(-1e6f64..1e6, 2..16)) {
        let std = sample_std(&values).expect("enough values");
        prop_assert!(std >= 0.0);
    }

    #[test]
    fn mean_stays_within_bounds(values in proptest::collection::vec(-1e6f64..1e6, 1..16)) {
        let mean = mean(&values).expect("non-empty");
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(mean >= min - 1e-9 && mean <= max + 1e-9);
    }
}
