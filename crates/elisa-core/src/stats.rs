//! Small statistics helpers used by the series computations.

pub use elisa_model::round3;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Mean over the present values; `None` when nothing is present.
pub fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().copied().flatten().collect();
    mean(&present)
}

/// Mean requiring every value to be present.
pub fn mean_strict(values: &[Option<f64>]) -> Option<f64> {
    if values.iter().any(Option::is_none) {
        return None;
    }
    mean_present(values)
}

/// Sample standard deviation (n-1 divisor); `None` below 2 values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Replicate agreement as %CV: sample stdev over mean, times 100.
///
/// `None` when the CV is not finite (degenerate zero mean).
pub fn replicate_cv(values: &[f64]) -> Option<f64> {
    let std = sample_std(values)?;
    let mean = mean(values)?;
    let cv = std / mean * 100.0;
    cv.is_finite().then_some(cv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_point_sample_std() {
        // For two values the n-1 stdev is |a-b| / sqrt(2).
        let std = sample_std(&[4.0, 2.0]).unwrap();
        assert!((std - 2.0 / std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn replicate_cv_matches_closed_form() {
        let cv = replicate_cv(&[900.0, 1100.0]).unwrap();
        let expected = (200.0 / std::f64::consts::SQRT_2) / 1000.0 * 100.0;
        assert!((cv - expected).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(replicate_cv(&[0.0, 0.0]), None);
        assert_eq!(mean_strict(&[Some(1.0), None]), None);
        assert_eq!(mean_present(&[Some(1.0), None]), Some(1.0));
    }
}
