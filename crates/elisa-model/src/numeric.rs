//! Numeric conventions shared across the workspace.

/// Round to 3 decimal places, the reporting precision for
/// concentrations, CVs, blank ODs and r-squared values.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Format a value at reporting precision.
pub fn format3(value: f64) -> String {
    format!("{value:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_reporting_precision() {
        assert_eq!(round3(0.12345), 0.123);
        assert_eq!(round3(0.1235), 0.124);
        assert_eq!(round3(1.0), 1.0);
        assert_eq!(format3(0.1), "0.100");
    }
}
