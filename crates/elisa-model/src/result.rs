//! Reportable results, row labels and plate-level failure codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker attached to a dilution row during series computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowLabel {
    #[default]
    None,
    /// Replicate disagreement at or above 15 %CV.
    HighCv,
    /// Curve row attributed to near-zero-signal noise rather than fit.
    LowOd,
    /// Curve top rows saturated (mean OD >= 2).
    Saturated,
    /// Curve row average above the assigned top standard.
    AboveMax,
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RowLabel::None => "",
            RowLabel::HighCv => ">15%",
            RowLabel::LowOd => "<0.1",
            RowLabel::Saturated => ">2.0",
            RowLabel::AboveMax => ">max",
        };
        f.write_str(text)
    }
}

/// Final per-sample outcome: a numeric concentration, a censored LLOQ
/// marker, or a repeat/fail code.
///
/// Exactly one state holds at a time; numeric and marker states are
/// mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ReportableResult {
    /// No value could be derived (empty lane, unreadable data).
    Empty,
    /// Reportable concentration in ug/mL, rounded to 3 d.p.
    Value(f64),
    /// Below the lower limit of quantification; reported as "<0.15".
    BelowLloq,
    /// Repeat the sample (poor replicates).
    Repeat,
    /// Repeat at 1:500 dilution (high-end saturation).
    RepeatAt500,
    /// Possible QNS or below-LLOQ material; needs manual review.
    CheckLow,
    /// Non-parallel dilution series.
    NonParallel,
    /// Inter-row CV break caused by a poor replicate; simple repeat.
    RepeatHighCv,
    /// Not reportable (controls only; no repeat path exists).
    NotReportable,
}

impl ReportableResult {
    pub fn is_empty(&self) -> bool {
        matches!(self, ReportableResult::Empty)
    }

    /// Numeric value when this result is a concentration.
    pub fn as_value(&self) -> Option<f64> {
        match self {
            ReportableResult::Value(value) => Some(*value),
            _ => None,
        }
    }

    /// True for the repeat/fail codes (not numeric, LLOQ or empty).
    pub fn is_code(&self) -> bool {
        !matches!(
            self,
            ReportableResult::Empty | ReportableResult::Value(_) | ReportableResult::BelowLloq
        )
    }
}

impl fmt::Display for ReportableResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportableResult::Empty => Ok(()),
            ReportableResult::Value(value) => write!(f, "{value:.3}"),
            ReportableResult::BelowLloq => f.write_str("<0.15"),
            ReportableResult::Repeat => f.write_str("RPT"),
            ReportableResult::RepeatAt500 => f.write_str("RPT 1:500"),
            ReportableResult::CheckLow => f.write_str("Check Low"),
            ReportableResult::NonParallel => f.write_str("RPT NP"),
            ReportableResult::RepeatHighCv => f.write_str(">20% RPT"),
            ReportableResult::NotReportable => f.write_str("NR"),
        }
    }
}

/// Plate-level failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateFail {
    /// Blank OD out of range.
    R11,
    /// Curve or r-squared failure.
    R16,
    /// High control failed or out of range.
    R2,
    /// Low control failed or out of range.
    R3,
    /// Both controls failed or out of range.
    R2R3,
    /// Wrong protocol applied for the plate's serotype.
    R4,
}

impl fmt::Display for PlateFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PlateFail::R11 => "R11",
            PlateFail::R16 => "R16",
            PlateFail::R2 => "R2",
            PlateFail::R3 => "R3",
            PlateFail::R2R3 => "R2+R3",
            PlateFail::R4 => "R4",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reportable_display() {
        assert_eq!(ReportableResult::Value(1.2345).to_string(), "1.234");
        assert_eq!(ReportableResult::Value(0.1).to_string(), "0.100");
        assert_eq!(ReportableResult::BelowLloq.to_string(), "<0.15");
        assert_eq!(ReportableResult::RepeatAt500.to_string(), "RPT 1:500");
        assert_eq!(ReportableResult::RepeatHighCv.to_string(), ">20% RPT");
        assert_eq!(ReportableResult::Empty.to_string(), "");
    }

    #[test]
    fn reportable_partitions() {
        assert!(ReportableResult::Repeat.is_code());
        assert!(!ReportableResult::BelowLloq.is_code());
        assert_eq!(ReportableResult::Value(2.0).as_value(), Some(2.0));
        assert_eq!(ReportableResult::NotReportable.as_value(), None);
    }

    #[test]
    fn plate_fail_display() {
        assert_eq!(PlateFail::R2R3.to_string(), "R2+R3");
        assert_eq!(PlateFail::R16.to_string(), "R16");
    }

    #[test]
    fn row_label_display() {
        assert_eq!(RowLabel::HighCv.to_string(), ">15%");
        assert_eq!(RowLabel::AboveMax.to_string(), ">max");
        assert_eq!(RowLabel::None.to_string(), "");
    }
}
