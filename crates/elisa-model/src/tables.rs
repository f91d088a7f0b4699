//! Externally supplied reference tables.
//!
//! These are read-only during a batch: the calibration table caps the
//! standard curve, the QC-limits table bounds the controls and the
//! sample assignments map plates to study samples. A lookup miss is a
//! configuration problem and surfaces as an error, never as a default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::barcode::Barcode;
use crate::error::{ElisaError, Result};

/// Sentinel sample identifier for layout slots with no assigned sample.
pub const EMPTY_SAMPLE: &str = "EMPTY";

/// Per-serotype top-standard concentration used to cap the curve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationTable {
    by_serotype: BTreeMap<String, f64>,
}

impl CalibrationTable {
    pub fn new() -> CalibrationTable {
        CalibrationTable::default()
    }

    pub fn insert(&mut self, serotype: impl Into<String>, top_point: f64) {
        self.by_serotype.insert(serotype.into(), top_point);
    }

    /// Nominal top-standard concentration for a serotype.
    pub fn top_point(&self, serotype: &str) -> Result<f64> {
        self.by_serotype
            .get(serotype)
            .copied()
            .ok_or_else(|| ElisaError::UnknownSerotype {
                table: "calibration",
                serotype: serotype.to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.by_serotype.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.by_serotype
            .iter()
            .map(|(serotype, value)| (serotype.as_str(), *value))
    }
}

/// Acceptance bounds for the high and low controls of one serotype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QcLimits {
    pub hi_lower: f64,
    pub hi_upper: f64,
    pub lo_lower: f64,
    pub lo_upper: f64,
}

impl QcLimits {
    /// Inclusive at both limit values.
    pub fn high_in_range(&self, value: f64) -> bool {
        self.hi_lower <= value && value <= self.hi_upper
    }

    pub fn low_in_range(&self, value: f64) -> bool {
        self.lo_lower <= value && value <= self.lo_upper
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QcLimitsTable {
    by_serotype: BTreeMap<String, QcLimits>,
}

impl QcLimitsTable {
    pub fn new() -> QcLimitsTable {
        QcLimitsTable::default()
    }

    pub fn insert(&mut self, serotype: impl Into<String>, limits: QcLimits) {
        self.by_serotype.insert(serotype.into(), limits);
    }

    pub fn limits(&self, serotype: &str) -> Result<&QcLimits> {
        self.by_serotype
            .get(serotype)
            .ok_or_else(|| ElisaError::UnknownSerotype {
                table: "QC limits",
                serotype: serotype.to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.by_serotype.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QcLimits)> {
        self.by_serotype
            .iter()
            .map(|(serotype, limits)| (serotype.as_str(), limits))
    }
}

/// Whether an assignment sheet covers first-run plates, repeats or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunType {
    FirstRun,
    Repeats,
    Mixed,
}

/// Ordered sample identifiers for the 4 sample lanes of each plate.
///
/// First-run plates are keyed by their single block letter, repeat
/// plates by full plate id. Missing slots hold the `EMPTY` sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleAssignments {
    first_run: BTreeMap<String, [String; 4]>,
    repeats: BTreeMap<String, [String; 4]>,
}

impl SampleAssignments {
    pub fn new() -> SampleAssignments {
        SampleAssignments::default()
    }

    pub fn insert_first_run(&mut self, block: char, samples: [String; 4]) {
        self.first_run.insert(block.to_string(), samples);
    }

    pub fn insert_repeat(&mut self, plate_id: impl Into<String>, samples: [String; 4]) {
        self.repeats.insert(plate_id.into(), samples);
    }

    /// Samples for a plate: repeat barcodes resolve by full plate id,
    /// first-run barcodes by the plate id's block letter.
    pub fn resolve(&self, barcode: &Barcode) -> Option<&[String; 4]> {
        if barcode.is_repeat() {
            self.repeats.get(barcode.plate_id())
        } else {
            let block = barcode.block()?;
            self.first_run.get(&block.to_string())
        }
    }

    pub fn run_type(&self) -> RunType {
        match (self.first_run.is_empty(), self.repeats.is_empty()) {
            (false, false) => RunType::Mixed,
            (false, true) => RunType::FirstRun,
            _ => RunType::Repeats,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_run.is_empty() && self.repeats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(names: [&str; 4]) -> [String; 4] {
        names.map(str::to_string)
    }

    #[test]
    fn calibration_lookup() {
        let mut table = CalibrationTable::new();
        table.insert("6B", 12800.0);
        assert_eq!(table.top_point("6B").unwrap(), 12800.0);
        let missing = table.top_point("19F").unwrap_err();
        assert!(missing.to_string().contains("calibration"));
    }

    #[test]
    fn qc_limits_inclusive_bounds() {
        let limits = QcLimits {
            hi_lower: 1.0,
            hi_upper: 2.0,
            lo_lower: 0.2,
            lo_upper: 0.6,
        };
        assert!(limits.high_in_range(1.0));
        assert!(limits.high_in_range(2.0));
        assert!(!limits.high_in_range(2.0001));
        assert!(limits.low_in_range(0.2));
        assert!(!limits.low_in_range(0.1999));
    }

    #[test]
    fn assignment_resolution() {
        let mut assignments = SampleAssignments::new();
        assignments.insert_first_run('A', samples(["1001", "1002", "1003", "EMPTY"]));
        assignments.insert_repeat("6BA", samples(["2001", "EMPTY", "EMPTY", "EMPTY"]));

        let first = Barcode::parse("B6BAJS120523").expect("parse");
        let repeat = Barcode::parse("B6BAJS120523R").expect("parse");

        assert_eq!(assignments.resolve(&first).unwrap()[0], "1001");
        assert_eq!(assignments.resolve(&repeat).unwrap()[0], "2001");
        assert_eq!(assignments.run_type(), RunType::Mixed);
    }

    #[test]
    fn unresolvable_plate() {
        let assignments = SampleAssignments::new();
        let barcode = Barcode::parse("B6BAJS120523").expect("parse");
        assert!(assignments.resolve(&barcode).is_none());
    }
}
