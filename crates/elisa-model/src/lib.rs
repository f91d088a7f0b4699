pub mod barcode;
pub mod error;
pub mod grid;
pub mod numeric;
pub mod result;
pub mod tables;

pub use barcode::Barcode;
pub use error::{ElisaError, Result};
pub use numeric::{format3, round3};
pub use grid::{Lane, PlateGrid, PlateMeta, PlateRow, QcLevel, RangeFlag, Well};
pub use result::{PlateFail, ReportableResult, RowLabel};
pub use tables::{
    CalibrationTable, EMPTY_SAMPLE, QcLimits, QcLimitsTable, RunType, SampleAssignments,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reportable_result_serializes() {
        let json = serde_json::to_string(&ReportableResult::Value(1.234)).expect("serialize");
        let round: ReportableResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(round, ReportableResult::Value(1.234));

        let json = serde_json::to_string(&ReportableResult::NonParallel).expect("serialize");
        assert!(json.contains("NonParallel"));
    }

    #[test]
    fn qc_limits_table_roundtrip() {
        let mut table = QcLimitsTable::new();
        table.insert(
            "4",
            QcLimits {
                hi_lower: 1.5,
                hi_upper: 3.0,
                lo_lower: 0.2,
                lo_upper: 0.5,
            },
        );
        let json = serde_json::to_string(&table).expect("serialize");
        let round: QcLimitsTable = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(round.limits("4").unwrap().hi_upper, 3.0);
    }
}
