//! High/low control evaluation.
//!
//! Controls share the series computation with samples but carry a
//! stricter failure policy: the same physical wells cannot be rerun, so
//! anything a sample would repeat makes a control not reportable.

use serde::Serialize;

use elisa_model::{PlateGrid, QcLevel, ReportableResult};

use crate::sample::{non_parallel_code, recalculated_value};
use crate::series::{DilutionSeries, SeriesPolicy};

#[derive(Debug, Clone, Serialize)]
pub struct QcEvaluation {
    pub level: QcLevel,
    pub series: DilutionSeries,
    /// Headline result from the series computation.
    pub result: ReportableResult,
    /// Recalculated value or the `NR` code.
    pub result_recalc: ReportableResult,
    pub failed: bool,
}

impl QcEvaluation {
    pub fn evaluate(grid: &PlateGrid, level: QcLevel) -> QcEvaluation {
        let series = DilutionSeries::compute(&grid.qc_lane(level), &SeriesPolicy::qc());
        let (result_recalc, failed) = check_recalc(&series);
        QcEvaluation {
            level,
            result: series.result,
            series,
            result_recalc,
            failed,
        }
    }

    /// Value used for the out-of-range comparison: the recalculated
    /// value when numeric, otherwise the headline result.
    pub fn numeric_result(&self) -> Option<f64> {
        self.result_recalc
            .as_value()
            .or_else(|| self.result.as_value())
    }

    /// Invalidate the control after a plate-level curve/blank failure.
    pub(crate) fn mark_not_reportable(&mut self) {
        self.failed = true;
        self.result_recalc = ReportableResult::NotReportable;
    }
}

fn check_recalc(series: &DilutionSeries) -> (ReportableResult, bool) {
    // No repeat path exists for a control.
    if series.valid_row_count() <= 1 {
        return (ReportableResult::NotReportable, true);
    }
    if non_parallel_code(series).is_some() {
        return (ReportableResult::NotReportable, true);
    }
    // Break-point recalculation as for samples, but never downgraded to
    // an LLOQ marker.
    match recalculated_value(series) {
        Some(value) => (ReportableResult::Value(value), false),
        None => (ReportableResult::Empty, false),
    }
}
