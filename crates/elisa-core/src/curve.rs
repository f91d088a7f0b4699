//! Standard-curve lane evaluation.

use serde::Serialize;

use elisa_model::{
    CalibrationTable, Lane, PlateGrid, PlateRow, ReportableResult, Result, RowLabel,
};

use crate::series::{DilutionSeries, REPLICATE_CV_LIMIT, SeriesPolicy};

/// Outcome of evaluating the standard-curve lane.
#[derive(Debug, Clone, Serialize)]
pub struct CurveEvaluation {
    pub series: DilutionSeries,
    /// Nominal top-standard concentration for the plate's serotype.
    pub top_point: f64,
    pub failed: bool,
}

impl CurveEvaluation {
    pub fn evaluate(
        grid: &PlateGrid,
        serotype: &str,
        calibration: &CalibrationTable,
    ) -> Result<CurveEvaluation> {
        let top_point = calibration.top_point(serotype)?;
        let mut series = DilutionSeries::compute(&grid.lane(Lane::Curve), &SeriesPolicy::curve());

        for row in &mut series.rows {
            // Replicate disagreement at near-zero signal is noise, not a
            // fit problem.
            if row.replicate_cv.is_some_and(|cv| cv >= REPLICATE_CV_LIMIT)
                && row.mean_raw_od() < 0.1
            {
                row.label = RowLabel::LowOd;
                row.replicate_cv = None;
            }
            // The curve cannot exceed its assigned top standard.
            if row.average_conc.is_some_and(|conc| conc > top_point) {
                row.average_conc = None;
                row.label = RowLabel::AboveMax;
                row.replicate_cv = None;
            }
        }
        series.refresh_summary();

        let failed = check_fail(&mut series);
        Ok(CurveEvaluation {
            series,
            top_point,
            failed,
        })
    }

    pub fn result(&self) -> ReportableResult {
        self.series.result
    }
}

/// Replicate-based curve failure.
///
/// A sole poor replicate on the least-dilute row is forgiven when both
/// top rows are saturated (mean OD >= 2): the disagreement is read as
/// saturation rather than a genuine replicate problem and the rows are
/// relabelled `>2.0`.
fn check_fail(series: &mut DilutionSeries) -> bool {
    let poor_rows: Vec<PlateRow> = series
        .rows
        .iter()
        .filter(|row| row.has_poor_replicates() && row.mean_raw_od() >= 0.1)
        .map(|row| row.row)
        .collect();

    if poor_rows == [PlateRow::A] {
        let top_two_saturated = [PlateRow::A, PlateRow::B].iter().all(|&top| {
            series
                .row(top)
                .is_some_and(|row| row.mean_raw_od() >= 2.0)
        });
        if top_two_saturated {
            for row in &mut series.rows {
                if row.row == PlateRow::A || row.row == PlateRow::B {
                    row.label = RowLabel::Saturated;
                }
            }
            return false;
        }
        return true;
    }

    !poor_rows.is_empty()
}
