//! Per-sample classification: LLOQ determination and the
//! repeat/recalculation policy.

use serde::Serialize;

use elisa_model::{EMPTY_SAMPLE, Lane, PlateGrid, PlateRow, ReportableResult};

use crate::series::{DilutionSeries, SeriesPolicy, SeriesRow};
use crate::stats;

/// Concentrations below this are censored as "<0.15".
pub const LLOQ: f64 = 0.15;

/// Plate-wide evaluation settings supplied by the operator.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvaluationOptions {
    pub od_upper_cutoff: Option<f64>,
    pub od_lower_cutoff: Option<f64>,
    /// Censor results below the LLOQ. Disabled for validation assays.
    pub apply_lloq: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        EvaluationOptions {
            od_upper_cutoff: None,
            od_lower_cutoff: None,
            apply_lloq: true,
        }
    }
}

/// Outcome of classifying one study-sample lane.
#[derive(Debug, Clone, Serialize)]
pub struct SampleEvaluation {
    pub identifier: String,
    pub series: DilutionSeries,
    /// Sample determined to be below the limit of quantification.
    pub lloq: bool,
    /// Headline result from the series computation.
    pub result: ReportableResult,
    /// Recalculated value, repeat code or LLOQ marker, when one applies.
    pub result_recalc: ReportableResult,
    pub failed: bool,
    /// Advisory text for the plate warning list.
    pub warning: Option<&'static str>,
}

impl SampleEvaluation {
    pub fn evaluate(
        grid: &PlateGrid,
        lane: Lane,
        identifier: &str,
        options: &EvaluationOptions,
    ) -> SampleEvaluation {
        // Layout slots with no assigned sample are skipped entirely.
        if identifier.eq_ignore_ascii_case(EMPTY_SAMPLE) {
            return SampleEvaluation {
                identifier: identifier.to_string(),
                series: DilutionSeries::empty(),
                lloq: false,
                result: ReportableResult::Empty,
                result_recalc: ReportableResult::Empty,
                failed: false,
                warning: None,
            };
        }

        let policy = SeriesPolicy::sample(options.od_upper_cutoff, options.od_lower_cutoff);
        let series = DilutionSeries::compute(&grid.lane(lane), &policy);

        let lloq = options.apply_lloq && is_below_lloq(&series);
        let (result_recalc, failed, warning) = if lloq {
            (ReportableResult::BelowLloq, false, None)
        } else {
            check_recalc(&series, options.apply_lloq)
        };

        SampleEvaluation {
            identifier: identifier.to_string(),
            result: series.result,
            series,
            lloq,
            result_recalc,
            failed,
            warning,
        }
    }

    /// Final reportable value: the recalculated result when one exists,
    /// otherwise the headline result.
    pub fn reportable(&self) -> ReportableResult {
        if self.result_recalc.is_empty() {
            self.result
        } else {
            self.result_recalc
        }
    }
}

/// Three-stage LLOQ determination.
///
/// 1. A numeric headline result decides directly.
/// 2. Rows nulled for poor replicates are re-examined using their own
///    replicate values.
/// 3. Fallback: all original rows with OD >= 0.1, allowing partial
///    replicate data.
fn is_below_lloq(series: &DilutionSeries) -> bool {
    if let Some(value) = series.result.as_value() {
        return value < LLOQ;
    }

    let poor_rows: Vec<[Option<f64>; 2]> = series
        .rows
        .iter()
        .filter(|row| row.has_poor_replicates())
        .map(|row| row.raw_concs)
        .collect();
    if lloq_mean(&poor_rows) == Some(true) {
        return true;
    }

    let fallback_rows: Vec<[Option<f64>; 2]> = series
        .rows
        .iter()
        .map(|row| {
            let mut pair = [None, None];
            for replicate in 0..2 {
                if row.raw_ods[replicate] >= 0.1 {
                    pair[replicate] = row.raw_concs[replicate];
                }
            }
            pair
        })
        .collect();
    lloq_mean(&fallback_rows) == Some(true)
}

/// Grand mean of per-row means against the LLOQ.
///
/// Row means first require both replicates; when that aggregation is
/// non-finite the mean is re-derived from whichever values are
/// available before concluding that no decision is possible.
fn lloq_mean(rows: &[[Option<f64>; 2]]) -> Option<bool> {
    let strict: Vec<Option<f64>> = rows.iter().map(|pair| stats::mean_strict(pair)).collect();
    let grand = match stats::mean_present(&strict) {
        Some(mean) => Some(mean),
        None => {
            let relaxed: Vec<Option<f64>> =
                rows.iter().map(|pair| stats::mean_present(pair)).collect();
            stats::mean_present(&relaxed)
        }
    }?;
    Some(stats::round3(grand / 1000.0) < LLOQ)
}

/// The repeat/recalculation decision tree shared conceptually with the
/// controls (which substitute their own, stricter variant).
fn check_recalc(
    series: &DilutionSeries,
    apply_lloq: bool,
) -> (ReportableResult, bool, Option<&'static str>) {
    let valid_rows = series.valid_row_count();

    let repeat = (valid_rows < 2 && series.has_poor_replicates())
        .then_some(ReportableResult::Repeat);
    let high_low = if valid_rows == 0 {
        check_empty_series(series)
    } else {
        None
    };

    if let Some(code) = repeat {
        return (code, true, None);
    }
    if let Some((code, warning)) = high_low {
        return (code, true, Some(warning));
    }

    if let Some(code) = non_parallel_code(series) {
        return (code, true, None);
    }

    match recalculated_value(series) {
        Some(value) if value < LLOQ && apply_lloq => (ReportableResult::BelowLloq, false, None),
        Some(value) => (ReportableResult::Value(value), false, None),
        None => (ReportableResult::Empty, false, None),
    }
}

/// A lane with no valid rows at all is inspected on its original,
/// pre-cutoff data for saturation (repeat at higher dilution) or a
/// low/QNS condition.
fn check_empty_series(
    series: &DilutionSeries,
) -> Option<(ReportableResult, &'static str)> {
    let above_markers = range_marker_columns(series, |row, replicate| {
        row.range_flags[replicate].is_above()
    });
    let saturated = series
        .row(PlateRow::A)
        .is_some_and(|row| row.mean_raw_od() > 2.0);
    if saturated || above_markers {
        return Some((ReportableResult::RepeatAt500, "HIGH: Check repeat 1:500"));
    }

    let below_markers = range_marker_columns(series, |row, replicate| {
        row.range_flags[replicate].is_below()
    });
    let low_signal = series
        .row(PlateRow::H)
        .is_some_and(|row| row.mean_raw_od() < 0.1);
    if low_signal || below_markers {
        return Some((ReportableResult::CheckLow, "LOW: Check QNS or <0.15"));
    }

    None
}

/// True when more than one well in either replicate column carries the
/// given reader range marker.
fn range_marker_columns(
    series: &DilutionSeries,
    marked: impl Fn(&SeriesRow, usize) -> bool,
) -> bool {
    (0..2).any(|replicate| {
        series
            .rows
            .iter()
            .filter(|row| marked(row, replicate))
            .count()
            > 1
    })
}

/// Non-parallelism: the first available inter-row CV exceeds 20%.
///
/// When the dilution row immediately preceding the break itself had
/// poor replicates, the apparent non-parallelism is attributed to them
/// and the sample is downgraded to a plain repeat. Only the single
/// preceding row is inspected; this mirrors established behaviour and
/// is flagged for domain-expert review rather than generalized.
pub(crate) fn non_parallel_code(series: &DilutionSeries) -> Option<ReportableResult> {
    let (index, first_cv) = series
        .rows
        .iter()
        .enumerate()
        .find_map(|(index, row)| row.inter_row_cv.map(|cv| (index, cv)))?;
    if first_cv <= crate::series::INTER_ROW_CV_LIMIT {
        return None;
    }
    // The first CV always sits on the second valid row or later, so a
    // physically preceding row exists.
    let preceding = &series.rows[index - 1];
    if preceding.has_poor_replicates() {
        Some(ReportableResult::RepeatHighCv)
    } else {
        Some(ReportableResult::NonParallel)
    }
}

/// Break-point recalculation: when any inter-row CV exceeds 20%, the
/// result is recomputed from the dilution rows before the first break.
pub(crate) fn recalculated_value(series: &DilutionSeries) -> Option<f64> {
    let break_index = series.first_cv_break()?;
    let averages: Vec<f64> = series.rows[..break_index]
        .iter()
        .filter_map(|row| row.average_conc)
        .collect();
    stats::mean(&averages).map(|mean| stats::round3(mean / 1000.0))
}
