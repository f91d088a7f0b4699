//! Shared dilution-series computation.
//!
//! Every lane variant (sample, standard curve, high/low control) runs
//! the same pipeline over its pair of replicate columns: OD cutoff
//! filtering, replicate agreement, row averaging, a headline result and
//! inter-row consistency CVs. The variants differ only in policy
//! (cutoffs, LLOQ applicability, whether poor replicates null the row)
//! and in what they do with the computed series afterwards.

use serde::Serialize;

use elisa_model::{PlateRow, RangeFlag, ReportableResult, RowLabel, Well};

use crate::stats;

/// Replicate disagreement at or above this %CV nulls the row.
pub const REPLICATE_CV_LIMIT: f64 = 15.0;

/// Inter-row CV above this marks a dilution-linearity break.
pub const INTER_ROW_CV_LIMIT: f64 = 20.0;

/// Parameterization of the shared series pipeline.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeriesPolicy {
    /// Inclusive upper OD bound; wells above it are excluded.
    pub od_upper_cutoff: Option<f64>,
    /// Inclusive lower OD bound; wells below it are excluded.
    pub od_lower_cutoff: Option<f64>,
    /// Null and label rows whose replicate CV reaches the 15% limit.
    /// The curve keeps those rows and applies its own labelling.
    pub flag_high_cv: bool,
}

impl SeriesPolicy {
    pub fn sample(od_upper_cutoff: Option<f64>, od_lower_cutoff: Option<f64>) -> SeriesPolicy {
        SeriesPolicy {
            od_upper_cutoff,
            od_lower_cutoff,
            flag_high_cv: true,
        }
    }

    pub fn curve() -> SeriesPolicy {
        SeriesPolicy {
            od_upper_cutoff: None,
            od_lower_cutoff: None,
            flag_high_cv: false,
        }
    }

    pub fn qc() -> SeriesPolicy {
        SeriesPolicy {
            od_upper_cutoff: Some(2.0),
            od_lower_cutoff: Some(0.1),
            flag_high_cv: true,
        }
    }
}

/// One dilution row of a lane after series computation.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesRow {
    pub row: PlateRow,
    /// ODs exactly as imported, before any cutoff.
    pub raw_ods: [f64; 2],
    /// Concentrations exactly as imported (None = reader range marker).
    pub raw_concs: [Option<f64>; 2],
    pub range_flags: [RangeFlag; 2],
    /// ODs surviving the cutoff filter.
    pub ods: [Option<f64>; 2],
    /// Concentrations surviving cutoff and replicate nulling.
    pub concs: [Option<f64>; 2],
    pub replicate_cv: Option<f64>,
    pub label: RowLabel,
    pub average_conc: Option<f64>,
    /// %CV against the preceding valid row; first valid row has none.
    pub inter_row_cv: Option<f64>,
}

impl SeriesRow {
    /// Mean of the imported ODs, ignoring cutoffs.
    pub fn mean_raw_od(&self) -> f64 {
        (self.raw_ods[0] + self.raw_ods[1]) / 2.0
    }

    pub fn is_valid(&self) -> bool {
        self.average_conc.is_some()
    }

    pub fn has_poor_replicates(&self) -> bool {
        self.replicate_cv
            .is_some_and(|cv| cv > REPLICATE_CV_LIMIT)
    }
}

/// Computed series for one lane.
#[derive(Debug, Clone, Serialize)]
pub struct DilutionSeries {
    pub rows: Vec<SeriesRow>,
    /// Headline result: mean of valid row averages / 1000, 3 d.p.
    pub result: ReportableResult,
}

impl DilutionSeries {
    /// Series for an unassigned lane; carries no rows and no result.
    pub fn empty() -> DilutionSeries {
        DilutionSeries {
            rows: Vec::new(),
            result: ReportableResult::Empty,
        }
    }

    pub fn compute(lane: &[(PlateRow, [Well; 2])], policy: &SeriesPolicy) -> DilutionSeries {
        let mut rows: Vec<SeriesRow> = lane
            .iter()
            .map(|&(row, wells)| SeriesRow {
                row,
                raw_ods: [wells[0].od, wells[1].od],
                raw_concs: [wells[0].conc, wells[1].conc],
                range_flags: [wells[0].range_flag, wells[1].range_flag],
                ods: [Some(wells[0].od), Some(wells[1].od)],
                concs: [wells[0].conc, wells[1].conc],
                replicate_cv: None,
                label: RowLabel::None,
                average_conc: None,
                inter_row_cv: None,
            })
            .collect();

        apply_od_cutoff(&mut rows, policy);
        apply_replicate_agreement(&mut rows, policy);

        for row in &mut rows {
            row.average_conc = match row.concs {
                [Some(first), Some(second)] => Some((first + second) / 2.0),
                _ => None,
            };
        }

        let mut series = DilutionSeries {
            rows,
            result: ReportableResult::Empty,
        };
        series.refresh_summary();
        series
    }

    /// Recompute the headline result and inter-row CVs from the current
    /// row averages. Called again by the curve after top-point capping.
    pub fn refresh_summary(&mut self) {
        let valid: Vec<f64> = self.rows.iter().filter_map(|row| row.average_conc).collect();
        self.result = match stats::mean(&valid) {
            Some(mean) => ReportableResult::Value(stats::round3(mean / 1000.0)),
            None => ReportableResult::Empty,
        };

        for row in &mut self.rows {
            row.inter_row_cv = None;
        }
        let valid_indices: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_valid())
            .map(|(index, _)| index)
            .collect();
        for pair in valid_indices.windows(2) {
            let (previous, current) = (pair[0], pair[1]);
            let (Some(a), Some(b)) = (
                self.rows[previous].average_conc,
                self.rows[current].average_conc,
            ) else {
                continue;
            };
            let difference = (a - b).abs();
            let cv = difference / a.max(b) * 100.0;
            self.rows[current].inter_row_cv = cv.is_finite().then(|| stats::round3(cv));
        }
    }

    pub fn valid_row_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_valid()).count()
    }

    /// Index of the first row whose inter-row CV exceeds the 20% limit.
    pub fn first_cv_break(&self) -> Option<usize> {
        self.rows.iter().position(|row| {
            row.inter_row_cv
                .is_some_and(|cv| cv > INTER_ROW_CV_LIMIT)
        })
    }

    pub fn has_poor_replicates(&self) -> bool {
        self.rows.iter().any(SeriesRow::has_poor_replicates)
    }

    pub fn row(&self, row: PlateRow) -> Option<&SeriesRow> {
        self.rows.iter().find(|candidate| candidate.row == row)
    }
}

fn apply_od_cutoff(rows: &mut [SeriesRow], policy: &SeriesPolicy) {
    if policy.od_upper_cutoff.is_none() && policy.od_lower_cutoff.is_none() {
        return;
    }
    for row in rows {
        for replicate in 0..2 {
            let od = row.raw_ods[replicate];
            let keep = policy.od_lower_cutoff.is_none_or(|lower| od >= lower)
                && policy.od_upper_cutoff.is_none_or(|upper| od <= upper);
            if !keep {
                row.ods[replicate] = None;
                row.concs[replicate] = None;
            }
        }
    }
}

fn apply_replicate_agreement(rows: &mut [SeriesRow], policy: &SeriesPolicy) {
    for row in rows {
        let [Some(first), Some(second)] = row.concs else {
            // A lone replicate carries no agreement information; the row
            // is treated as having no valid concentration at all.
            row.concs = [None, None];
            continue;
        };
        row.replicate_cv = stats::replicate_cv(&[first, second]);
        if policy.flag_high_cv
            && row
                .replicate_cv
                .is_some_and(|cv| cv >= REPLICATE_CV_LIMIT)
        {
            row.concs = [None, None];
            row.label = RowLabel::HighCv;
        }
    }
}
