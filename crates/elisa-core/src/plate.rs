//! Plate-level aggregation: the precedence-ordered failure codes and
//! the out-of-range check against the supplied QC limits.

use serde::Serialize;
use tracing::debug;

use elisa_model::{
    Barcode, CalibrationTable, EMPTY_SAMPLE, Lane, PlateFail, PlateGrid, PlateMeta, QcLevel,
    QcLimits, QcLimitsTable, Result, SampleAssignments,
};

use crate::curve::CurveEvaluation;
use crate::qc::QcEvaluation;
use crate::sample::{EvaluationOptions, SampleEvaluation};

/// Complete evaluation of one plate.
#[derive(Debug, Clone, Serialize)]
pub struct PlateEvaluation {
    pub barcode: String,
    pub plate_id: String,
    pub serotype: String,
    pub reader_id: String,
    pub blank_od: f64,
    pub r_squared: Option<f64>,
    pub temperature: Option<f64>,
    /// One evaluation per sample lane; empty when the plate was
    /// rejected before lanes were built (wrong protocol).
    pub samples: Vec<SampleEvaluation>,
    pub curve: Option<CurveEvaluation>,
    pub high_qc: Option<QcEvaluation>,
    pub low_qc: Option<QcEvaluation>,
    /// `None` means the plate passed.
    pub outcome: Option<PlateFail>,
    pub warnings: Vec<String>,
}

impl PlateEvaluation {
    pub fn passed(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn curve_failed(&self) -> bool {
        self.curve.as_ref().is_some_and(|curve| curve.failed)
    }
}

/// Evaluate a plate grid against the supplied reference tables.
///
/// The evaluation is a pure computation: all inputs arrive here and all
/// outputs are values. Table lookup misses surface as errors since they
/// indicate a configuration problem, never a plate problem.
pub fn evaluate_plate(
    grid: &PlateGrid,
    assignments: &SampleAssignments,
    calibration: &CalibrationTable,
    qc_limits: &QcLimitsTable,
    options: &EvaluationOptions,
) -> Result<PlateEvaluation> {
    let meta = grid.meta();
    let barcode = Barcode::parse(&meta.barcode)?;
    let serotype = barcode.serotype().to_string();
    let mut warnings = Vec::new();

    // Wrong protocol rejects the plate before any lane is built.
    if serotype != meta.protocol_id {
        warnings.push(format!(
            "Plate {}: Wrong protocol applied ({})",
            barcode.plate_id(),
            meta.protocol_id
        ));
        debug!(plate = barcode.plate_id(), "plate rejected: wrong protocol");
        return Ok(rejected_plate(meta, &barcode, serotype, warnings));
    }

    let sample_ids = match assignments.resolve(&barcode) {
        Some(ids) => ids.clone(),
        None => {
            warnings.push(format!(
                "Plate {}: no sample assignment found",
                barcode.plate_id()
            ));
            std::array::from_fn(|_| EMPTY_SAMPLE.to_string())
        }
    };

    let samples: Vec<SampleEvaluation> = Lane::SAMPLES
        .iter()
        .zip(sample_ids.iter())
        .map(|(&lane, identifier)| SampleEvaluation::evaluate(grid, lane, identifier, options))
        .collect();
    for sample in &samples {
        if let Some(warning) = sample.warning {
            warnings.push(format!(
                "Sample {} on plate {}: {warning}",
                sample.identifier,
                barcode.plate_id()
            ));
        }
    }

    let curve = CurveEvaluation::evaluate(grid, &serotype, calibration)?;
    let mut high_qc = QcEvaluation::evaluate(grid, QcLevel::High);
    let mut low_qc = QcEvaluation::evaluate(grid, QcLevel::Low);

    let mut outcome = base_outcome(meta, &curve, &high_qc, &low_qc);
    match outcome {
        // A curve or blank failure invalidates QC interpretation
        // entirely; the controls are not trended or range-checked.
        Some(PlateFail::R11 | PlateFail::R16) => {
            high_qc.mark_not_reportable();
            low_qc.mark_not_reportable();
        }
        None => {
            let limits = qc_limits.limits(&serotype)?;
            outcome = oor_outcome(&high_qc, &low_qc, limits);
        }
        Some(_) => {}
    }

    debug!(plate = barcode.plate_id(), outcome = ?outcome, "plate evaluated");

    Ok(PlateEvaluation {
        barcode: meta.barcode.clone(),
        plate_id: barcode.plate_id().to_string(),
        serotype,
        reader_id: meta.reader_id.clone(),
        blank_od: meta.blank_od,
        r_squared: meta.r_squared,
        temperature: meta.temperature,
        samples,
        curve: Some(curve),
        high_qc: Some(high_qc),
        low_qc: Some(low_qc),
        outcome,
        warnings,
    })
}

fn rejected_plate(
    meta: &PlateMeta,
    barcode: &Barcode,
    serotype: String,
    warnings: Vec<String>,
) -> PlateEvaluation {
    PlateEvaluation {
        barcode: meta.barcode.clone(),
        plate_id: barcode.plate_id().to_string(),
        serotype,
        reader_id: meta.reader_id.clone(),
        blank_od: meta.blank_od,
        r_squared: meta.r_squared,
        temperature: meta.temperature,
        samples: Vec::new(),
        curve: None,
        high_qc: None,
        low_qc: None,
        outcome: Some(PlateFail::R4),
        warnings,
    }
}

/// Precedence-ordered plate failure, first match wins.
fn base_outcome(
    meta: &PlateMeta,
    curve: &CurveEvaluation,
    high_qc: &QcEvaluation,
    low_qc: &QcEvaluation,
) -> Option<PlateFail> {
    if meta.blank_od >= 0.1 {
        return Some(PlateFail::R11);
    }
    match meta.r_squared {
        Some(r_squared) if (0.9..=1.1).contains(&r_squared) => {}
        _ => return Some(PlateFail::R16),
    }
    if curve.failed {
        return Some(PlateFail::R16);
    }
    match (high_qc.failed, low_qc.failed) {
        (true, true) => Some(PlateFail::R2R3),
        (true, false) => Some(PlateFail::R2),
        (false, true) => Some(PlateFail::R3),
        (false, false) => None,
    }
}

/// Out-of-range check against the per-serotype limits, inclusive at the
/// limit values. A control without a numeric result at this point is
/// treated as out of range.
fn oor_outcome(
    high_qc: &QcEvaluation,
    low_qc: &QcEvaluation,
    limits: &QcLimits,
) -> Option<PlateFail> {
    let high_oor = high_qc
        .numeric_result()
        .is_none_or(|value| !limits.high_in_range(value));
    let low_oor = low_qc
        .numeric_result()
        .is_none_or(|value| !limits.low_in_range(value));
    match (high_oor, low_oor) {
        (true, true) => Some(PlateFail::R2R3),
        (true, false) => Some(PlateFail::R2),
        (false, true) => Some(PlateFail::R3),
        (false, false) => None,
    }
}
