//! Classification engine for ELISA plate QC.
//!
//! Turns an imported [`elisa_model::PlateGrid`] plus the externally
//! supplied reference tables into per-sample reportable results,
//! curve/control pass-fail status and an aggregate plate outcome. The
//! evaluation is synchronous and side-effect free; plates are
//! independent and safe to evaluate in parallel as long as the shared
//! tables are not mutated during a batch.

pub mod curve;
pub mod plate;
pub mod qc;
pub mod sample;
pub mod series;
pub mod stats;

pub use curve::CurveEvaluation;
pub use plate::{PlateEvaluation, evaluate_plate};
pub use qc::QcEvaluation;
pub use sample::{EvaluationOptions, LLOQ, SampleEvaluation};
pub use series::{
    DilutionSeries, INTER_ROW_CV_LIMIT, REPLICATE_CV_LIMIT, SeriesPolicy, SeriesRow,
};
