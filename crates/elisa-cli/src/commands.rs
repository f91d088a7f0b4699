//! Subcommand implementations.

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{error, info, info_span, warn};

use elisa_core::{EvaluationOptions, PlateEvaluation, evaluate_plate};
use elisa_ingest::{read_calibration_table, read_qc_limits_table, read_sample_assignments};
use elisa_model::ElisaError;

use crate::cli::{EvaluateArgs, TablesArgs};
use crate::summary::apply_table_style;
use crate::types::BatchResult;

pub fn run_evaluate(args: &EvaluateArgs) -> Result<BatchResult> {
    let calibration =
        read_calibration_table(&args.calibration).context("load calibration table")?;
    let qc_limits = read_qc_limits_table(&args.qc_limits).context("load QC limits table")?;
    let assignments = read_sample_assignments(&args.samples).context("load sample assignments")?;

    let options = EvaluationOptions {
        od_upper_cutoff: args.od_upper,
        od_lower_cutoff: args.od_lower,
        apply_lloq: !args.no_lloq,
    };

    let mut plates: Vec<PlateEvaluation> = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    for path in &args.plates {
        let plate_span = info_span!("plate", path = %path.display());
        let _plate_guard = plate_span.enter();

        let import = match elisa_ingest::read_plate_export(path) {
            Ok(import) => import,
            Err(import_error) => {
                error!(%import_error, "failed to read plate export");
                errors.push(format!("{}: {import_error}", path.display()));
                continue;
            }
        };
        for warning in &import.warnings {
            warn!("{warning}");
        }
        let Some(grid) = import.grid else {
            errors.push(format!("{}: export carries no well data", path.display()));
            continue;
        };

        match evaluate_plate(&grid, &assignments, &calibration, &qc_limits, &options) {
            Ok(evaluation) => {
                info!(
                    plate = evaluation.plate_id,
                    passed = evaluation.passed(),
                    "plate evaluated"
                );
                plates.push(evaluation);
            }
            // A missing serotype means the batch tables are wrong for
            // every plate of that serotype; abort rather than skip.
            Err(lookup_error @ ElisaError::UnknownSerotype { .. }) => {
                return Err(lookup_error).context("reference table lookup");
            }
            Err(evaluate_error) => {
                error!(%evaluate_error, "failed to evaluate plate");
                errors.push(format!("{}: {evaluate_error}", path.display()));
            }
        }
    }

    Ok(BatchResult { plates, errors })
}

pub fn run_tables(args: &TablesArgs) -> Result<()> {
    let calibration =
        read_calibration_table(&args.calibration).context("load calibration table")?;
    let qc_limits = read_qc_limits_table(&args.qc_limits).context("load QC limits table")?;

    let mut table = Table::new();
    table.set_header(vec![
        "Serotype",
        "Top standard",
        "High lower",
        "High upper",
        "Low lower",
        "Low upper",
    ]);
    apply_table_style(&mut table);
    for (serotype, limits) in qc_limits.iter() {
        let top_point = calibration
            .top_point(serotype)
            .map(|value| value.to_string())
            .unwrap_or_else(|_| "-".to_string());
        table.add_row(vec![
            serotype.to_string(),
            top_point,
            limits.hi_lower.to_string(),
            limits.hi_upper.to_string(),
            limits.lo_lower.to_string(),
            limits.lo_upper.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
