//! Batch summary table printed after evaluation.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use elisa_core::{PlateEvaluation, QcEvaluation, SampleEvaluation};
use elisa_model::format3;

use crate::types::BatchResult;

pub fn print_summary(result: &BatchResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Plate"),
        header_cell("Serotype"),
        header_cell("Sample 1"),
        header_cell("Sample 2"),
        header_cell("Sample 3"),
        header_cell("Sample 4"),
        header_cell("High QC"),
        header_cell("Low QC"),
        header_cell("Outcome"),
    ]);
    apply_table_style(&mut table);
    for index in 2..=7 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 8, CellAlignment::Center);

    for plate in &result.plates {
        let mut row = vec![
            Cell::new(&plate.plate_id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&plate.serotype),
        ];
        for slot in 0..4 {
            row.push(sample_cell(plate.samples.get(slot)));
        }
        row.push(qc_cell(plate.high_qc.as_ref()));
        row.push(qc_cell(plate.low_qc.as_ref()));
        row.push(outcome_cell(plate));
        table.add_row(row);
    }
    println!("{table}");

    let warnings: Vec<&String> = result
        .plates
        .iter()
        .flat_map(|plate| plate.warnings.iter())
        .collect();
    if !warnings.is_empty() {
        eprintln!("Warnings:");
        for warning in warnings {
            eprintln!("- {warning}");
        }
    }
    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn sample_cell(sample: Option<&SampleEvaluation>) -> Cell {
    let Some(sample) = sample else {
        return dim_cell("-");
    };
    let text = sample_text(sample);
    if text == "-" {
        dim_cell(text)
    } else if sample.failed {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text)
    }
}

fn sample_text(sample: &SampleEvaluation) -> String {
    let reportable = sample.reportable();
    if reportable.is_empty() {
        "-".to_string()
    } else {
        reportable.to_string()
    }
}

fn qc_cell(qc: Option<&QcEvaluation>) -> Cell {
    let Some(qc) = qc else {
        return dim_cell("-");
    };
    if let Some(value) = qc.numeric_result() {
        return Cell::new(format3(value));
    }
    if qc.result_recalc.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(qc.result_recalc.to_string()).fg(Color::Yellow)
    }
}

fn outcome_cell(plate: &PlateEvaluation) -> Cell {
    match plate.outcome {
        None => Cell::new("PASS")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Some(code) => Cell::new(code.to_string())
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elisa_core::DilutionSeries;
    use elisa_model::ReportableResult;

    #[test]
    fn sample_text_prefers_recalculated_result() {
        let sample = SampleEvaluation {
            identifier: "1001".to_string(),
            series: DilutionSeries::empty(),
            lloq: false,
            result: ReportableResult::Value(1.234),
            result_recalc: ReportableResult::Repeat,
            failed: true,
            warning: None,
        };
        assert_eq!(sample_text(&sample), "RPT");
    }

    #[test]
    fn empty_sample_renders_as_dash() {
        let sample = SampleEvaluation {
            identifier: "EMPTY".to_string(),
            series: DilutionSeries::empty(),
            lloq: false,
            result: ReportableResult::Empty,
            result_recalc: ReportableResult::Empty,
            failed: false,
            warning: None,
        };
        assert_eq!(sample_text(&sample), "-");
    }
}
