//! Loaders for the reference tables that accompany a batch.
//!
//! All three are small keyed CSVs with a header row and the serotype or
//! plate key in the first column.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use elisa_model::{
    CalibrationTable, ElisaError, EMPTY_SAMPLE, QcLimits, QcLimitsTable, Result,
    SampleAssignments,
};

const CALIBRATION_COLUMN: &str = "cal1_IgG";
const QC_LIMIT_COLUMNS: [&str; 4] = ["Hi_Lower", "Hi_Upper", "Lo_Lower", "Lo_Upper"];

pub fn read_calibration_table(path: &Path) -> Result<CalibrationTable> {
    debug!(path = %path.display(), "loading calibration table");
    let file = File::open(path)?;
    parse_calibration_table(file)
}

pub fn parse_calibration_table<R: Read>(reader: R) -> Result<CalibrationTable> {
    let mut csv_reader = ReaderBuilder::new().from_reader(reader);
    let headers = read_headers(&mut csv_reader)?;
    let column = column_index(&headers, CALIBRATION_COLUMN)?;

    let mut table = CalibrationTable::new();
    for record in csv_reader.records() {
        let record = record.map_err(|error| ElisaError::Csv(error.to_string()))?;
        let serotype = field(&record, 0).to_string();
        let top_point = parse_number(&record, column, "calibration")?;
        table.insert(serotype, top_point);
    }
    Ok(table)
}

pub fn read_qc_limits_table(path: &Path) -> Result<QcLimitsTable> {
    debug!(path = %path.display(), "loading QC limits table");
    let file = File::open(path)?;
    parse_qc_limits_table(file)
}

pub fn parse_qc_limits_table<R: Read>(reader: R) -> Result<QcLimitsTable> {
    let mut csv_reader = ReaderBuilder::new().from_reader(reader);
    let headers = read_headers(&mut csv_reader)?;
    let columns: Vec<usize> = QC_LIMIT_COLUMNS
        .iter()
        .map(|name| column_index(&headers, name))
        .collect::<Result<_>>()?;

    let mut table = QcLimitsTable::new();
    for record in csv_reader.records() {
        let record = record.map_err(|error| ElisaError::Csv(error.to_string()))?;
        let serotype = field(&record, 0).to_string();
        let limits = QcLimits {
            hi_lower: parse_number(&record, columns[0], "QC limits")?,
            hi_upper: parse_number(&record, columns[1], "QC limits")?,
            lo_lower: parse_number(&record, columns[2], "QC limits")?,
            lo_upper: parse_number(&record, columns[3], "QC limits")?,
        };
        table.insert(serotype, limits);
    }
    Ok(table)
}

pub fn read_sample_assignments(path: &Path) -> Result<SampleAssignments> {
    debug!(path = %path.display(), "loading sample assignments");
    let file = File::open(path)?;
    parse_sample_assignments(file)
}

/// Assignment sheets key first-run rows by a single block letter and
/// repeat rows by full plate id. Columns 1..=4 carry the sample ids for
/// the 4 sample lanes; blanks become the `EMPTY` sentinel.
pub fn parse_sample_assignments<R: Read>(reader: R) -> Result<SampleAssignments> {
    let mut csv_reader = ReaderBuilder::new().from_reader(reader);

    let mut assignments = SampleAssignments::new();
    for record in csv_reader.records() {
        let record = record.map_err(|error| ElisaError::Csv(error.to_string()))?;
        let key = field(&record, 0).trim().to_string();
        if key.is_empty() {
            continue;
        }
        let samples: [String; 4] =
            std::array::from_fn(|slot| normalize_sample_id(field(&record, slot + 1)));

        let mut letters = key.chars();
        match (letters.next(), letters.next()) {
            (Some(block), None) if block.is_ascii_alphabetic() => {
                assignments.insert_first_run(block.to_ascii_uppercase(), samples);
            }
            _ => assignments.insert_repeat(key, samples),
        }
    }
    Ok(assignments)
}

/// Spreadsheet exports often render integer sample ids as floats
/// (`1001.0`); those are folded back to the plain integer form.
fn normalize_sample_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return EMPTY_SAMPLE.to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 => format!("{value:.0}"),
        _ => trimmed.to_string(),
    }
}

fn read_headers<R: Read>(csv_reader: &mut csv::Reader<R>) -> Result<StringRecord> {
    csv_reader
        .headers()
        .map(StringRecord::clone)
        .map_err(|error| ElisaError::Csv(error.to_string()))
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim() == name)
        .ok_or_else(|| ElisaError::Csv(format!("column {name:?} not found")))
}

fn field<'a>(record: &'a StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or_default()
}

fn parse_number(record: &StringRecord, index: usize, table: &str) -> Result<f64> {
    let raw = field(record, index).trim();
    raw.parse::<f64>().map_err(|_| {
        ElisaError::Csv(format!("non-numeric value {raw:?} in {table} table"))
    })
}
