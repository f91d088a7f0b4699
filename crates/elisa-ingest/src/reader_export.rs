//! Parsing of the plate-reader CSV export.
//!
//! The export is a single CSV with an instrument parameter block on
//! top, a `Well Row` header marker, and the 96-well data block below
//! it. The parameter block carries the barcode, reader serial, test
//! name, timestamps and the curve-fit r-squared.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, warn};

use elisa_model::{
    ElisaError, PlateGrid, PlateMeta, PlateRow, RangeFlag, Result, Well, round3,
};

const HEADER_MARKER: &str = "Well Row";
const UNIT_SUFFIX: &str = " ug/mL";
const BLANK_REFERENCE: &str = "Blank B";

// Raw export column positions.
const COL_ROW: usize = 0;
const COL_COLUMN: usize = 1;
const COL_REFERENCE: usize = 2;
const COL_RAW_OD: usize = 6;
const COL_BLANK_CORRECTED: usize = 7;
const COL_CONC: usize = 8;
const COL_RANGE_CHECK: usize = 9;
const COL_TEMPERATURE: usize = 10;

/// Instrument parameter rows found above the header marker.
#[derive(Debug, Clone, Default)]
pub struct ParameterBlock {
    rows: Vec<[String; 3]>,
}

impl ParameterBlock {
    fn find_prefixed(&self, prefix: &str) -> Option<&[String; 3]> {
        self.rows.iter().find(|row| row[0].starts_with(prefix))
    }

    pub fn barcode(&self) -> Option<String> {
        self.find_prefixed("ID1:")
            .map(|row| row[0].trim_start_matches("ID1:").trim().to_string())
    }

    /// Reader id derived from the instrument serial (`ID2`).
    pub fn reader_id(&self) -> Option<String> {
        let serial = self
            .find_prefixed("ID1:")
            .map(|row| row[1].trim_start_matches("ID2:").trim().to_string())?;
        let reader = if serial == "415-2020" {
            "PSRLR3"
        } else {
            "PSRLR4"
        };
        Some(reader.to_string())
    }

    /// Analyte named in the instrument's test-name field.
    pub fn test_name(&self) -> Option<String> {
        self.find_prefixed("Test name:")
            .map(|row| row[0].trim_start_matches("Test name:").trim().to_string())
    }

    pub fn test_date(&self) -> Option<String> {
        self.find_prefixed("Test name:")
            .map(|row| row[1].trim_start_matches("Date:").trim().to_string())
    }

    pub fn test_time(&self) -> Option<String> {
        self.find_prefixed("Test name:")
            .map(|row| row[2].trim_start_matches("Time:").trim().to_string())
    }

    /// Curve-fit r-squared, 3 d.p. The ICH template writes it as a row
    /// whose second cell is `r` followed by a single character.
    pub fn r_squared(&self) -> Option<f64> {
        let row = self.rows.iter().find(|row| {
            let cell = row[1].trim();
            cell.chars().count() == 2 && cell.starts_with('r')
        })?;
        row[2].trim().parse::<f64>().ok().map(round3)
    }
}

/// Result of importing one plate export.
#[derive(Debug, Clone, Default)]
pub struct PlateImport {
    pub parameters: ParameterBlock,
    /// `None` when the well block carried no data; downstream treats
    /// that as "no further processing possible" without raising.
    pub grid: Option<PlateGrid>,
    pub warnings: Vec<String>,
}

impl PlateImport {
    pub fn is_usable(&self) -> bool {
        self.grid.is_some()
    }
}

pub fn read_plate_export(path: &Path) -> Result<PlateImport> {
    debug!(path = %path.display(), "reading plate export");
    let file = File::open(path)?;
    parse_plate_export(file)
}

pub fn parse_plate_export<R: Read>(reader: R) -> Result<PlateImport> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|error| ElisaError::Csv(error.to_string()))?;
        records.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }

    let marker = records
        .iter()
        .position(|cells| cells.first().is_some_and(|cell| cell == HEADER_MARKER))
        .ok_or_else(|| {
            ElisaError::MalformedPlate(format!("header marker {HEADER_MARKER:?} not found"))
        })?;

    let parameters = ParameterBlock {
        rows: records[..marker]
            .iter()
            .map(|cells| {
                [
                    cells.first().cloned().unwrap_or_default(),
                    cells.get(1).cloned().unwrap_or_default(),
                    cells.get(2).cloned().unwrap_or_default(),
                ]
            })
            .collect(),
    };

    let well_rows: Vec<&Vec<String>> = records[marker + 1..]
        .iter()
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .collect();

    let mut warnings = Vec::new();
    if parameters.r_squared().is_none() {
        warnings.push(
            "r squared value not found. ICH Template possibly not applied".to_string(),
        );
    }

    let all_concs_empty = well_rows
        .iter()
        .all(|cells| conc_cell(cells).is_empty());
    let all_ods_empty = well_rows
        .iter()
        .all(|cells| cell(cells, COL_BLANK_CORRECTED).is_empty());
    if well_rows.is_empty() || (all_concs_empty && all_ods_empty) {
        warn!("plate export contains no well data");
        warnings.push(
            "Fewer columns than expected in data. ICH Template possibly not applied".to_string(),
        );
        return Ok(PlateImport {
            parameters,
            grid: None,
            warnings,
        });
    }

    let mut wells: Vec<(PlateRow, usize, Well)> = Vec::with_capacity(well_rows.len());
    let mut blank_ods: Vec<f64> = Vec::new();
    for cells in &well_rows {
        let row_text = cell(cells, COL_ROW);
        let row = PlateRow::parse(row_text).ok_or_else(|| {
            ElisaError::MalformedPlate(format!("invalid well row {row_text:?}"))
        })?;
        let column_text = cell(cells, COL_COLUMN);
        let column: usize = column_text.parse().map_err(|_| {
            ElisaError::MalformedPlate(format!("invalid well column {column_text:?}"))
        })?;
        if !(1..=PlateGrid::COLUMNS).contains(&column) {
            return Err(ElisaError::MalformedPlate(format!(
                "well column {column} out of range"
            )));
        }

        let conc_text = conc_cell(cells);
        let od = cell(cells, COL_BLANK_CORRECTED)
            .parse::<f64>()
            .unwrap_or(f64::NAN);
        let well = Well {
            od,
            conc: conc_text.parse::<f64>().ok(),
            range_flag: RangeFlag::from_raw(&conc_text, cell(cells, COL_RANGE_CHECK)),
        };
        if cell(cells, COL_REFERENCE).contains(BLANK_REFERENCE) {
            if let Ok(raw_od) = cell(cells, COL_RAW_OD).parse::<f64>() {
                blank_ods.push(raw_od);
            }
        }
        wells.push((row, column, well));
    }

    wells.sort_by_key(|&(row, column, _)| (row, column));
    // Exactly one record per coordinate; duplicates would otherwise
    // shift every later well after the sort.
    let expected = PlateRow::ALL
        .iter()
        .flat_map(|&row| (1..=PlateGrid::COLUMNS).map(move |column| (row, column)));
    if !wells.iter().map(|&(row, column, _)| (row, column)).eq(expected) {
        return Err(ElisaError::MalformedPlate(
            "well block is not a complete A1..H12 grid".to_string(),
        ));
    }
    let ordered: Vec<Well> = wells.iter().map(|&(_, _, well)| well).collect();

    let blank_od = if blank_ods.is_empty() {
        f64::NAN
    } else {
        round3(blank_ods.iter().sum::<f64>() / blank_ods.len() as f64)
    };
    let temperature = well_rows
        .last()
        .and_then(|cells| cell(cells, COL_TEMPERATURE).parse::<f64>().ok());

    let meta = PlateMeta {
        barcode: parameters
            .barcode()
            .ok_or_else(|| ElisaError::MalformedPlate("ID1 parameter not found".to_string()))?,
        protocol_id: parameters
            .test_name()
            .ok_or_else(|| ElisaError::MalformedPlate("test name not found".to_string()))?,
        reader_id: parameters.reader_id().unwrap_or_default(),
        test_date: parameters.test_date().unwrap_or_default(),
        test_time: parameters.test_time().unwrap_or_default(),
        r_squared: parameters.r_squared(),
        blank_od,
        temperature,
    };

    let grid = PlateGrid::new(ordered, meta).map_err(ElisaError::MalformedPlate)?;
    Ok(PlateImport {
        parameters,
        grid: Some(grid),
        warnings,
    })
}

fn cell<'a>(cells: &'a [String], index: usize) -> &'a str {
    cells.get(index).map(String::as_str).unwrap_or_default()
}

/// Concentration cell with the reporting unit suffix stripped.
fn conc_cell(cells: &[String]) -> String {
    let raw = cell(cells, COL_CONC);
    raw.strip_suffix(UNIT_SUFFIX).unwrap_or(raw).to_string()
}
