//! The 96-well plate grid as imported from the reader export.
//!
//! A plate is 8 dilution rows (A = least dilute .. H = most dilute) by
//! 12 columns arranged as 6 lanes of 2 replicate columns each. The grid
//! is immutable once constructed; evaluation components hold read-only
//! views into it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the 8 dilution rows, A (least dilute) through H (most dilute).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PlateRow {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl PlateRow {
    pub const ALL: [PlateRow; 8] = [
        PlateRow::A,
        PlateRow::B,
        PlateRow::C,
        PlateRow::D,
        PlateRow::E,
        PlateRow::F,
        PlateRow::G,
        PlateRow::H,
    ];

    /// Zero-based position within the plate (A = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<PlateRow> {
        Self::ALL.get(index).copied()
    }

    pub fn parse(text: &str) -> Option<PlateRow> {
        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        match letter.to_ascii_uppercase() {
            'A' => Some(PlateRow::A),
            'B' => Some(PlateRow::B),
            'C' => Some(PlateRow::C),
            'D' => Some(PlateRow::D),
            'E' => Some(PlateRow::E),
            'F' => Some(PlateRow::F),
            'G' => Some(PlateRow::G),
            'H' => Some(PlateRow::H),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }
}

impl fmt::Display for PlateRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Range-check state reported by the reader for a single well.
///
/// The reader marks concentrations that fell outside the standard curve
/// with `>` (above range) or `<` (below range) instead of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangeFlag {
    #[default]
    InRange,
    AboveRange,
    BelowRange,
}

impl RangeFlag {
    /// Derive the flag from the raw concentration and range-check cells.
    pub fn from_raw(conc_cell: &str, range_cell: &str) -> RangeFlag {
        if conc_cell.contains('>') || range_cell.contains('>') {
            RangeFlag::AboveRange
        } else if conc_cell.contains('<') || range_cell.contains('<') {
            RangeFlag::BelowRange
        } else {
            RangeFlag::InRange
        }
    }

    pub fn is_above(self) -> bool {
        self == RangeFlag::AboveRange
    }

    pub fn is_below(self) -> bool {
        self == RangeFlag::BelowRange
    }
}

/// A single well: blank-corrected OD plus back-calculated concentration.
///
/// `conc` is `None` when the reader reported a non-numeric out-of-range
/// marker; the marker itself survives in `range_flag`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Well {
    pub od: f64,
    pub conc: Option<f64>,
    pub range_flag: RangeFlag,
}

/// One biological unit on the plate: a pair of adjacent replicate columns.
///
/// Lane 0 carries the standard curve, lanes 1-4 the study samples and
/// lane 5 the high/low controls (split by row range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lane {
    Curve,
    Sample1,
    Sample2,
    Sample3,
    Sample4,
    Qc,
}

impl Lane {
    pub const SAMPLES: [Lane; 4] = [Lane::Sample1, Lane::Sample2, Lane::Sample3, Lane::Sample4];

    /// Lane number 0..=5 in plate order.
    pub fn number(self) -> usize {
        match self {
            Lane::Curve => 0,
            Lane::Sample1 => 1,
            Lane::Sample2 => 2,
            Lane::Sample3 => 3,
            Lane::Sample4 => 4,
            Lane::Qc => 5,
        }
    }

    /// The pair of 1-based plate columns this lane occupies.
    pub fn columns(self) -> (usize, usize) {
        let n = self.number();
        (n * 2 + 1, n * 2 + 2)
    }
}

/// High control occupies rows A-D of the QC lane, low control rows E-H.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QcLevel {
    High,
    Low,
}

impl QcLevel {
    pub fn rows(self) -> [PlateRow; 4] {
        match self {
            QcLevel::High => [PlateRow::A, PlateRow::B, PlateRow::C, PlateRow::D],
            QcLevel::Low => [PlateRow::E, PlateRow::F, PlateRow::G, PlateRow::H],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QcLevel::High => "HI",
            QcLevel::Low => "LO",
        }
    }
}

/// Scalar metadata read from the instrument parameter block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateMeta {
    /// Raw plate barcode from the reader (`ID1`).
    pub barcode: String,
    /// Analyte/serotype named in the instrument's test-name field.
    pub protocol_id: String,
    /// Reader identifier derived from the instrument serial (`ID2`).
    pub reader_id: String,
    pub test_date: String,
    pub test_time: String,
    /// Curve fit r-squared, 3 d.p.; `None` when the export lacks one.
    pub r_squared: Option<f64>,
    /// Mean OD of the designated blank wells, 3 d.p.
    pub blank_od: f64,
    /// Reader temperature from the final well row.
    pub temperature: Option<f64>,
}

/// The full 8x12 well matrix plus plate metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateGrid {
    wells: Vec<Well>,
    meta: PlateMeta,
}

impl PlateGrid {
    pub const ROWS: usize = 8;
    pub const COLUMNS: usize = 12;

    /// Build a grid from wells in row-major order (A1..A12, B1.., .., H12).
    pub fn new(wells: Vec<Well>, meta: PlateMeta) -> Result<PlateGrid, String> {
        if wells.len() != Self::ROWS * Self::COLUMNS {
            return Err(format!(
                "expected {} wells, got {}",
                Self::ROWS * Self::COLUMNS,
                wells.len()
            ));
        }
        Ok(PlateGrid { wells, meta })
    }

    pub fn meta(&self) -> &PlateMeta {
        &self.meta
    }

    /// Well at a row and 1-based column.
    pub fn well(&self, row: PlateRow, column: usize) -> &Well {
        debug_assert!((1..=Self::COLUMNS).contains(&column));
        &self.wells[row.index() * Self::COLUMNS + (column - 1)]
    }

    /// All 8 rows of a lane as replicate pairs, in dilution order.
    pub fn lane(&self, lane: Lane) -> Vec<(PlateRow, [Well; 2])> {
        let (left, right) = lane.columns();
        PlateRow::ALL
            .iter()
            .map(|&row| (row, [*self.well(row, left), *self.well(row, right)]))
            .collect()
    }

    /// The 4 rows of the QC lane belonging to one control level.
    pub fn qc_lane(&self, level: QcLevel) -> Vec<(PlateRow, [Well; 2])> {
        let (left, right) = Lane::Qc.columns();
        level
            .rows()
            .iter()
            .map(|&row| (row, [*self.well(row, left), *self.well(row, right)]))
            .collect()
    }
}
