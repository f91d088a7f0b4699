//! Ingest layer: plate-reader CSV exports and batch reference tables.

pub mod reader_export;
pub mod tables;

pub use reader_export::{ParameterBlock, PlateImport, parse_plate_export, read_plate_export};
pub use tables::{
    parse_calibration_table, parse_qc_limits_table, parse_sample_assignments,
    read_calibration_table, read_qc_limits_table, read_sample_assignments,
};
