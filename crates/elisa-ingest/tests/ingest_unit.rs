//! Parsing tests for plate exports and reference tables.

use std::io::Write;

use elisa_ingest::{
    parse_calibration_table, parse_plate_export, parse_qc_limits_table, parse_sample_assignments,
    read_plate_export,
};
use elisa_model::{Barcode, ElisaError, PlateRow, RangeFlag};

/// Default well line: raw OD columns, blank-corrected OD, concentration
/// with the reporting unit suffix, empty range check, temperature.
fn default_line(row: char, col: usize) -> String {
    format!("{row},{col},Sample X1,1,0.500,0.040,0.460,0.450,123.4 ug/mL,,21.3")
}

fn export_with<F>(make_line: F) -> String
where
    F: Fn(char, usize) -> String,
{
    let mut text = String::new();
    text.push_str("ID1: B6BAJS120523,ID2: 415-2020,ID3: 101\n");
    text.push_str("Test name: 6B,Date: 12/05/2023,Time: 10:12:41\n");
    text.push_str(",r2,0.9987\n");
    text.push_str(
        "Well Row,Well Col,Content,Group,Raw(405),Raw(620),Raw(405-620),\
         Blank corrected,Concentration,Range,Temp\n",
    );
    for row in "ABCDEFGH".chars() {
        for col in 1..=12 {
            text.push_str(&make_line(row, col));
            text.push('\n');
        }
    }
    text
}

#[test]
fn parses_parameter_block() {
    let import = parse_plate_export(export_with(default_line).as_bytes()).expect("parse");
    let grid = import.grid.expect("grid");
    let meta = grid.meta();
    assert_eq!(meta.barcode, "B6BAJS120523");
    assert_eq!(meta.protocol_id, "6B");
    assert_eq!(meta.reader_id, "PSRLR3");
    assert_eq!(meta.test_date, "12/05/2023");
    assert_eq!(meta.test_time, "10:12:41");
    assert_eq!(meta.r_squared, Some(0.999));
    assert_eq!(meta.temperature, Some(21.3));
    assert!(import.warnings.is_empty());
}

#[test]
fn parses_well_grid() {
    let import = parse_plate_export(export_with(default_line).as_bytes()).expect("parse");
    let grid = import.grid.expect("grid");
    let well = grid.well(PlateRow::A, 1);
    assert_eq!(well.od, 0.45);
    assert_eq!(well.conc, Some(123.4));
    assert_eq!(well.range_flag, RangeFlag::InRange);
}

#[test]
fn range_markers_survive_as_flags() {
    let text = export_with(|row, col| {
        if row == 'A' && col == 1 {
            format!("{row},{col},Sample X1,1,2.5,0.04,2.46,2.45,>5000 ug/mL,Range?,21.3")
        } else if row == 'H' && col == 1 {
            format!("{row},{col},Sample X1,1,0.05,0.04,0.01,0.01,<10 ug/mL,,21.3")
        } else {
            default_line(row, col)
        }
    });
    let grid = parse_plate_export(text.as_bytes())
        .expect("parse")
        .grid
        .expect("grid");
    let high = grid.well(PlateRow::A, 1);
    assert_eq!(high.conc, None);
    assert_eq!(high.range_flag, RangeFlag::AboveRange);
    let low = grid.well(PlateRow::H, 1);
    assert_eq!(low.conc, None);
    assert_eq!(low.range_flag, RangeFlag::BelowRange);
}

#[test]
fn blank_od_is_mean_of_blank_wells() {
    let text = export_with(|row, col| {
        if row == 'G' && col == 12 {
            format!("{row},{col},Blank B,1,0.050,0.000,0.050,0.000,,,21.3")
        } else if row == 'H' && col == 12 {
            format!("{row},{col},Blank B,1,0.070,0.000,0.070,0.000,,,21.3")
        } else {
            default_line(row, col)
        }
    });
    let grid = parse_plate_export(text.as_bytes())
        .expect("parse")
        .grid
        .expect("grid");
    assert_eq!(grid.meta().blank_od, 0.06);
}

#[test]
fn unknown_reader_serial_maps_to_secondary_reader() {
    let text = export_with(default_line).replace("ID2: 415-2020", "ID2: 415-9999");
    let import = parse_plate_export(text.as_bytes()).expect("parse");
    assert_eq!(import.grid.expect("grid").meta().reader_id, "PSRLR4");
}

#[test]
fn missing_header_marker_is_malformed() {
    let text = "ID1: B6BAJS120523,ID2: 415-2020\nno,well,data\n";
    let error = parse_plate_export(text.as_bytes()).unwrap_err();
    assert!(matches!(error, ElisaError::MalformedPlate(_)));
}

#[test]
fn empty_data_block_yields_unusable_import() {
    let text = export_with(|row, col| format!("{row},{col},Sample X1,1,,,,,,,"));
    let import = parse_plate_export(text.as_bytes()).expect("parse");
    assert!(!import.is_usable());
    assert!(
        import
            .warnings
            .iter()
            .any(|warning| warning.contains("ICH Template"))
    );
}

#[test]
fn missing_r_squared_warns_but_parses() {
    let text = export_with(default_line).replace(",r2,0.9987\n", "");
    let import = parse_plate_export(text.as_bytes()).expect("parse");
    assert!(import.is_usable());
    assert_eq!(import.grid.expect("grid").meta().r_squared, None);
    assert!(
        import
            .warnings
            .iter()
            .any(|warning| warning.contains("r squared"))
    );
}

#[test]
fn duplicated_well_coordinates_are_malformed() {
    // A2 reported twice as A1: still 96 records, but not a full grid.
    let text = export_with(|row, col| {
        if row == 'A' && col == 2 {
            default_line('A', 1)
        } else {
            default_line(row, col)
        }
    });
    let error = parse_plate_export(text.as_bytes()).unwrap_err();
    assert!(matches!(error, ElisaError::MalformedPlate(_)));
}

#[test]
fn unparseable_od_becomes_nan() {
    let text = export_with(|row, col| {
        if row == 'A' && col == 1 {
            format!("{row},{col},Sample X1,1,0.5,0.04,0.46,Overflow,123.4 ug/mL,,21.3")
        } else {
            default_line(row, col)
        }
    });
    let grid = parse_plate_export(text.as_bytes())
        .expect("parse")
        .grid
        .expect("grid");
    assert!(grid.well(PlateRow::A, 1).od.is_nan());
}

#[test]
fn reads_export_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(export_with(default_line).as_bytes())
        .expect("write");
    let import = read_plate_export(file.path()).expect("read");
    assert!(import.is_usable());
}

#[test]
fn calibration_table_parses_serotype_column() {
    let text = "Serotype,cal1_IgG,cal1_IgM\n6B,12800,400\n19F,9600,300\n";
    let table = parse_calibration_table(text.as_bytes()).expect("parse");
    assert_eq!(table.top_point("6B").unwrap(), 12800.0);
    assert_eq!(table.top_point("19F").unwrap(), 9600.0);
}

#[test]
fn calibration_table_requires_known_column() {
    let text = "Serotype,other\n6B,12800\n";
    let error = parse_calibration_table(text.as_bytes()).unwrap_err();
    assert!(error.to_string().contains("cal1_IgG"));
}

#[test]
fn qc_limits_table_parses_bounds() {
    let text = "Serotype,Hi_Lower,Hi_Upper,Lo_Lower,Lo_Upper\n6B,1.2,2.4,0.2,0.6\n";
    let table = parse_qc_limits_table(text.as_bytes()).expect("parse");
    let limits = table.limits("6B").expect("limits");
    assert_eq!(limits.hi_lower, 1.2);
    assert_eq!(limits.hi_upper, 2.4);
    assert_eq!(limits.lo_lower, 0.2);
    assert_eq!(limits.lo_upper, 0.6);
}

#[test]
fn sample_assignments_split_first_run_and_repeats() {
    let text = "Plate,Lane1,Lane2,Lane3,Lane4\n\
                A,1001,1002,1003,1004\n\
                6BA,2001.0,,2003,\n";
    let assignments = parse_sample_assignments(text.as_bytes()).expect("parse");

    let first = Barcode::parse("B6BAJS120523").expect("barcode");
    assert_eq!(
        assignments.resolve(&first).expect("first run"),
        &[
            "1001".to_string(),
            "1002".to_string(),
            "1003".to_string(),
            "1004".to_string()
        ]
    );

    let repeat = Barcode::parse("B6BAJS120523R").expect("barcode");
    assert_eq!(
        assignments.resolve(&repeat).expect("repeat"),
        &[
            "2001".to_string(),
            "EMPTY".to_string(),
            "2003".to_string(),
            "EMPTY".to_string()
        ]
    );
}
