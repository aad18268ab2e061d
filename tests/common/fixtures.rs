//! Payroll fixtures shared across harnesses.
//!
//! One "control" book with three sheets shaped like a real payroll office
//! keeps them: a staff register, an office-memo history and fortnightly
//! payments. Row positions are referenced by number in the harnesses, so
//! append new rows at the end.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use nomina_core::{Book, Cell, FieldColumnMap, Sheet};

use crate::common::builders::SheetBuilder;

pub const RFC_ANA: &str = "ABC010101AAA";
pub const RFC_LUIS: &str = "XYZ020202BBB";

/// `BASE`: NOMBRE (A), RFC (B), CURP (C), PUESTO (D).
pub fn base_sheet() -> Sheet {
    SheetBuilder::new("BASE")
        .columns(["NOMBRE", "RFC", "CURP", "PUESTO"])
        .row(["ANA LOPEZ", RFC_ANA, "LOPA010101MDFRRN01", "ANALISTA"])
        .row(["LUIS PEREZ", RFC_LUIS, "PEXL020202HDFRRS02", "JEFE DE AREA"])
        .row(["MARIA ABCEDE", "MAR030303CCC", "", "ANALISTA"])
        .build()
}

/// `HISTORICO`: FECHA (A), OFICIO (B), ASUNTO (C), RFC TITULAR (D),
/// RFC SUPLENTE (E).
pub fn historico_sheet() -> Sheet {
    let day = |d| Cell::Date(NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(0, 0, 0).unwrap());
    SheetBuilder::new("HISTORICO")
        .columns(["FECHA", "OFICIO", "ASUNTO", "RFC TITULAR", "RFC SUPLENTE"])
        .cells(vec![day(1), "OF-100".into(), "ALTA DE PERSONAL".into(), RFC_ANA.into(), Cell::Empty])
        .cells(vec![day(8), "OF-101".into(), "BAJA".into(), Cell::Empty, "abc010101aaa".into()])
        .cells(vec![day(15), "OF-102".into(), "CAMBIO DE ADSCRIPCION".into(), RFC_LUIS.into()])
        .build()
}

/// `QUINCENAS`: RFC (A), QUINCENA (B), IMPORTE (C).
pub fn quincenas_sheet() -> Sheet {
    SheetBuilder::new("QUINCENAS")
        .columns(["RFC", "QUINCENA", "IMPORTE"])
        .cells(vec![RFC_ANA.into(), "2024-05".into(), Cell::Float(1500.0)])
        .cells(vec![RFC_LUIS.into(), "2024-05".into(), Cell::Float(2300.5)])
        .cells(vec![RFC_ANA.into(), "2024-06".into(), Cell::Float(1500.0)])
        .build()
}

pub fn control_book() -> Book {
    Book::new(
        "control",
        vec![base_sheet(), historico_sheet(), quincenas_sheet()],
    )
}

/// RFC on every sheet (two columns on HISTORICO), NOMBRE and CURP on BASE
/// only, OFICIO on HISTORICO only.
pub fn payroll_field_map() -> FieldColumnMap {
    FieldColumnMap::new()
        .with("RFC", "BASE", "B")
        .with("RFC", "HISTORICO", "D, E")
        .with("RFC", "QUINCENAS", "A")
        .with("NOMBRE", "BASE", "A")
        .with("CURP", "BASE", "C")
        .with("OFICIO", "HISTORICO", "B")
}

// ---------------------------------------------------------------------------
// Fixture file generation helpers
// ---------------------------------------------------------------------------

/// Write `sheet` as `<dir>/<name>.csv`, header first, cells rendered.
pub fn write_csv_sheet(dir: &Path, sheet: &Sheet) -> PathBuf {
    let path = dir.join(format!("{}.csv", sheet.name));
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(&path)
        .expect("create fixture csv");
    writer.write_record(&sheet.columns).expect("write header");
    for row in &sheet.rows {
        writer
            .write_record(row.iter().map(Cell::render))
            .expect("write row");
    }
    writer.flush().expect("flush fixture csv");
    path
}

/// Lay the control book out as a directory of CSV files under `root`.
pub fn write_control_book(root: &Path) -> PathBuf {
    let dir = root.join("control");
    std::fs::create_dir_all(&dir).expect("create book dir");
    for sheet in &control_book().sheets {
        write_csv_sheet(&dir, sheet);
    }
    dir
}
