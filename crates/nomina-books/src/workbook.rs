//! Workbook source: xlsx, xlsm, xlsb, xls and ods via `calamine`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use nomina_core::{Book, Cell, Row};
use tracing::debug;

use crate::error::LoadError;
use crate::grid::build_sheet;
use crate::{select_sheets, BookSource};

/// A workbook file opened for reading.
pub struct WorkbookSource {
    name: String,
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    /// Open `path`, letting `calamine` pick the format from the extension.
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();
        let workbook = open_workbook_auto(&path)?;
        Ok(Self {
            name: name.into(),
            path,
            workbook,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BookSource for WorkbookSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&mut self) -> Result<Vec<String>, LoadError> {
        Ok(self.workbook.sheet_names())
    }

    fn load(&mut self, sheets: &[String]) -> Result<Book, LoadError> {
        let available = self.workbook.sheet_names();
        let mut loaded = Vec::new();
        for sheet in select_sheets(&self.name, &available, sheets) {
            let range = self.workbook.worksheet_range(&sheet)?;
            let rows = range_rows(&range);
            debug!(book = %self.name, sheet = %sheet, rows = rows.len(), "worksheet read");
            loaded.push(build_sheet(&sheet, rows.into_iter()));
        }
        Ok(Book::new(self.name.clone(), loaded))
    }
}

/// Rows of a used range, left-padded so positions stay absolute: a range
/// starting at column C still puts its first cell at index 2.
fn range_rows(range: &Range<Data>) -> Vec<Row> {
    let col_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    range
        .rows()
        .map(|cells| {
            let mut row = vec![Cell::Empty; col_offset];
            row.extend(cells.iter().map(convert));
            row
        })
        .collect()
}

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Int(n) => Cell::Int(*n),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) if dt.is_datetime() => {
            excel_date(dt).map_or(Cell::Float(dt.as_f64()), Cell::Date)
        }
        Data::DateTime(dt) => Cell::Float(dt.as_f64()),
        Data::DateTimeIso(s) => parse_iso(s).map_or_else(|| Cell::from(s.as_str()), Cell::Date),
        Data::DurationIso(s) => Cell::from(s.as_str()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Last serial Excel can display: 9999-12-31.
const MAX_SERIAL: f64 = 2_958_466.0;

/// Date-time of a date-formatted cell, honouring the workbook's 1900 or
/// 1904 system. Serials outside what Excel can display stay numbers.
fn excel_date(dt: &ExcelDateTime) -> Option<NaiveDateTime> {
    let serial = dt.as_f64();
    if !serial.is_finite() || !(0.0..MAX_SERIAL).contains(&serial) {
        return None;
    }
    dt.as_datetime()
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::ExcelDateTimeType;
    use pretty_assertions::assert_eq;

    fn date_cell(serial: f64, is_1904: bool) -> Cell {
        convert(&Data::DateTime(ExcelDateTime::new(
            serial,
            ExcelDateTimeType::DateTime,
            is_1904,
        )))
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn serial_dates() {
        assert_eq!(date_cell(45366.0, false).render(), "2024-03-15");
        assert_eq!(date_cell(45366.5, false).render(), "2024-03-15 12:00:00");
        // Serials below 60 sit before Excel's phantom 1900-02-29.
        assert_eq!(date_cell(1.0, false).render(), "1900-01-01");
        assert_eq!(date_cell(61.0, false).render(), "1900-03-01");
    }

    #[test]
    fn serial_dates_in_1904_workbooks() {
        assert_eq!(date_cell(43904.0, true).render(), "2024-03-15");
        assert_eq!(date_cell(0.0, true).render(), "1904-01-01");
    }

    #[test]
    fn out_of_range_serials_stay_numbers() {
        for serial in [1e13, -1e13, -1.0, f64::MAX, f64::MIN, f64::NAN] {
            let cell = date_cell(serial, false);
            assert!(matches!(cell, Cell::Float(_)), "serial {serial}: {cell:?}");
        }
        assert!(matches!(date_cell(1e13, true), Cell::Float(_)));
    }

    #[test]
    fn durations_stay_numbers() {
        let cell = convert(&Data::DateTime(ExcelDateTime::new(
            1.5,
            ExcelDateTimeType::TimeDelta,
            false,
        )));
        assert_eq!(cell, Cell::Float(1.5));
    }

    #[test]
    fn xlsx_fixture_loads_cells_and_dates() {
        let path = fixture("control.xlsx");
        let mut source = WorkbookSource::open("control", &path).unwrap();
        assert_eq!(source.path(), path.as_path());
        assert_eq!(source.name(), "control");
        assert_eq!(source.sheet_names().unwrap(), vec!["BASE", "HISTORICO"]);

        let book = source.load(&[]).unwrap();
        let base = book.sheet("BASE").unwrap();
        assert_eq!(base.columns, vec!["NOMBRE", "RFC", "NUM", "ALTA"]);
        assert_eq!(base.row_count(), 1);
        assert_eq!(base.cell(0, 0), &Cell::from("ANA LOPEZ"));
        assert_eq!(base.cell(0, 1), &Cell::from("ABC010101AAA"));
        assert_eq!(base.cell(0, 2).render(), "7");
        assert!(matches!(base.cell(0, 3), Cell::Date(_)));
        assert_eq!(base.cell(0, 3).render(), "2024-03-15");

        // HISTORICO's used range starts at column B.
        let historico = book.sheet("HISTORICO").unwrap();
        assert_eq!(historico.columns, vec!["A", "OFICIO", "ASUNTO"]);
        assert!(historico.cell(0, 0).is_empty());
        assert_eq!(historico.cell(0, 1), &Cell::from("OF-100"));
        assert_eq!(historico.cell(0, 2), &Cell::from("ALTA DE PERSONAL"));
    }

    #[test]
    fn xlsx_fixture_in_1904_system_renders_same_date() {
        let book = WorkbookSource::open("control", fixture("control_1904.xlsx"))
            .unwrap()
            .load(&["BASE".to_string()])
            .unwrap();
        let base = book.sheet("BASE").unwrap();
        assert_eq!(base.cell(0, 3).render(), "2024-03-15");
        assert!(book.sheet("HISTORICO").is_none());
    }

    #[test]
    fn iso_strings() {
        assert_eq!(
            parse_iso("2024-03-15T09:30:00").unwrap().to_string(),
            "2024-03-15 09:30:00"
        );
        assert_eq!(
            parse_iso("2024-03-15").unwrap().to_string(),
            "2024-03-15 00:00:00"
        );
        assert!(parse_iso("quincena 5").is_none());
    }

    #[test]
    fn scalar_conversion() {
        assert_eq!(convert(&Data::Empty), Cell::Empty);
        assert_eq!(convert(&Data::String("RFC".into())), Cell::from("RFC"));
        assert_eq!(convert(&Data::String(String::new())), Cell::Empty);
        assert_eq!(convert(&Data::Int(7)), Cell::Int(7));
        assert_eq!(convert(&Data::Float(2.5)), Cell::Float(2.5));
        assert_eq!(convert(&Data::Bool(false)), Cell::Bool(false));
    }

    #[test]
    fn range_rows_keep_absolute_columns() {
        let mut range: Range<Data> = Range::new((0, 2), (1, 3));
        range.set_value((0, 2), Data::String("RFC".into()));
        range.set_value((1, 2), Data::String("ABC".into()));
        range.set_value((1, 3), Data::Int(5));
        let rows = range_rows(&range);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![Cell::Empty, Cell::Empty, Cell::from("ABC"), Cell::Int(5)]);
    }
}
