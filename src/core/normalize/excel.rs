use crate::domain::format::Format;
use crate::domain::model::{Dataset, DatasetCollection, Value};
use crate::utils::error::{ConvertError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::NaiveDateTime;
use std::io::{Cursor, Read, Seek};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest integer an f64 holds exactly.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// One table per worksheet, in workbook order. The first row of each sheet is the header.
pub fn read_excel(bytes: &[u8]) -> Result<DatasetCollection> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ConvertError::parse(Format::Excel, e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(ConvertError::parse(Format::Excel, "workbook has no worksheets"));
    }

    let mut tables = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let declared_last_row = declared_last_row(&mut workbook, &name);
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ConvertError::parse(Format::Excel, format!("sheet '{}': {}", name, e)))?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(|cell| cell_value(cell).to_string()).collect())
            .unwrap_or_default();
        let mut data: Vec<Vec<Value>> = rows
            .map(|row| row.iter().map(cell_value).collect())
            .collect();

        // 尾端整列空白的資料列不在 range 內，依宣告範圍補回 Null 列
        if let (Some(last), Some((end_row, _))) = (declared_last_row, range.end()) {
            if last > end_row {
                data.extend((end_row..last).map(|_| Vec::new()));
            }
        }

        tracing::debug!("Sheet '{}': {} data rows", name, data.len());
        tables.push((name, Dataset::from_rows(header, data)));
    }

    DatasetCollection::from_tables(tables)
}

/// Last row of the sheet's `<dimension>`, which also covers blank cells. XLSX only.
fn declared_last_row<RS: Read + Seek>(workbook: &mut Sheets<RS>, name: &str) -> Option<u32> {
    match workbook {
        Sheets::Xlsx(xlsx) => xlsx
            .worksheet_cells_reader(name)
            .ok()
            .map(|reader| reader.dimensions().end.0),
        _ => None,
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => number_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::text(s.as_str()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Value::Text(format_datetime(&d)))
            .unwrap_or_else(|| Value::from_f64(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::text(s.as_str()),
    }
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Spreadsheets store every number as a float; whole numbers come back as integers.
fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT_INT {
        Value::from(f as i64)
    } else {
        Value::from_f64(f)
    }
}
