use crate::domain::format::Format;
use crate::domain::model::{DatasetCollection, Value};
use crate::utils::error::{ConvertError, Result};
use rust_xlsxwriter::{Format as CellFormat, Workbook, XlsxError};
use std::collections::HashSet;

pub const MAX_SHEET_NAME_LEN: usize = 31;
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
const MAX_CELL_TEXT_LEN: usize = 32_767;

fn xlsx_error(e: XlsxError) -> ConvertError {
    ConvertError::export(Format::Excel, e.to_string())
}

/// One worksheet per table, in collection order, with a bold header row.
pub fn write_excel(collection: &DatasetCollection) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = CellFormat::new().set_bold();
    let blank_format = CellFormat::new();
    let sheet_names = sanitize_sheet_names(collection.names());

    for ((table, dataset), sheet_name) in collection.iter().zip(sheet_names) {
        if table != sheet_name {
            tracing::debug!("Sheet '{}' renamed to '{}'", table, sheet_name);
        }

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet_name).map_err(xlsx_error)?;

        for (col, name) in dataset.column_names().into_iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, name, &header_format)
                .map_err(xlsx_error)?;
        }

        for (index, row) in dataset.rows().enumerate() {
            let row_num = (index + 1) as u32;
            for (col, value) in row.into_iter().enumerate() {
                let col = col as u16;
                match value {
                    // 無格式的空字串會被略過；空白儲存格才會撐開工作表範圍，保留整列皆空的資料列
                    Value::Null => {
                        worksheet
                            .write_blank(row_num, col, &blank_format)
                            .map_err(xlsx_error)?;
                    }
                    Value::Bool(b) => {
                        worksheet.write_boolean(row_num, col, *b).map_err(xlsx_error)?;
                    }
                    Value::Number(n) => match n.as_f64() {
                        Some(f) => {
                            worksheet.write_number(row_num, col, f).map_err(xlsx_error)?;
                        }
                        None => {
                            worksheet
                                .write_string(row_num, col, n.to_string())
                                .map_err(xlsx_error)?;
                        }
                    },
                    Value::Text(s) => {
                        worksheet
                            .write_string(row_num, col, clip_cell_text(s))
                            .map_err(xlsx_error)?;
                    }
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

fn clip_cell_text(s: &str) -> &str {
    match s.char_indices().nth(MAX_CELL_TEXT_LEN) {
        Some((cut, _)) => {
            tracing::warn!("Cell text longer than {} characters was truncated", MAX_CELL_TEXT_LEN);
            &s[..cut]
        }
        None => s,
    }
}

/// Makes table names acceptable to Excel: no `[]:*?/\`, no surrounding apostrophes,
/// at most 31 characters, not blank, unique ignoring case.
pub fn sanitize_sheet_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for (index, name) in names.into_iter().enumerate() {
        let cleaned: String = name
            .chars()
            .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
            .collect();
        let cleaned = cleaned.trim().trim_matches('\'').trim();
        let base = if cleaned.is_empty() {
            format!("Sheet{}", index + 1)
        } else {
            truncate_chars(cleaned, MAX_SHEET_NAME_LEN)
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while used.contains(&candidate.to_lowercase()) || candidate.eq_ignore_ascii_case("history") {
            let suffix = format!("_{}", n);
            candidate = format!(
                "{}{}",
                truncate_chars(&base, MAX_SHEET_NAME_LEN - suffix.len()),
                suffix
            );
            n += 1;
        }

        used.insert(candidate.to_lowercase());
        result.push(candidate);
    }

    result
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Dataset;

    #[test]
    fn test_sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_sheet_names(["Q1/Q2 [draft]"]), vec!["Q1_Q2 _draft_"]);
        assert_eq!(sanitize_sheet_names(["'quoted'"]), vec!["quoted"]);
    }

    #[test]
    fn test_sanitize_truncates_and_dedupes() {
        let long = "a".repeat(40);
        let names = sanitize_sheet_names([long.as_str(), long.as_str(), "", "SHEET3"]);

        assert_eq!(names[0].chars().count(), 31);
        assert_eq!(names[1], format!("{}_2", "a".repeat(29)));
        assert_eq!(names[2], "Sheet3");
        assert_eq!(names[3], "SHEET3_2");
    }

    #[test]
    fn test_reserved_history_name_is_avoided() {
        assert_eq!(sanitize_sheet_names(["History"]), vec!["History_2"]);
    }

    #[test]
    fn test_write_produces_zip_container() {
        let ds = Dataset::from_rows(
            vec!["a".into()],
            vec![vec![Value::from(1i64)], vec![Value::Null]],
        );
        let bytes = write_excel(&DatasetCollection::single("data", ds)).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
