use crate::domain::format::Format;
use crate::domain::model::{Dataset, DatasetCollection, Value};
use crate::utils::error::{ConvertError, Result};
use lopdf::Document;
use regex::Regex;

pub const TEXT_COLUMN: &str = "text";

/// Rows of cells for each table found in one page of text.
pub type DetectedTable = Vec<Vec<String>>;

/// Finds table structure in extracted page text. Heuristic by nature.
pub trait PdfTableDetector: Send + Sync {
    fn detect(&self, page_text: &str) -> Vec<DetectedTable>;
}

/// Treats runs of consecutive lines that split into the same number (two or more) of
/// cells as a table. Cells are separated by tabs or by two or more spaces.
#[derive(Debug, Clone)]
pub struct WhitespaceTableDetector {
    separator: Regex,
    min_rows: usize,
}

impl WhitespaceTableDetector {
    pub fn new(min_rows: usize) -> Self {
        Self {
            separator: Regex::new(r"\t+|\s{2,}").expect("cell separator pattern is valid"),
            min_rows: min_rows.max(1),
        }
    }

    fn cells(&self, line: &str) -> Vec<String> {
        self.separator
            .split(line.trim())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn flush(&self, current: &mut DetectedTable, tables: &mut Vec<DetectedTable>) {
        if current.len() >= self.min_rows {
            tables.push(std::mem::take(current));
        } else {
            current.clear();
        }
    }
}

impl Default for WhitespaceTableDetector {
    fn default() -> Self {
        Self::new(2)
    }
}

impl PdfTableDetector for WhitespaceTableDetector {
    fn detect(&self, page_text: &str) -> Vec<DetectedTable> {
        let mut tables = Vec::new();
        let mut current: DetectedTable = Vec::new();

        for line in page_text.lines() {
            let cells = self.cells(line);
            let continues = cells.len() >= 2
                && current.first().map_or(true, |first| first.len() == cells.len());

            if continues {
                current.push(cells);
                continue;
            }

            self.flush(&mut current, &mut tables);
            if cells.len() >= 2 {
                current.push(cells);
            }
        }
        self.flush(&mut current, &mut tables);

        tables
    }
}

/// Tables per page; a page without table structure contributes its text instead,
/// so a PDF with pages never produces an empty collection.
pub fn read_pdf(
    bytes: &[u8],
    detector: &dyn PdfTableDetector,
    max_pages: Option<usize>,
) -> Result<DatasetCollection> {
    let document =
        Document::load_mem(bytes).map_err(|e| ConvertError::parse(Format::Pdf, e.to_string()))?;

    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(ConvertError::parse(Format::Pdf, "document has no pages"));
    }
    if let Some(limit) = max_pages.filter(|&limit| limit < pages.len()) {
        tracing::info!("Reading the first {} of {} PDF pages", limit, pages.len());
    }

    let mut tables = Vec::new();
    for &page_number in pages.keys().take(max_pages.unwrap_or(usize::MAX)) {
        let text = document.extract_text(&[page_number]).unwrap_or_else(|e| {
            tracing::warn!("Could not extract text from page {}: {}", page_number, e);
            String::new()
        });

        let detected = detector.detect(&text);
        tracing::debug!("Page {}: {} table(s) detected", page_number, detected.len());

        if detected.is_empty() {
            tables.push((format!("page{}_text", page_number), text_table(&text)));
            continue;
        }

        for (index, rows) in detected.into_iter().enumerate() {
            let mut rows = rows.into_iter();
            let header = rows.next().unwrap_or_default();
            let data = rows
                .map(|row| row.into_iter().map(Value::text).collect())
                .collect();
            tables.push((
                format!("page{}_table{}", page_number, index + 1),
                Dataset::from_rows(header, data),
            ));
        }
    }

    DatasetCollection::from_tables(tables)
}

fn text_table(text: &str) -> Dataset {
    Dataset::from_rows(
        vec![TEXT_COLUMN.to_string()],
        vec![vec![Value::Text(text.trim().to_string())]],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_aligned_columns() {
        let text = "Quarterly report\nRegion    Sales   Units\nNorth     1200    40\nSouth     900     31\n\nPrepared by finance";
        let tables = WhitespaceTableDetector::default().detect(text);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0], vec!["Region", "Sales", "Units"]);
        assert_eq!(tables[0].len(), 3);
    }

    #[test]
    fn test_tab_separated_lines() {
        let tables = WhitespaceTableDetector::default().detect("a\tb\n1\t2\n");
        assert_eq!(tables, vec![vec![vec!["a", "b"], vec!["1", "2"]]]);
    }

    #[test]
    fn test_prose_has_no_tables() {
        let text = "This is an ordinary sentence.\nAnd another one follows it.";
        assert!(WhitespaceTableDetector::default().detect(text).is_empty());
    }

    #[test]
    fn test_single_aligned_line_is_not_a_table() {
        let text = "Name    Value\nplain prose here";
        assert!(WhitespaceTableDetector::default().detect(text).is_empty());
    }

    #[test]
    fn test_column_count_change_splits_tables() {
        let text = "a  b\n1  2\nx  y  z\n7  8  9";
        let tables = WhitespaceTableDetector::default().detect(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1][0], vec!["x", "y", "z"]);
    }

    #[test]
    fn test_text_table_shape() {
        let ds = text_table("  hello  ");
        assert_eq!(ds.column_names(), vec![TEXT_COLUMN]);
        assert_eq!(ds.row_count(), 1);
        assert_eq!(ds.column(TEXT_COLUMN).unwrap().values[0], Value::text("hello"));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = read_pdf(b"not a pdf", &WhitespaceTableDetector::default(), None).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: Format::Pdf, .. }));
    }
}
