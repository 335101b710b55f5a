use crate::domain::format::Format;
use crate::domain::model::{Dataset, DatasetCollection, Value};
use crate::utils::error::{ConvertError, Result};

pub const DEFAULT_TABLE_NAME: &str = "Sheet1";

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
const SNIFF_LINES: usize = 10;

pub fn read_csv(bytes: &[u8]) -> Result<DatasetCollection> {
    let text = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(ConvertError::parse(Format::Csv, "input is empty"));
    }

    let delimiter = sniff_delimiter(&text);
    tracing::debug!("CSV delimiter detected: {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| ConvertError::parse(Format::Csv, e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Err(ConvertError::parse(Format::Csv, "missing header row")),
    };

    let rows = records
        .map(|record| {
            record
                .map(|r| r.iter().map(Value::text).collect::<Vec<_>>())
                .map_err(|e| ConvertError::parse(Format::Csv, e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DatasetCollection::single(
        DEFAULT_TABLE_NAME,
        Dataset::from_rows(header, rows),
    ))
}

/// Best-effort text decoding: UTF-8 (BOM stripped), UTF-16 with BOM, else Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        return decode_utf16(rest, u16::from_be_bytes);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::debug!("Input is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

fn decode_utf16(bytes: &[u8], word: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| word([c[0], c[1]])).collect();
    String::from_utf16_lossy(&units)
}

/// Picks the candidate delimiter that appears the same non-zero number of times on
/// each of the first lines. Ties go to the higher count; `,` when nothing qualifies.
pub fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best: Option<(bool, usize, u8)> = None;
    for &candidate in &DELIMITER_CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_unquoted(line, candidate))
            .collect();
        let first = counts.first().copied().unwrap_or(0);
        if first == 0 {
            continue;
        }
        let consistent = counts.iter().all(|&c| c == first);
        let score = (consistent, first, candidate);
        if best.map_or(true, |(bc, bn, _)| (consistent, first) > (bc, bn)) {
            best = Some(score);
        }
    }

    best.map(|(_, _, d)| d).unwrap_or(b',')
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    line.bytes()
        .filter(|&b| {
            if b == b'"' {
                in_quotes = !in_quotes;
            }
            !in_quotes && b == delimiter
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_basic_csv() {
        let collection = read_csv(b"name,age\nAlice,30\nBob,25\n").unwrap();

        assert_eq!(collection.names(), vec!["Sheet1"]);
        let (_, ds) = collection.first();
        assert_eq!(ds.column_names(), vec!["name", "age"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.row(0).unwrap(), vec![&Value::text("Alice"), &Value::text("30")]);
    }

    #[test]
    fn test_semicolon_delimiter_is_detected() {
        let collection = read_csv(b"a;b\n1;\"x;y\"\n2;z\n").unwrap();
        let (_, ds) = collection.first();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert_eq!(ds.column("b").unwrap().values[0], Value::text("x;y"));
    }

    #[test]
    fn test_tab_delimiter_is_detected() {
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3\n"), b'\t');
        assert_eq!(sniff_delimiter("single column\nvalue\n"), b',');
    }

    #[test]
    fn test_empty_cells_become_null() {
        let collection = read_csv(b"a,b\n1,\n").unwrap();
        let (_, ds) = collection.first();
        assert!(ds.column("b").unwrap().values[0].is_null());
    }

    #[test]
    fn test_header_only_csv_has_no_rows() {
        let collection = read_csv(b"a,b\n").unwrap();
        let (_, ds) = collection.first();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert_eq!(ds.row_count(), 0);
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        let err = read_csv(b"  \n").unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: Format::Csv, .. }));
    }

    #[test]
    fn test_decode_bom_and_latin1() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFid"), "id");
        assert_eq!(decode_text(b"\xFF\xFEi\x00d\x00"), "id");
        assert_eq!(decode_text(b"caf\xE9"), "café");
    }
}
