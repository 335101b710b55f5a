use crate::domain::format::Format;
use crate::domain::model::Dataset;
use crate::utils::error::{ConvertError, Result};

/// Header row then one record per row; Null cells are written as empty fields.
pub fn write_csv(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if !dataset.is_empty() {
        writer.write_record(dataset.column_names())?;
        for row in dataset.rows() {
            writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ConvertError::export(Format::Csv, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Value;

    #[test]
    fn test_write_quotes_and_nulls() {
        let ds = Dataset::from_rows(
            vec!["name".into(), "note".into()],
            vec![
                vec![Value::text("Ann"), Value::text("likes, commas")],
                vec![Value::text("Bo"), Value::Null],
            ],
        );

        let bytes = write_csv(&ds).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "name,note\nAnn,\"likes, commas\"\nBo,\n"
        );
    }

    #[test]
    fn test_typed_values_are_stringified() {
        let ds = Dataset::from_rows(
            vec!["n".into(), "ok".into()],
            vec![vec![Value::from(2.5), Value::from(true)]],
        );
        let bytes = write_csv(&ds).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "n,ok\n2.5,true\n");
    }
}
