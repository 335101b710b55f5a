use crate::core::normalize::csv::{decode_text, DEFAULT_TABLE_NAME};
use crate::domain::format::Format;
use crate::domain::model::{Dataset, DatasetCollection, Value};
use crate::utils::error::{ConvertError, Result};
use serde_json::{Map, Value as JsonValue};

const SCALAR_COLUMN: &str = "value";

/// Reads a JSON document, or JSON Lines when the input is not one document.
pub fn read_json(bytes: &[u8]) -> Result<DatasetCollection> {
    let text = decode_text(bytes);

    let document = match serde_json::from_str::<JsonValue>(&text) {
        Ok(document) => document,
        Err(err) => match parse_json_lines(&text) {
            Some(lines) => {
                tracing::debug!("Input parsed as JSON Lines");
                lines
            }
            None => return Err(ConvertError::parse(Format::Json, err.to_string())),
        },
    };

    tables_from_document(document)
}

/// Every non-empty line must hold a JSON document.
fn parse_json_lines(text: &str) -> Option<JsonValue> {
    let documents = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str::<JsonValue>(line).ok())
        .collect::<Option<Vec<_>>>()?;

    if documents.is_empty() {
        None
    } else {
        Some(JsonValue::Array(documents))
    }
}

fn tables_from_document(document: JsonValue) -> Result<DatasetCollection> {
    match document {
        JsonValue::Array(items) => Ok(DatasetCollection::single(
            DEFAULT_TABLE_NAME,
            table_from_array(items),
        )),
        // 物件的每個值都是陣列 => 多表
        JsonValue::Object(map) if !map.is_empty() && map.values().all(JsonValue::is_array) => {
            let tables = map
                .into_iter()
                .map(|(name, items)| match items {
                    JsonValue::Array(items) => (name, table_from_array(items)),
                    other => (name, table_from_array(vec![other])),
                })
                .collect();
            DatasetCollection::from_tables(tables)
        }
        JsonValue::Object(map) if map.is_empty() => {
            Ok(DatasetCollection::single(DEFAULT_TABLE_NAME, Dataset::empty()))
        }
        JsonValue::Object(map) => Ok(DatasetCollection::single(
            DEFAULT_TABLE_NAME,
            Dataset::from_records(vec![flatten_object(map)]),
        )),
        scalar => Ok(DatasetCollection::single(
            DEFAULT_TABLE_NAME,
            Dataset::from_records(vec![vec![(SCALAR_COLUMN.to_string(), json_value(scalar))]]),
        )),
    }
}

fn table_from_array(items: Vec<JsonValue>) -> Dataset {
    let records = items
        .into_iter()
        .map(|item| match item {
            JsonValue::Object(map) => flatten_object(map),
            other => vec![(SCALAR_COLUMN.to_string(), json_value(other))],
        })
        .collect();
    Dataset::from_records(records)
}

/// Nested objects become dotted columns (`address.city`).
fn flatten_object(map: Map<String, JsonValue>) -> Vec<(String, Value)> {
    let mut out = Vec::with_capacity(map.len());
    flatten_into(None, map, &mut out);
    out
}

fn flatten_into(prefix: Option<&str>, map: Map<String, JsonValue>, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value {
            JsonValue::Object(inner) if !inner.is_empty() => flatten_into(Some(&key), inner, out),
            other => out.push((key, json_value(other))),
        }
    }
}

fn json_value(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => Value::Number(n),
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Object(map) if map.is_empty() => Value::Null,
        nested => Value::Text(nested.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_of_objects_unions_keys() {
        let collection = read_json(br#"[{"a": 1, "b": "x"}, {"c": true, "a": 2}]"#).unwrap();

        assert_eq!(collection.names(), vec!["Sheet1"]);
        let (_, ds) = collection.first();
        assert_eq!(ds.column_names(), vec!["a", "b", "c"]);
        assert!(ds.column("c").unwrap().values[0].is_null());
        assert!(ds.column("b").unwrap().values[1].is_null());
        assert_eq!(ds.column("c").unwrap().values[1], Value::Bool(true));
    }

    #[test]
    fn test_object_of_arrays_is_multi_table() {
        let collection =
            read_json(br#"{"people": [{"name": "Ann"}], "pets": [{"kind": "cat"}, {"kind": "dog"}]}"#)
                .unwrap();

        assert_eq!(collection.names(), vec!["people", "pets"]);
        assert_eq!(collection.get("pets").unwrap().row_count(), 2);
    }

    #[test]
    fn test_nested_objects_are_flattened() {
        let collection =
            read_json(br#"[{"id": 1, "address": {"city": "Oslo", "geo": {"lat": 59.9}}, "tags": ["a", "b"]}]"#)
                .unwrap();
        let (_, ds) = collection.first();

        assert_eq!(ds.column_names(), vec!["id", "address.city", "address.geo.lat", "tags"]);
        assert_eq!(ds.column("tags").unwrap().values[0], Value::text(r#"["a","b"]"#));
    }

    #[test]
    fn test_single_object_becomes_one_row() {
        let collection = read_json(br#"{"name": "Ann", "age": 41}"#).unwrap();
        let (_, ds) = collection.first();
        assert_eq!(ds.row_count(), 1);
        assert_eq!(ds.column("age").unwrap().values[0], Value::from(41i64));
    }

    #[test]
    fn test_scalar_array_uses_value_column() {
        let collection = read_json(b"[1, 2, 3]").unwrap();
        let (_, ds) = collection.first();
        assert_eq!(ds.column_names(), vec!["value"]);
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn test_json_lines_fallback() {
        let collection = read_json(b"{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();
        let (_, ds) = collection.first();
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = read_json(b"{\"a\": ").unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: Format::Json, .. }));
    }

    #[test]
    fn test_empty_array_is_empty_table() {
        let collection = read_json(b"[]").unwrap();
        assert_eq!(collection.len(), 1);
        assert!(collection.first().1.is_empty());
    }
}
