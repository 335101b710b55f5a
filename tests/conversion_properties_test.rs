use uniconv::core::serialize::Serializer;
use uniconv::{normalize, serialize, ConvertError, Dataset, DatasetCollection, Format, Normalizer, Value};

fn people_csv() -> &'static [u8] {
    b"name,age\nAlice,30\nBob,25\n"
}

fn two_tables() -> DatasetCollection {
    let people = Dataset::from_rows(
        vec!["name".into(), "age".into()],
        vec![
            vec![Value::text("Alice"), Value::from(30i64)],
            vec![Value::text("Bob"), Value::from(25i64)],
        ],
    );
    let pets = Dataset::from_rows(
        vec!["kind".into()],
        vec![
            vec![Value::text("cat")],
            vec![Value::text("dog")],
            vec![Value::text("eel")],
        ],
    );
    DatasetCollection::from_tables(vec![("people".into(), people), ("pets".into(), pets)]).unwrap()
}

#[test]
fn test_csv_example_to_json() {
    let collection = normalize(people_csv(), Format::Csv).unwrap();

    assert_eq!(collection.names(), vec!["Sheet1"]);
    let (_, dataset) = collection.first();
    assert_eq!(dataset.column_names(), vec!["name", "age"]);
    let rows: Vec<Vec<String>> = dataset
        .rows()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();
    assert_eq!(rows, vec![vec!["Alice", "30"], vec!["Bob", "25"]]);

    let output = serialize(&collection, Format::Json).unwrap();
    assert_eq!(
        String::from_utf8(output.bytes).unwrap(),
        r#"[{"name":"Alice","age":"30"},{"name":"Bob","age":"25"}]"#
    );
}

#[test]
fn test_csv_round_trip_keeps_names_and_values() {
    let input = b"city,note,count\nOslo,\"cold, dark\",3\nRome,,12\n";
    let first = normalize(input, Format::Csv).unwrap();

    let written = serialize(&first, Format::Csv).unwrap();
    let second = normalize(&written.bytes, Format::Csv).unwrap();

    assert_eq!(first.first().1, second.first().1);
    assert!(second.first().1.column("note").unwrap().values[1].is_null());
}

#[test]
fn test_excel_preserves_every_table() {
    let collection = two_tables();

    let workbook = serialize(&collection, Format::Excel).unwrap();
    let reread = normalize(&workbook.bytes, Format::Excel).unwrap();

    assert_eq!(reread.names(), vec!["people", "pets"]);
    assert_eq!(reread.get("people").unwrap().row_count(), 2);
    assert_eq!(reread.get("pets").unwrap().row_count(), 3);
    assert_eq!(
        reread.get("people").unwrap().column("age").unwrap().values,
        vec![Value::from(30i64), Value::from(25i64)]
    );
}

#[test]
fn test_excel_sheet_names_are_sanitized() {
    let ds = Dataset::from_rows(vec!["a".into()], vec![vec![Value::from(1i64)]]);
    let collection = DatasetCollection::single("Q1/Q2: results", ds);

    let workbook = serialize(&collection, Format::Excel).unwrap();
    let reread = normalize(&workbook.bytes, Format::Excel).unwrap();
    assert_eq!(reread.names(), vec!["Q1_Q2_ results"]);
}

#[test]
fn test_json_shape_follows_table_count() {
    let single = normalize(people_csv(), Format::Csv).unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&serialize(&single, Format::Json).unwrap().bytes).unwrap();
    assert!(json.is_array());

    let json: serde_json::Value =
        serde_json::from_slice(&serialize(&two_tables(), Format::Json).unwrap().bytes).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), vec!["people", "pets"]);
    assert_eq!(object["pets"].as_array().unwrap().len(), 3);
}

#[test]
fn test_json_round_trip_of_many_tables() {
    let written = serialize(&two_tables(), Format::Json).unwrap();
    let reread = normalize(&written.bytes, Format::Json).unwrap();

    assert_eq!(reread.names(), vec!["people", "pets"]);
    assert_eq!(reread.get("people").unwrap(), two_tables().get("people").unwrap());
}

#[test]
fn test_xml_round_trip_of_many_tables() {
    let written = serialize(&two_tables(), Format::Xml).unwrap();
    let text = String::from_utf8(written.bytes.clone()).unwrap();
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(text.contains("<sheet name=\"pets\">"));

    let reread = normalize(&written.bytes, Format::Xml).unwrap();
    assert_eq!(reread.names(), vec!["people", "pets"]);
    assert_eq!(reread.get("pets").unwrap().row_count(), 3);
}

/// Rows made only of nulls, one of them last, plus a table with a header and no rows.
fn sparse_tables() -> DatasetCollection {
    let people = Dataset::from_rows(
        vec!["name".into(), "age".into()],
        vec![
            vec![Value::text("Alice"), Value::from(30i64)],
            vec![Value::Null, Value::Null],
            vec![Value::text("Bob"), Value::Null],
            vec![Value::Null, Value::Null],
        ],
    );
    let empty = Dataset::from_rows(vec!["x".into(), "y".into()], Vec::new());
    DatasetCollection::from_tables(vec![("people".into(), people), ("empty".into(), empty)]).unwrap()
}

fn all_null(dataset: &Dataset, index: usize) -> bool {
    dataset.row(index).unwrap().iter().all(|v| v.is_null())
}

#[test]
fn test_excel_keeps_trailing_blank_rows() {
    let collection = normalize(b"a,b\n1,2\n,\n", Format::Csv).unwrap();
    assert_eq!(collection.first().1.row_count(), 2);

    let workbook = serialize(&collection, Format::Excel).unwrap();
    let reread = normalize(&workbook.bytes, Format::Excel).unwrap();

    let (_, dataset) = reread.first();
    assert_eq!(dataset.row_count(), 2);
    assert!(all_null(dataset, 1));
}

#[test]
fn test_excel_round_trip_of_sparse_tables() {
    let collection = sparse_tables();

    let workbook = serialize(&collection, Format::Excel).unwrap();
    let reread = normalize(&workbook.bytes, Format::Excel).unwrap();

    assert_eq!(reread.names(), vec!["people", "empty"]);
    assert_eq!(reread.get("people").unwrap(), collection.get("people").unwrap());

    // 表頭仍在，只是沒有資料列
    let empty = reread.get("empty").unwrap();
    assert_eq!(empty.column_names(), vec!["x", "y"]);
    assert_eq!(empty.row_count(), 0);
}

#[test]
fn test_json_round_trip_of_sparse_tables() {
    let collection = sparse_tables();

    let written = serialize(&collection, Format::Json).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&written.bytes).unwrap();
    assert_eq!(json["empty"], serde_json::json!([]));
    assert_eq!(json["people"][3], serde_json::json!({"name": null, "age": null}));

    let reread = normalize(&written.bytes, Format::Json).unwrap();
    assert_eq!(reread.names(), vec!["people", "empty"]);
    assert_eq!(reread.get("people").unwrap(), collection.get("people").unwrap());
    assert_eq!(reread.get("empty").unwrap().row_count(), 0);
}

#[test]
fn test_xml_round_trip_of_header_only_csv() {
    let collection = normalize(b"a,b\n", Format::Csv).unwrap();
    assert_eq!(collection.first().1.row_count(), 0);

    let first = serialize(&collection, Format::Xml).unwrap();
    let reread = normalize(&first.bytes, Format::Xml).unwrap();
    assert_eq!(reread.names(), vec!["Sheet1"]);
    assert_eq!(reread.first().1.row_count(), 0);

    let second = serialize(&reread, Format::Xml).unwrap();
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn test_xml_round_trip_of_sparse_tables() {
    let written = serialize(&sparse_tables(), Format::Xml).unwrap();
    let reread = normalize(&written.bytes, Format::Xml).unwrap();

    assert_eq!(reread.names(), vec!["people", "empty"]);
    let people = reread.get("people").unwrap();
    assert_eq!(people.row_count(), 4);
    assert_eq!(people.column_names(), vec!["name", "age"]);
    assert!(all_null(people, 1));
    assert!(all_null(people, 3));
    assert_eq!(reread.get("empty").unwrap().row_count(), 0);
}

#[test]
fn test_unsupported_formats_produce_no_output() {
    let err = serialize(&two_tables(), Format::Pdf).unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedFormat { .. }));

    let err = Normalizer::new().normalize_as(people_csv(), "docx").unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedFormat { .. }));

    let err = Serializer::default().serialize_as(&two_tables(), "yaml").unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedFormat { .. }));
}

#[test]
fn test_malformed_inputs_are_parse_errors() {
    for (bytes, format) in [
        (&b"{\"a\": "[..], Format::Json),
        (&b"<open>"[..], Format::Xml),
        (&b"PK not really"[..], Format::Excel),
        (&b"%PDF-garbage"[..], Format::Pdf),
    ] {
        let err = normalize(bytes, format).unwrap_err();
        assert!(
            matches!(err, ConvertError::Parse { .. }),
            "{} input gave {:?}",
            format,
            err
        );
    }
}
