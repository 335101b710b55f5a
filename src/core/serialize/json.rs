use crate::domain::model::{Dataset, DatasetCollection};
use crate::utils::error::Result;
use serde_json::{Map, Value as JsonValue};

/// A single table is written as a bare array of row objects; several tables as an
/// object keyed by table name. Key order follows column order.
pub fn write_json(collection: &DatasetCollection, pretty: bool) -> Result<Vec<u8>> {
    let document = if collection.len() == 1 {
        table_json(collection.first().1)
    } else {
        JsonValue::Object(
            collection
                .iter()
                .map(|(name, dataset)| (name.to_string(), table_json(dataset)))
                .collect(),
        )
    };

    let bytes = if pretty {
        serde_json::to_vec_pretty(&document)?
    } else {
        serde_json::to_vec(&document)?
    };
    Ok(bytes)
}

fn table_json(dataset: &Dataset) -> JsonValue {
    let names = dataset.column_names();
    JsonValue::Array(
        dataset
            .rows()
            .map(|row| {
                let object: Map<String, JsonValue> = names
                    .iter()
                    .zip(row)
                    .map(|(name, value)| (name.to_string(), value.to_json()))
                    .collect();
                JsonValue::Object(object)
            })
            .collect(),
    )
}
