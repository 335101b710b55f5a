//! Output serialization: a [`DatasetCollection`] to bytes in one target format.

pub mod csv;
pub mod excel;
pub mod json;
pub mod xml;

use crate::domain::format::Format;
use crate::domain::model::{ConversionWarning, DatasetCollection, SerializedOutput};
use crate::utils::error::{ConvertError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Serializer {
    options: SerializeOptions,
}

impl Serializer {
    pub fn new(options: SerializeOptions) -> Self {
        Self { options }
    }

    pub fn serialize(
        &self,
        collection: &DatasetCollection,
        target: Format,
    ) -> Result<SerializedOutput> {
        let mut warnings = Vec::new();

        let bytes = match target {
            Format::Csv => {
                let (kept, dataset) = collection.first();
                if collection.len() > 1 {
                    let warning = ConversionWarning::LossyExport {
                        format: Format::Csv,
                        kept: kept.to_string(),
                        dropped: collection.names()[1..].iter().map(|n| n.to_string()).collect(),
                    };
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
                self::csv::write_csv(dataset)?
            }
            Format::Excel => excel::write_excel(collection)?,
            Format::Json => json::write_json(collection, self.options.pretty_json)?,
            Format::Xml => xml::write_xml(collection)?,
            Format::Pdf => return Err(ConvertError::unsupported(target.to_string())),
        };

        tracing::debug!("Serialized {} table(s) to {} ({} bytes)", collection.len(), target, bytes.len());
        Ok(SerializedOutput {
            format: target,
            bytes,
            warnings,
        })
    }

    /// Same as [`Serializer::serialize`] with a textual selector such as `"json"`.
    pub fn serialize_as(&self, collection: &DatasetCollection, selector: &str) -> Result<SerializedOutput> {
        let target: Format = selector.parse()?;
        self.serialize(collection, target)
    }

    /// One CSV document per table, for targets that can hold several files.
    pub fn serialize_tables_csv(&self, collection: &DatasetCollection) -> Result<Vec<(String, Vec<u8>)>> {
        collection
            .iter()
            .map(|(name, dataset)| Ok((name.to_string(), self::csv::write_csv(dataset)?)))
            .collect()
    }
}

/// Serializes with default options.
pub fn serialize(collection: &DatasetCollection, target: Format) -> Result<SerializedOutput> {
    Serializer::default().serialize(collection, target)
}
