//! Converts tabular data between CSV, Excel, JSON, XML and (read-only) PDF.
//!
//! Every input is normalized into a [`DatasetCollection`] of named tables, and every
//! output is serialized from one. The pipeline layer adds file I/O, previews and
//! ZIP packaging on top of the two pure functions [`normalize`] and [`serialize`].

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{cli::LocalStorage, job::ConversionJob, toml_config::TomlConfig};

pub use crate::core::{
    etl::{ConversionEngine, ConversionReport},
    normalize::{normalize, Normalizer},
    pipeline::ConversionPipeline,
    serialize::{serialize, Serializer},
};
pub use crate::domain::format::Format;
pub use crate::domain::model::{Dataset, DatasetCollection, Preview, Value};
pub use crate::utils::error::{ConvertError, Result};

/// Runs one job end to end against the given storage.
pub async fn convert<S: domain::ports::Storage>(
    storage: S,
    job: ConversionJob,
) -> Result<ConversionReport> {
    let pipeline = ConversionPipeline::new(storage, job);
    ConversionEngine::new(pipeline).run().await
}
