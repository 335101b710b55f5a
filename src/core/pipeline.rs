use crate::core::normalize::Normalizer;
use crate::core::serialize::{SerializeOptions, Serializer};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::format::Format;
use crate::domain::model::{DatasetCollection, NamedOutput, TransformResult};
use crate::utils::error::Result;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Reads one input file, converts it and writes the result next to the configured output path.
pub struct ConversionPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    normalizer: Normalizer,
    serializer: Serializer,
}

impl<S: Storage, C: ConfigProvider> ConversionPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let normalizer = Normalizer::new().with_max_pdf_pages(config.max_pdf_pages());
        let serializer = Serializer::new(SerializeOptions {
            pretty_json: config.pretty_json(),
        });
        Self {
            storage,
            config,
            normalizer,
            serializer,
        }
    }

    /// Replaces the default XML/PDF heuristics.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn source_format(&self) -> Result<Format> {
        match self.config.source_format() {
            Some(format) => Ok(format),
            None => Format::from_path(self.config.input_path()),
        }
    }

    fn output_stem(&self) -> String {
        if let Some(name) = self.config.output_name() {
            return name.to_string();
        }
        Path::new(self.config.input_path())
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("output")
            .to_string()
    }

    fn output_file(&self, file_name: &str) -> String {
        Path::new(self.config.output_path())
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ConversionPipeline<S, C> {
    async fn extract(&self) -> Result<DatasetCollection> {
        let format = self.source_format()?;
        tracing::debug!("Reading {} as {}", self.config.input_path(), format);

        let bytes = self.storage.read_file(self.config.input_path()).await?;
        self.normalizer.normalize(&bytes, format)
    }

    async fn transform(&self, data: DatasetCollection) -> Result<TransformResult> {
        let target = self.config.target_format().ensure_target()?;
        let stem = self.output_stem();

        let preview = match self.config.preview_rows() {
            0 => None,
            rows => Some(data.preview(rows)),
        };
        let table_names = data.names().iter().map(|n| n.to_string()).collect();

        // 壓縮模式下 CSV 可逐表輸出，不必捨棄其他表
        if self.config.archive() && target == Format::Csv && data.len() > 1 {
            let tables = self.serializer.serialize_tables_csv(&data)?;
            let file_names = unique_file_names(tables.iter().map(|(table, _)| file_safe(table)));
            let outputs = tables
                .into_iter()
                .zip(file_names)
                .map(|((_, bytes), stem)| NamedOutput {
                    file_name: format!("{}.csv", stem),
                    bytes,
                })
                .collect();
            return Ok(TransformResult {
                preview,
                table_names,
                outputs,
                warnings: Vec::new(),
            });
        }

        let output = self.serializer.serialize(&data, target)?;
        Ok(TransformResult {
            preview,
            table_names,
            outputs: vec![NamedOutput {
                file_name: format!("{}.{}", stem, output.extension()),
                bytes: output.bytes,
            }],
            warnings: output.warnings,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        if self.config.archive() {
            let archive_name = format!("{}.zip", self.output_stem());
            tracing::debug!("Creating ZIP file with {} files", result.outputs.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for output in &result.outputs {
                    zip.start_file(output.file_name.as_str(), SimpleFileOptions::default())?;
                    zip.write_all(&output.bytes)?;
                }
                zip.finish()?.into_inner()
            };

            let path = self.output_file(&archive_name);
            tracing::debug!("Writing ZIP file ({} bytes) to {}", zip_data.len(), path);
            self.storage.write_file(&path, &zip_data).await?;
            return Ok(path);
        }

        let mut written = Vec::with_capacity(result.outputs.len());
        for output in &result.outputs {
            let path = self.output_file(&output.file_name);
            tracing::debug!("Writing {} bytes to {}", output.bytes.len(), path);
            self.storage.write_file(&path, &output.bytes).await?;
            written.push(path);
        }
        Ok(written.join(", "))
    }
}

fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim().is_empty() {
        "table".to_string()
    } else {
        cleaned
    }
}

/// 不同表名清理後可能撞名；壓縮檔內檔名不分大小寫去重
fn unique_file_names(stems: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut used = HashSet::new();
    stems
        .into_iter()
        .map(|stem| {
            let mut candidate = stem.clone();
            let mut n = 2;
            while used.contains(&candidate.to_lowercase()) {
                candidate = format!("{}_{}", stem, n);
                n += 1;
            }
            used.insert(candidate.to_lowercase());
            candidate
        })
        .collect()
}
