use crate::core::Pipeline;
use crate::domain::model::{ConversionWarning, Preview};
use crate::utils::error::Result;
use std::time::{Duration, Instant};

/// Outcome of one conversion job.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output_path: String,
    pub table_names: Vec<String>,
    pub preview: Option<Preview>,
    pub warnings: Vec<ConversionWarning>,
    pub elapsed: Duration,
}

pub struct ConversionEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ConversionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<ConversionReport> {
        let started = Instant::now();
        tracing::info!("Starting conversion...");

        // Extract
        let collection = self.pipeline.extract().await?;
        tracing::info!(
            "Read {} table(s): {}",
            collection.len(),
            collection.names().join(", ")
        );

        // Transform
        let mut result = self.pipeline.transform(collection).await?;

        let preview = result.preview.take();
        let table_names = std::mem::take(&mut result.table_names);
        let warnings = result.warnings.clone();

        // Load
        let output_path = self.pipeline.load(result).await?;
        let elapsed = started.elapsed();
        tracing::info!("Output saved to: {} ({:.2?})", output_path, elapsed);

        Ok(ConversionReport {
            output_path,
            table_names,
            preview,
            warnings,
            elapsed,
        })
    }
}
