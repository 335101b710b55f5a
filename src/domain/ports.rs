use crate::domain::format::Format;
use crate::domain::model::{DatasetCollection, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// What a conversion needs to know about its job, regardless of where the settings came from.
pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    /// Explicit source format; `None` means detect from the input extension.
    fn source_format(&self) -> Option<Format>;
    fn target_format(&self) -> Format;
    /// Output file name without extension; `None` means reuse the input stem.
    fn output_name(&self) -> Option<&str>;
    /// Rows shown in the preview; `0` disables it.
    fn preview_rows(&self) -> usize;
    fn pretty_json(&self) -> bool;
    fn archive(&self) -> bool;
    fn max_pdf_pages(&self) -> Option<usize>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<DatasetCollection>;
    async fn transform(&self, data: DatasetCollection) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
