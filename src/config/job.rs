use crate::core::ConfigProvider;
use crate::domain::format::Format;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_PREVIEW_ROWS: usize = 100;

/// One fully resolved conversion, whichever front-end produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionJob {
    pub input_path: String,
    pub output_path: String,
    pub source: Option<Format>,
    pub target: Format,
    pub output_name: Option<String>,
    pub preview_rows: usize,
    pub pretty_json: bool,
    pub archive: bool,
    pub max_pdf_pages: Option<usize>,
}

impl ConversionJob {
    pub fn new(input_path: impl Into<String>, target: Format) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            source: None,
            target,
            output_name: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            pretty_json: false,
            archive: false,
            max_pdf_pages: None,
        }
    }
}

impl ConfigProvider for ConversionJob {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn source_format(&self) -> Option<Format> {
        self.source
    }

    fn target_format(&self) -> Format {
        self.target
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    fn pretty_json(&self) -> bool {
        self.pretty_json
    }

    fn archive(&self) -> bool {
        self.archive
    }

    fn max_pdf_pages(&self) -> Option<usize> {
        self.max_pdf_pages
    }
}
