use crate::utils::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Formats the converter knows about. Every variant can be read; only some can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Format {
    Csv,
    Excel,
    Json,
    Xml,
    Pdf,
}

impl Format {
    pub const SOURCE_EXTENSIONS: &'static [&'static str] = &[
        "csv", "tsv", "txt", "xlsx", "xlsm", "xls", "xlsb", "ods", "json", "jsonl", "ndjson",
        "xml", "pdf",
    ];
    pub const TARGET_EXTENSIONS: &'static [&'static str] = &["csv", "xlsx", "json", "xml"];

    /// 依副檔名判斷格式
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Ok(Format::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Format::Excel),
            "json" | "jsonl" | "ndjson" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            "pdf" => Ok(Format::Pdf),
            other => Err(ConvertError::unsupported(other)),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ConvertError::unsupported(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    pub fn is_target(&self) -> bool {
        !matches!(self, Format::Pdf)
    }

    /// Rejects formats that can only be read.
    pub fn ensure_target(self) -> Result<Self> {
        if self.is_target() {
            Ok(self)
        } else {
            Err(ConvertError::unsupported(self.to_string()))
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Excel => "xlsx",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Csv => "text/csv",
            Format::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Format::Json => "application/json",
            Format::Xml => "application/xml",
            Format::Pdf => "application/pdf",
        }
    }

    pub fn supports_multiple_tables(&self) -> bool {
        !matches!(self, Format::Csv)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Csv => "CSV",
            Format::Excel => "Excel",
            Format::Json => "JSON",
            Format::Xml => "XML",
            Format::Pdf => "PDF",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excel" | "excel (.xlsx)" => Ok(Format::Excel),
            other => Self::from_extension(other),
        }
    }
}

impl TryFrom<String> for Format {
    type Error = ConvertError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.extension().to_string()
    }
}
