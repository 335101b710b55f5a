use crate::domain::format::Format;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Could not parse {format} input: {message}")]
    Parse { format: Format, message: String },

    #[error("Invalid dataset: {message}")]
    InvalidDataset { message: String },

    #[error("{format} export failed: {message}")]
    Export { format: Format, message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Format,
    Input,
    Output,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 依錯誤嚴重程度決定退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 資料錯誤
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl ConvertError {
    pub fn parse(format: Format, message: impl Into<String>) -> Self {
        ConvertError::Parse {
            format,
            message: message.into(),
        }
    }

    pub fn unsupported(format: impl Into<String>) -> Self {
        ConvertError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn export(format: Format, message: impl Into<String>) -> Self {
        ConvertError::Export {
            format,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::UnsupportedFormat { .. } => ErrorCategory::Format,
            ConvertError::Parse { .. } | ConvertError::CsvError(_) => ErrorCategory::Input,
            ConvertError::InvalidDataset { .. } => ErrorCategory::Data,
            ConvertError::Export { .. }
            | ConvertError::ZipError(_)
            | ConvertError::IoError(_)
            | ConvertError::SerializationError(_) => ErrorCategory::Output,
            ConvertError::ConfigError { .. }
            | ConvertError::MissingConfigError { .. }
            | ConvertError::InvalidConfigValueError { .. }
            | ConvertError::ValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    /// 嚴重程度，CLI 依此決定退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Format | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output => match self {
                ConvertError::IoError(_) => ErrorSeverity::Critical,
                _ => ErrorSeverity::High,
            },
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ConvertError::UnsupportedFormat { .. } => format!(
                "Choose one of the supported formats: inputs {}, outputs {}",
                Format::SOURCE_EXTENSIONS.join(", "),
                Format::TARGET_EXTENSIONS.join(", ")
            ),
            ConvertError::Parse { format, .. } => format!(
                "Check that the file really is {} data, or pass --from to override detection",
                format
            ),
            ConvertError::InvalidDataset { .. } => {
                "Make sure every column has the same number of rows and a unique name".to_string()
            }
            ConvertError::Export { .. } => {
                "Try a different output format or check the table contents".to_string()
            }
            ConvertError::IoError(_) | ConvertError::ZipError(_) => {
                "Check that the path exists and that you have permission to read and write it"
                    .to_string()
            }
            ConvertError::CsvError(_) | ConvertError::SerializationError(_) => {
                "The data could not be encoded; retry with a different output format".to_string()
            }
            ConvertError::ConfigError { .. }
            | ConvertError::MissingConfigError { .. }
            | ConvertError::InvalidConfigValueError { .. }
            | ConvertError::ValidationError { .. } => {
                "Review the command line arguments or the job file".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConvertError::UnsupportedFormat { format } => {
                format!("'{}' is not a supported format", format)
            }
            ConvertError::Parse { format, message } => {
                format!("Could not read the file as {}: {}", format, message)
            }
            ConvertError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
