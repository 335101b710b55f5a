use crate::config::job::{ConversionJob, DEFAULT_OUTPUT_PATH, DEFAULT_PREVIEW_ROWS};
use crate::domain::format::Format;
use crate::utils::error::{ConvertError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Batch job file for `toml_convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub converter: ConverterConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    pub pdf: Option<PdfConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub target: Option<String>,
    pub output_path: Option<String>,
    pub preview_rows: Option<usize>,
    pub pretty_json: Option<bool>,
    pub archive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `compact` 或 `json`
    pub format: Option<String>,
    /// EnvFilter directive for either format; `RUST_LOG` overrides it
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub input: String,
    pub source: Option<String>,
    pub target: Option<String>,
    pub output_name: Option<String>,
    pub archive: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConvertError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ConvertError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("converter.name", &self.converter.name)?;
        validation::validate_path("defaults.output_path", self.output_path())?;

        if let Some(target) = &self.defaults.target {
            validation::validate_target_format("defaults.target", target)?;
        }

        if let Some(pages) = self.max_pdf_pages() {
            validation::validate_positive_number("pdf.max_pages", pages, 1)?;
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if !matches!(format, "compact" | "json") {
                return Err(ConvertError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        if self.jobs.is_empty() {
            return Err(ConvertError::MissingConfigError {
                field: "jobs".to_string(),
            });
        }

        for (index, job) in self.jobs.iter().enumerate() {
            validation::validate_path(&format!("jobs[{}].input", index), &job.input)?;
            if let Some(source) = &job.source {
                source.parse::<Format>()?;
            } else {
                Format::from_path(&job.input)?;
            }
            if let Some(target) = &job.target {
                validation::validate_target_format(&format!("jobs[{}].target", index), target)?;
            }
        }

        // 缺少目標格式時 jobs() 會回報
        self.jobs().map(|_| ())
    }

    /// 取得輸出路徑
    pub fn output_path(&self) -> &str {
        self.defaults
            .output_path
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    pub fn preview_rows(&self) -> usize {
        self.defaults.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS)
    }

    pub fn max_pdf_pages(&self) -> Option<usize> {
        self.pdf.as_ref().and_then(|p| p.max_pages)
    }

    pub fn json_logging(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .is_some_and(|f| f == "json")
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    /// Resolves every `[[jobs]]` entry against `[defaults]`.
    pub fn jobs(&self) -> Result<Vec<ConversionJob>> {
        self.jobs
            .iter()
            .enumerate()
            .map(|(index, job)| {
                let target = job
                    .target
                    .as_deref()
                    .or(self.defaults.target.as_deref())
                    .ok_or_else(|| ConvertError::MissingConfigError {
                        field: format!("jobs[{}].target", index),
                    })?;

                Ok(ConversionJob {
                    input_path: job.input.clone(),
                    output_path: self.output_path().to_string(),
                    source: job.source.as_deref().map(str::parse).transpose()?,
                    target: target.parse()?,
                    output_name: job.output_name.clone(),
                    preview_rows: self.preview_rows(),
                    pretty_json: self.defaults.pretty_json.unwrap_or(false),
                    archive: job.archive.or(self.defaults.archive).unwrap_or(false),
                    max_pdf_pages: self.max_pdf_pages(),
                })
            })
            .collect()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
