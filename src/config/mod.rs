pub mod cli;
pub mod job;
pub mod toml_config;

pub use job::ConversionJob;

#[cfg(feature = "cli")]
pub use self::command_line::CliConfig;

#[cfg(feature = "cli")]
mod command_line {
    use super::job::{ConversionJob, DEFAULT_PREVIEW_ROWS};
    use crate::domain::format::Format;
    use crate::utils::error::{ConvertError, Result};
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "uniconv")]
    #[command(about = "Convert tabular data between CSV, Excel, JSON, XML and PDF")]
    pub struct CliConfig {
        /// Input files; each one is converted on its own
        #[arg(required = true)]
        pub inputs: Vec<String>,

        #[arg(long, help = "Source format (csv, xlsx, json, xml, pdf); detected from the extension when omitted")]
        pub from: Option<String>,

        #[arg(long, help = "Target format (csv, xlsx, json, xml)")]
        pub to: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, help = "Output file name without extension (single input only)")]
        pub output_name: Option<String>,

        #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        pub preview_rows: usize,

        #[arg(long, help = "Do not print a preview of the first table")]
        pub no_preview: bool,

        #[arg(long, help = "Indent JSON output")]
        pub pretty: bool,

        #[arg(long, help = "Wrap the output in a ZIP archive")]
        pub archive: bool,

        #[arg(long, help = "Read at most this many PDF pages")]
        pub max_pdf_pages: Option<usize>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        /// One job per input file.
        pub fn jobs(&self) -> Result<Vec<ConversionJob>> {
            let source = self.from.as_deref().map(str::parse::<Format>).transpose()?;
            let target = validation::validate_target_format("to", &self.to)?;
            let preview_rows = if self.no_preview { 0 } else { self.preview_rows };

            Ok(self
                .inputs
                .iter()
                .map(|input| ConversionJob {
                    input_path: input.clone(),
                    output_path: self.output_path.clone(),
                    source,
                    target,
                    output_name: self.output_name.clone(),
                    preview_rows,
                    pretty_json: self.pretty,
                    archive: self.archive,
                    max_pdf_pages: self.max_pdf_pages,
                })
                .collect())
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if self.inputs.is_empty() {
                return Err(ConvertError::MissingConfigError {
                    field: "inputs".to_string(),
                });
            }
            for input in &self.inputs {
                validation::validate_path("inputs", input)?;
            }
            validation::validate_path("output_path", &self.output_path)?;

            match &self.from {
                Some(from) => {
                    from.parse::<Format>()?;
                }
                None => validation::validate_file_extensions(
                    "inputs",
                    &self.inputs,
                    Format::SOURCE_EXTENSIONS,
                )?,
            }
            validation::validate_target_format("to", &self.to)?;

            if let Some(name) = &self.output_name {
                validation::validate_non_empty_string("output_name", name)?;
                if self.inputs.len() > 1 {
                    return Err(ConvertError::InvalidConfigValueError {
                        field: "output_name".to_string(),
                        value: name.clone(),
                        reason: "Cannot share one output name between several inputs".to_string(),
                    });
                }
            }

            if let Some(pages) = self.max_pdf_pages {
                validation::validate_positive_number("max_pdf_pages", pages, 1)?;
            }

            Ok(())
        }
    }

}
