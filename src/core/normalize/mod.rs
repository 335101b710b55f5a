//! Input normalization: raw bytes in a declared format to a [`DatasetCollection`].
//!
//! CSV, Excel and JSON have an unambiguous tabular reading. XML and PDF do not, so
//! their heuristics sit behind [`XmlFlattener`] and [`PdfTableDetector`] and can be
//! replaced on a [`Normalizer`] without changing its contract.

pub mod csv;
pub mod excel;
pub mod json;
pub mod pdf;
pub mod xml;

pub use self::pdf::{PdfTableDetector, WhitespaceTableDetector};
pub use self::xml::{SiblingRecordFlattener, XmlElement, XmlFlattener};

use crate::domain::format::Format;
use crate::domain::model::DatasetCollection;
use crate::utils::error::Result;

pub struct Normalizer {
    xml: Box<dyn XmlFlattener>,
    pdf: Box<dyn PdfTableDetector>,
    max_pdf_pages: Option<usize>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            xml: Box::new(SiblingRecordFlattener),
            pdf: Box::new(WhitespaceTableDetector::default()),
            max_pdf_pages: None,
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_xml_flattener(mut self, flattener: impl XmlFlattener + 'static) -> Self {
        self.xml = Box::new(flattener);
        self
    }

    pub fn with_pdf_detector(mut self, detector: impl PdfTableDetector + 'static) -> Self {
        self.pdf = Box::new(detector);
        self
    }

    /// Stops reading a PDF after this many pages.
    pub fn with_max_pdf_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pdf_pages = max_pages;
        self
    }

    pub fn normalize(&self, bytes: &[u8], format: Format) -> Result<DatasetCollection> {
        tracing::debug!("Normalizing {} bytes of {}", bytes.len(), format);

        let collection = match format {
            Format::Csv => self::csv::read_csv(bytes)?,
            Format::Excel => excel::read_excel(bytes)?,
            Format::Json => json::read_json(bytes)?,
            Format::Xml => xml::read_xml(bytes, self.xml.as_ref())?,
            Format::Pdf => pdf::read_pdf(bytes, self.pdf.as_ref(), self.max_pdf_pages)?,
        };

        tracing::debug!(
            "Normalized {} into {} table(s): {}",
            format,
            collection.len(),
            collection.names().join(", ")
        );
        Ok(collection)
    }

    /// Same as [`Normalizer::normalize`] with a textual selector such as `"csv"` or `"xlsx"`.
    pub fn normalize_as(&self, bytes: &[u8], selector: &str) -> Result<DatasetCollection> {
        let format: Format = selector.parse()?;
        self.normalize(bytes, format)
    }
}

/// Normalizes with the default heuristics.
pub fn normalize(bytes: &[u8], format: Format) -> Result<DatasetCollection> {
    Normalizer::default().normalize(bytes, format)
}
