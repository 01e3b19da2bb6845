//! Output types: rendered documents, render statistics and sheet summaries.

use crate::error::AssetWarning;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two label document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Word-processing document, one 150×100 mm page per label.
    Word,
    /// PDF, one page per label plus a pallet summary page per full pallet.
    Pdf,
}

impl OutputFormat {
    /// Fixed download file name.
    pub fn file_name(self) -> &'static str {
        match self {
            OutputFormat::Word => "Labels.docx",
            OutputFormat::Pdf => "Labels.pdf",
        }
    }

    /// MIME type offered with the download.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Word => "docx",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Word => f.write_str("Word"),
            OutputFormat::Pdf => f.write_str("PDF"),
        }
    }
}

/// A finished label document held in memory.
#[derive(Debug, Clone)]
pub struct LabelDocument {
    pub format: OutputFormat,
    /// The complete file contents.
    pub bytes: Vec<u8>,
    pub stats: RenderStats,
    /// Optional assets that were missing or unusable during the render.
    pub warnings: Vec<AssetWarning>,
}

impl LabelDocument {
    pub fn file_name(&self) -> &'static str {
        self.format.file_name()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Counters for one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Label pages (one per record).
    pub labels: usize,
    /// Pallet summary pages (PDF only).
    pub pallet_pages: usize,
    /// All pages in the document.
    pub total_pages: usize,
    pub duration_ms: u64,
}

/// What [`crate::inspect`] learns about a sheet without rendering it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSummary {
    /// 0-based sheet row holding the column headers.
    pub header_row: usize,
    /// Normalised header names in column order.
    pub columns: Vec<String>,
    /// Records left after dropping rows without a lot number.
    pub records: usize,
    /// Complete pallets, i.e. summary pages the PDF will contain.
    pub full_pallets: usize,
    /// Records in a trailing group too small to get a summary page.
    pub partial_pallet_records: usize,
}
