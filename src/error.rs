//! Error types for the pallet-labels library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LabelError`] is **fatal**. The render cannot proceed at all
//!   (not a workbook, required column missing, a date cell that cannot be
//!   parsed). Returned as `Err(LabelError)` from every public entry point.
//!
//! * [`AssetWarning`] is **non-fatal**. An optional asset (TrueType font,
//!   logo image) was missing or unusable and the renderer fell back to a
//!   built-in font or left the logo out. Stored on
//!   [`crate::output::LabelDocument::warnings`] so callers can surface it.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pallet-labels library.
#[derive(Debug, Error)]
pub enum LabelError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Spreadsheet not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but is not a ZIP-based workbook (.xlsx).
    #[error("File is not an .xlsx workbook: '{path}'\nFirst bytes: {magic:?}")]
    NotAWorkbook { path: PathBuf, magic: [u8; 4] },

    /// calamine could not open the workbook or its first sheet.
    #[error("Workbook could not be read: {detail}")]
    WorkbookUnreadable { detail: String },

    /// The workbook has no worksheets.
    #[error("Workbook contains no worksheets")]
    EmptyWorkbook,

    // ── Sheet shape errors ────────────────────────────────────────────────
    /// The sheet ends before the configured header row.
    #[error("Header row {row} is missing: the sheet has only {rows_available} rows")]
    HeaderRowMissing { row: usize, rows_available: usize },

    /// A required column is absent from the header row.
    #[error("Required column '{column}' not found in the header row.\nColumns present: {present}")]
    MissingColumn { column: String, present: String },

    // ── Field errors ──────────────────────────────────────────────────────
    /// A cell that must hold a number could not be read as one.
    #[error("Row {row}: column '{column}' is not a number: {value:?}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// A cell that must hold a date could not be read as one.
    #[error("Row {row}: column '{column}' is not a date: {value:?}")]
    InvalidDate {
        row: usize,
        column: &'static str,
        value: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Assembling the output container (zip package) failed.
    #[error("Failed to build {format} document: {detail}")]
    DocumentBuild { format: &'static str, detail: String },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal problem with an optional asset.
///
/// The render always completes; the warning only explains why the output
/// looks different from a fully provisioned run.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetWarning {
    /// The TrueType pair could not be loaded; built-in Helvetica was used.
    #[error("Font '{path}' unavailable ({detail}); using built-in Helvetica")]
    FontFallback { path: PathBuf, detail: String },

    /// A logo file exists but could not be decoded; it was left out.
    #[error("Logo '{path}' could not be decoded ({detail}); skipped")]
    LogoUnreadable { path: PathBuf, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_display() {
        let e = LabelError::MissingColumn {
            column: "Номер Партии".into(),
            present: "BRIX, PH".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Номер Партии"), "got: {msg}");
        assert!(msg.contains("BRIX, PH"), "got: {msg}");
    }

    #[test]
    fn invalid_date_display() {
        let e = LabelError::InvalidDate {
            row: 7,
            column: "Годен до",
            value: "soon".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Row 7"));
        assert!(msg.contains("Годен до"));
        assert!(msg.contains("\"soon\""));
    }

    #[test]
    fn header_row_missing_display() {
        let e = LabelError::HeaderRowMissing {
            row: 4,
            rows_available: 2,
        };
        assert!(e.to_string().contains("only 2 rows"));
    }

    #[test]
    fn font_fallback_display() {
        let w = AssetWarning::FontFallback {
            path: PathBuf::from("Arial.ttf"),
            detail: "not found".into(),
        };
        assert!(w.to_string().contains("Helvetica"));
        assert!(w.to_string().contains("Arial.ttf"));
    }
}
