//! Library entry points: load records, render documents, write files.
//!
//! Loading and rendering are separate steps. [`load_records`] produces the
//! read-only record sequence; [`render`] turns any such sequence into either
//! format. [`generate`] chains the two for the common case.

use crate::config::LabelConfig;
use crate::error::LabelError;
use crate::output::{LabelDocument, OutputFormat, RenderStats, SheetSummary};
use crate::pipeline::{input, normalize, pallet, pdf, word};
use crate::record::LabelRecord;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Load and normalise the label records from an `.xlsx` file.
///
/// # Errors
/// - File not found / permission denied / not an `.xlsx`
/// - The header row or a required column is missing
pub fn load_records(
    path: impl AsRef<Path>,
    config: &LabelConfig,
) -> Result<Vec<LabelRecord>, LabelError> {
    let path = path.as_ref();
    info!("Loading records from {}", path.display());
    let bytes = input::read_workbook(path)?;
    load_records_from_bytes(&bytes, config)
}

/// Load and normalise label records from `.xlsx` bytes already in memory.
///
/// This is the API to use when the workbook comes from an upload rather
/// than a file on disk.
pub fn load_records_from_bytes(
    bytes: &[u8],
    config: &LabelConfig,
) -> Result<Vec<LabelRecord>, LabelError> {
    let range = input::open_first_sheet(bytes)?;
    let sheet = normalize::normalize(&range, config.header_row)?;
    Ok(sheet.records)
}

/// Render records into a document of the requested format.
///
/// Missing optional assets never fail the render; they are reported on
/// [`LabelDocument::warnings`].
pub fn render(
    records: &[LabelRecord],
    format: OutputFormat,
    config: &LabelConfig,
) -> Result<LabelDocument, LabelError> {
    debug!("Rendering {} records as {}", records.len(), format);
    match format {
        OutputFormat::Word => word::render_word(records, config),
        OutputFormat::Pdf => pdf::render_pdf(records, config),
    }
}

/// Load a workbook and render it in one step.
pub fn generate(
    path: impl AsRef<Path>,
    format: OutputFormat,
    config: &LabelConfig,
) -> Result<LabelDocument, LabelError> {
    let records = load_records(path, config)?;
    render(&records, format, config)
}

/// Load, render and write the document to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub fn generate_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    format: OutputFormat,
    config: &LabelConfig,
) -> Result<RenderStats, LabelError> {
    let document = generate(path, format, config)?;
    write_document(&document, output_path.as_ref())?;
    Ok(document.stats)
}

/// Write a rendered document to `path` atomically.
pub fn write_document(document: &LabelDocument, path: &Path) -> Result<(), LabelError> {
    let write_err = |source: std::io::Error| LabelError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    // Atomic write: write to a temp file in the same directory, then rename
    let suffix = format!(".{}.part", document.format.extension());
    let mut tmp = tempfile::Builder::new()
        .prefix(".labels-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(&document.bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!(
        "Wrote {} ({} bytes, {} pages)",
        path.display(),
        document.bytes.len(),
        document.stats.total_pages
    );
    Ok(())
}

/// Summarise a workbook without rendering it.
///
/// Reports the detected columns, record count, and how the records fall
/// into pallets.
pub fn inspect(path: impl AsRef<Path>, config: &LabelConfig) -> Result<SheetSummary, LabelError> {
    let bytes = input::read_workbook(path.as_ref())?;
    let range = input::open_first_sheet(&bytes)?;
    let sheet = normalize::normalize(&range, config.header_row)?;
    let records = sheet.records.len();
    Ok(SheetSummary {
        header_row: config.header_row,
        columns: sheet.columns,
        records,
        full_pallets: pallet::full_pallets(records, config.pallet_size),
        partial_pallet_records: pallet::partial_pallet_records(records, config.pallet_size),
    })
}
