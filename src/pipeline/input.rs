//! Input resolution: validate a workbook path and open its first sheet.
//!
//! `.xlsx` files are ZIP archives. Anything not starting with `PK\x03\x04`
//! (a renamed CSV, a binary `.xls`) is rejected as [`LabelError::NotAWorkbook`]
//! before calamine sees it.

use crate::error::LabelError;
use calamine::{Data, Range, Reader, Xlsx};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Leading bytes of every ZIP local file header.
pub const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Check if the leading bytes look like a ZIP container.
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..4] == ZIP_MAGIC
}

/// Read a local workbook into memory, validating existence and ZIP magic bytes.
pub fn read_workbook(path: &Path) -> Result<Vec<u8>, LabelError> {
    let path_buf = path.to_path_buf();

    if !path.exists() {
        return Err(LabelError::FileNotFound { path: path_buf });
    }

    let mut bytes = Vec::new();
    match std::fs::File::open(path) {
        Ok(mut f) => {
            f.read_to_end(&mut bytes)
                .map_err(|e| LabelError::WorkbookUnreadable {
                    detail: format!("{}: {e}", path.display()),
                })?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(LabelError::PermissionDenied { path: path_buf });
        }
        Err(_) => {
            return Err(LabelError::FileNotFound { path: path_buf });
        }
    }

    if !is_zip(&bytes) {
        return Err(LabelError::NotAWorkbook {
            path: path_buf,
            magic: leading_bytes(&bytes),
        });
    }

    debug!("Read workbook {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Open an in-memory `.xlsx` and return its first worksheet.
pub fn open_first_sheet(bytes: &[u8]) -> Result<Range<Data>, LabelError> {
    if !is_zip(bytes) {
        return Err(LabelError::NotAWorkbook {
            path: PathBuf::from("<memory>"),
            magic: leading_bytes(bytes),
        });
    }

    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| LabelError::WorkbookUnreadable {
            detail: e.to_string(),
        })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LabelError::EmptyWorkbook)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LabelError::EmptyWorkbook)?
        .map_err(|e| LabelError::WorkbookUnreadable {
            detail: format!("sheet '{sheet_name}': {e}"),
        })?;

    info!(
        "Opened sheet '{}': {} rows x {} columns",
        sheet_name,
        range.height(),
        range.width()
    );
    Ok(range)
}

fn leading_bytes(bytes: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    magic
}
