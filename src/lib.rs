//! # pallet-labels
//!
//! Turn a barrel production spreadsheet into printable 150×100 mm labels.
//!
//! Each row of the sheet (one barrel of pizza sauce) becomes one label page.
//! Two documents can be produced from the same records:
//!
//! * **Word** (`Labels.docx`): one page per barrel.
//! * **PDF** (`Labels.pdf`): one page per barrel, plus a pallet summary page
//!   with the pallet's net and gross weight after every full pallet.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .xlsx
//!  │
//!  ├─ 1. Input      check ZIP magic, open the first sheet (calamine)
//!  ├─ 2. Normalize  header row 4, collapse header whitespace, forward-fill
//!  │                pallet weights, drop rows without a lot number
//!  ├─ 3. Render     Word via hand-written WordprocessingML + zip,
//!  │                PDF via pdf-writer with embedded TrueType fonts
//!  └─ 4. Output     bytes + stats + non-fatal asset warnings
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pallet_labels::{generate, LabelConfig, OutputFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LabelConfig::builder().assets_dir("assets").build()?;
//!     let pdf = generate("shipment.xlsx", OutputFormat::Pdf, &config)?;
//!     std::fs::write(pdf.file_name(), &pdf.bytes)?;
//!     for warning in &pdf.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Optional assets
//!
//! The PDF renderer looks for `Arial.ttf`, `Arial-Bold.ttf`,
//! `logo_right.png` and `logo_left.png` in [`LabelConfig::assets_dir`].
//! Without the fonts it falls back to built-in Helvetica (which cannot show
//! Cyrillic); without the logos it leaves them out. Neither is an error.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `labelgen` binary (clap + anyhow + tracing-subscriber + indicatif + serde_json) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pallet-labels = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod text;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{LabelConfig, LabelConfigBuilder};
pub use convert::{
    generate, generate_to_file, inspect, load_records, load_records_from_bytes, render,
    write_document,
};
pub use error::{AssetWarning, LabelError};
pub use output::{LabelDocument, OutputFormat, RenderStats, SheetSummary};
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};
pub use record::{FieldValue, LabelRecord};
