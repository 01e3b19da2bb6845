//! Pipeline stages for spreadsheet-to-label generation.
//!
//! Each submodule implements one step. The renderers only ever see
//! [`crate::record::LabelRecord`]s, so either can be driven from a fixture
//! without a workbook.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ fields ──┬──▶ word ──▶ docx   (Labels.docx)
//! (.xlsx)   (records)    (text)    └──▶ pdf  ──▶ fonts, logos, pallet
//!                                              (Labels.pdf)
//! ```
//!
//! 1. [`input`]      validate the workbook and open its first sheet
//! 2. [`normalize`]  headers, forward fill, drop rows without a lot number
//! 3. [`fields`]     format numbers and dates for printing
//! 4. [`word`]       lay out one page per record via the [`docx`] writer
//! 5. [`pdf`]        draw label pages and pallet summaries; [`pallet`]
//!    decides page order, [`fonts`] and [`logos`] resolve optional assets

pub mod docx;
pub mod fields;
pub mod fonts;
pub mod input;
pub mod logos;
pub mod normalize;
pub mod pallet;
pub mod pdf;
pub mod word;
