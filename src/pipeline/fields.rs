//! Field formatting: turn raw record values into the strings printed on a label.
//!
//! Both renderers call into this module, so a given record prints identically
//! in the Word and PDF outputs. Every function here is pure; a value that
//! cannot be formatted yields [`LabelError::InvalidNumber`] or
//! [`LabelError::InvalidDate`] naming the sheet row and column.

use crate::error::LabelError;
use crate::record::{columns, FieldValue, LabelRecord};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Date layout used on every label.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Text layouts accepted for date cells typed in as text.
const DATE_TEXT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_ONLY_TEXT_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%d.%m.%y"];

/// The three bold fact lines shared by both layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactLines {
    /// `Номер партии: … / BRIX: …% / PH: …`
    pub batch: String,
    /// `Вес Нетто: … / Вес Брутто: …`
    pub weights: String,
    /// `Изготовлено: … / Годен до: …`
    pub dates: String,
}

impl FactLines {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [self.batch.as_str(), self.weights.as_str(), self.dates.as_str()].into_iter()
    }
}

/// Format the three fact lines of a label.
pub fn fact_lines(record: &LabelRecord) -> Result<FactLines, LabelError> {
    let row = record.sheet_row;
    let produced = format_date(&record.produced_on, row, columns::PRODUCED_ON)?;
    let expires = format_date(&record.expires_on, row, columns::EXPIRES_ON)?;
    let ph = format_ph(&record.ph, row)?;

    Ok(FactLines {
        batch: format!(
            "Номер партии: {}  /  BRIX: {}%  /  PH: {}",
            record.lot_number, record.brix, ph
        ),
        weights: format!(
            "Вес Нетто: {}  /  Вес Брутто: {}",
            record.net_weight, record.gross_weight
        ),
        dates: format!("Изготовлено: {produced}  /  Годен до: {expires}"),
    })
}

/// The text of a pallet summary page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalletSummary {
    /// `ПАЛЕТА № 01`
    pub title: String,
    /// `Вес Нетто  -  100,0`
    pub net: String,
    /// `Вес Брутто  -  110,0`
    pub gross: String,
}

/// Format the summary page for pallet `pallet_no`, using the aggregates
/// carried by the last record of the group.
pub fn pallet_summary(record: &LabelRecord, pallet_no: usize) -> Result<PalletSummary, LabelError> {
    let row = record.sheet_row;
    let net = format_pallet_weight(&record.pallet_net_weight, row, columns::PALLET_NET_WEIGHT)?;
    let gross = format_pallet_weight(
        &record.pallet_gross_weight,
        row,
        columns::PALLET_GROSS_WEIGHT,
    )?;
    Ok(PalletSummary {
        title: format!("ПАЛЕТА \u{2116} {pallet_no:02}"),
        net: format!("Вес Нетто  -  {net}"),
        gross: format!("Вес Брутто  -  {gross}"),
    })
}

/// pH with exactly two decimals.
pub fn format_ph(value: &FieldValue, row: usize) -> Result<String, LabelError> {
    let ph = parse_number(value, row, columns::PH)?;
    Ok(format!("{ph:.2}"))
}

/// Pallet aggregate with one decimal and a decimal comma. Empty reads `0,0`.
pub fn format_pallet_weight(
    value: &FieldValue,
    row: usize,
    column: &'static str,
) -> Result<String, LabelError> {
    if value.is_empty() {
        return Ok("0,0".to_string());
    }
    let weight = parse_number(value, row, column)?;
    Ok(format!("{weight:.1}").replace('.', ","))
}

/// Read a cell as a number. Text may use either a decimal point or comma.
pub fn parse_number(
    value: &FieldValue,
    row: usize,
    column: &'static str,
) -> Result<f64, LabelError> {
    let invalid = || LabelError::InvalidNumber {
        row,
        column,
        value: value.to_string(),
    };
    match value {
        FieldValue::Number(n) if n.is_finite() => Ok(*n),
        FieldValue::Text(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Format a date cell as `dd.mm.yyyy`, whatever form the sheet stored it in.
pub fn format_date(
    value: &FieldValue,
    row: usize,
    column: &'static str,
) -> Result<String, LabelError> {
    let dt = parse_date(value).ok_or_else(|| LabelError::InvalidDate {
        row,
        column,
        value: value.to_string(),
    })?;
    Ok(dt.format(DATE_FORMAT).to_string())
}

/// Interpret a cell as a date: native date cell, Excel serial number, or text.
pub fn parse_date(value: &FieldValue) -> Option<NaiveDateTime> {
    match value {
        FieldValue::DateTime(dt) => Some(*dt),
        FieldValue::Number(serial) => excel_serial_to_datetime(*serial),
        FieldValue::Text(s) => parse_date_text(s.trim()),
        FieldValue::Empty => None,
    }
}

/// Parse a date typed as text. Dotted and slashed dates are day-first.
pub fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    DATE_TEXT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_ONLY_TEXT_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Convert an Excel 1900-system serial (days since 1899-12-30) to a timestamp.
///
/// Serials below 61 predate the phantom 29 Feb 1900 and count from 1899-12-31.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch_day = if serial < 61.0 { 31 } else { 30 };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, epoch_day)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_seconds(seconds)?)
}
