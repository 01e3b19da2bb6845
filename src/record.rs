//! The normalised label record handed from the sheet loader to the renderers.
//!
//! Renderers only ever see [`LabelRecord`]s. Nothing here depends on how the
//! spreadsheet was read, so either renderer can be driven from a hand-built
//! fixture.

use chrono::NaiveDateTime;
use std::fmt;

/// Sheet column headers, after whitespace normalisation.
pub mod columns {
    pub const LOT_NUMBER: &str = "Номер Партии";
    pub const BRIX: &str = "BRIX";
    pub const PH: &str = "PH";
    pub const NET_WEIGHT: &str = "Нетто соуса";
    pub const GROSS_WEIGHT: &str = "Брутто бочек";
    pub const PRODUCED_ON: &str = "Дата Производства";
    pub const EXPIRES_ON: &str = "Годен до";
    pub const PALLET_NET_WEIGHT: &str = "Нетто соуса на паллете";
    pub const PALLET_GROSS_WEIGHT: &str = "Брутто паллета";

    /// Columns every sheet must have, checked in this order.
    pub const REQUIRED: [&str; 7] = [
        LOT_NUMBER,
        BRIX,
        PH,
        NET_WEIGHT,
        GROSS_WEIGHT,
        PRODUCED_ON,
        EXPIRES_ON,
    ];

    /// Per-pallet aggregates, written once per pallet and forward-filled.
    pub const AGGREGATES: [&str; 2] = [PALLET_NET_WEIGHT, PALLET_GROSS_WEIGHT];
}

/// A single cell value as it came out of the sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    /// Empty cells and whitespace-only text both count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::DateTime(v)
    }
}

/// Renders the value the way it is printed verbatim on a label.
///
/// Whole numbers print without a fractional part (`250`, not `250.0`);
/// other numbers use the shortest round-trip form.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s.trim()),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%d.%m.%Y")),
        }
    }
}

/// One barrel: a sheet row that survived normalisation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelRecord {
    /// Contiguous 0-based position among surviving rows.
    pub index: usize,
    /// 1-based row number in the source sheet, for error messages.
    pub sheet_row: usize,
    pub lot_number: FieldValue,
    pub brix: FieldValue,
    pub ph: FieldValue,
    /// Net sauce weight of this barrel.
    pub net_weight: FieldValue,
    /// Gross weight of this barrel.
    pub gross_weight: FieldValue,
    pub produced_on: FieldValue,
    pub expires_on: FieldValue,
    /// Net weight of the whole pallet, forward-filled down the group.
    pub pallet_net_weight: FieldValue,
    /// Gross weight of the whole pallet, forward-filled down the group.
    pub pallet_gross_weight: FieldValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_print_without_fraction() {
        assert_eq!(FieldValue::Number(250.0).to_string(), "250");
        assert_eq!(FieldValue::Number(12.5).to_string(), "12.5");
        assert_eq!(FieldValue::Number(-3.0).to_string(), "-3");
    }

    #[test]
    fn text_is_trimmed_and_empty_prints_nothing() {
        assert_eq!(FieldValue::from("  L-0042 ").to_string(), "L-0042");
        assert_eq!(FieldValue::Empty.to_string(), "");
    }

    #[test]
    fn whitespace_text_counts_as_empty() {
        assert!(FieldValue::from("   ").is_empty());
        assert!(FieldValue::Empty.is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
    }
}
