//! Row normalisation: turn the raw first sheet into ordered [`LabelRecord`]s.
//!
//! Steps, in order:
//! 1. read the header row at an absolute sheet row and collapse whitespace in
//!    each header name,
//! 2. forward-fill the two pallet aggregate columns over *every* data row,
//! 3. drop rows whose lot number is empty,
//! 4. number the survivors contiguously from 0.
//!
//! The forward fill runs before the filter, so an aggregate written on a row
//! that is later dropped still reaches the rows below it.

use crate::error::LabelError;
use crate::pipeline::fields::{excel_serial_to_datetime, parse_date_text};
use crate::record::{columns, FieldValue, LabelRecord};
use calamine::{Data, Range};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info};

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Result of normalising one sheet.
#[derive(Debug, Clone)]
pub struct NormalizedSheet {
    /// Header names found on the header row, in column order.
    pub columns: Vec<String>,
    pub records: Vec<LabelRecord>,
}

/// Collapse every whitespace run in a header to one space and trim the ends.
pub fn normalize_header(raw: &str) -> String {
    RE_WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Convert a calamine cell into a [`FieldValue`].
///
/// Excel error cells (`#N/A`, `#VALUE!`, ...) read as empty.
pub fn cell_value(cell: &Data) -> FieldValue {
    match cell {
        Data::Empty => FieldValue::Empty,
        Data::Int(i) => FieldValue::Number(*i as f64),
        Data::Float(f) => FieldValue::Number(*f),
        Data::String(s) => FieldValue::Text(s.clone()),
        Data::Bool(b) => FieldValue::Text(b.to_string()),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Some(ts) if dt.is_datetime() => FieldValue::DateTime(ts),
            _ => FieldValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(FieldValue::DateTime)
            .unwrap_or_else(|| FieldValue::Text(s.clone())),
        Data::DurationIso(s) => FieldValue::Text(s.clone()),
        Data::Error(_) => FieldValue::Empty,
    }
}

/// Header name to absolute column index. Empty header cells are skipped and
/// the first of several equally named columns wins.
struct HeaderMap {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl HeaderMap {
    fn read(range: &Range<Data>, row: u32, first_col: u32, last_col: u32) -> Self {
        let mut names = Vec::new();
        let mut index = HashMap::new();
        for col in first_col..=last_col {
            let name = match range.get_value((row, col)) {
                Some(Data::Empty) | None => continue,
                Some(cell) => normalize_header(&cell.to_string()),
            };
            if name.is_empty() {
                continue;
            }
            index.entry(name.clone()).or_insert(col);
            names.push(name);
        }
        Self { names, index }
    }

    fn require(&self, column: &str) -> Result<u32, LabelError> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| LabelError::MissingColumn {
                column: column.to_string(),
                present: self.names.join(", "),
            })
    }

    fn optional(&self, column: &str) -> Option<u32> {
        self.index.get(column).copied()
    }
}

/// Normalise the sheet using the 0-based absolute `header_row`.
pub fn normalize(range: &Range<Data>, header_row: usize) -> Result<NormalizedSheet, LabelError> {
    let (start, end) = match (range.start(), range.end()) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(LabelError::HeaderRowMissing {
                row: header_row,
                rows_available: 0,
            })
        }
    };
    let rows_available = end.0 as usize + 1;
    if header_row < start.0 as usize || header_row > end.0 as usize {
        return Err(LabelError::HeaderRowMissing {
            row: header_row,
            rows_available,
        });
    }
    let header_row = header_row as u32;

    let headers = HeaderMap::read(range, header_row, start.1, end.1);
    debug!("Header row {}: {:?}", header_row, headers.names);

    let [lot, brix, ph, net, gross, produced, expires] = {
        let mut cols = [0u32; 7];
        for (slot, name) in cols.iter_mut().zip(columns::REQUIRED) {
            *slot = headers.require(name)?;
        }
        cols
    };
    let pallet_net = headers.optional(columns::PALLET_NET_WEIGHT);
    let pallet_gross = headers.optional(columns::PALLET_GROSS_WEIGHT);

    let value_at = |row: u32, col: u32| -> FieldValue {
        range
            .get_value((row, col))
            .map(cell_value)
            .unwrap_or_default()
    };
    let column_values = |col: Option<u32>| -> Vec<FieldValue> {
        (header_row + 1..=end.0)
            .map(|row| col.map(|c| value_at(row, c)).unwrap_or_default())
            .collect()
    };

    let mut net_fill = column_values(pallet_net);
    let mut gross_fill = column_values(pallet_gross);
    forward_fill(&mut net_fill);
    forward_fill(&mut gross_fill);

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for (offset, (pallet_net_weight, pallet_gross_weight)) in
        net_fill.into_iter().zip(gross_fill).enumerate()
    {
        let row = header_row + 1 + offset as u32;
        let lot_number = value_at(row, lot);
        if lot_number.is_empty() {
            dropped += 1;
            continue;
        }
        records.push(LabelRecord {
            index: records.len(),
            sheet_row: row as usize + 1,
            lot_number,
            brix: value_at(row, brix),
            ph: value_at(row, ph),
            net_weight: value_at(row, net),
            gross_weight: value_at(row, gross),
            produced_on: value_at(row, produced),
            expires_on: value_at(row, expires),
            pallet_net_weight,
            pallet_gross_weight,
        });
    }

    info!(
        "Normalised {} records ({} rows without lot number dropped)",
        records.len(),
        dropped
    );
    Ok(NormalizedSheet {
        columns: headers.names,
        records,
    })
}

/// Replace each empty value with the nearest non-empty value above it.
/// Leading empties stay empty.
pub fn forward_fill(values: &mut [FieldValue]) {
    let mut last: Option<FieldValue> = None;
    for value in values.iter_mut() {
        if value.is_empty() {
            if let Some(prev) = &last {
                *value = prev.clone();
            }
        } else {
            last = Some(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fields::pallet_summary;
    use calamine::CellErrorType;

    const HEADERS: [&str; 9] = [
        "Номер\nПартии",
        "BRIX",
        "PH",
        "Нетто  соуса",
        "Брутто бочек",
        "Дата Производства",
        "Годен до",
        "Нетто соуса\nна паллете",
        " Брутто паллета ",
    ];

    /// Sheet with `title_rows` rows of title block, then headers, then `rows`.
    fn sheet(title_rows: u32, rows: &[[Data; 9]]) -> Range<Data> {
        let last_row = title_rows + rows.len() as u32;
        let mut range = Range::new((0, 0), (last_row, 8));
        range.set_value((0, 0), Data::String("Отгрузочная ведомость".into()));
        for (c, h) in HEADERS.iter().enumerate() {
            range.set_value((title_rows, c as u32), Data::String(h.to_string()));
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((title_rows + 1 + r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn row(lot: &str, pallet_net: Option<f64>) -> [Data; 9] {
        let lot = if lot.is_empty() {
            Data::Empty
        } else {
            Data::String(lot.into())
        };
        [
            lot,
            Data::Float(28.0),
            Data::Float(4.1),
            Data::Int(220),
            Data::Float(236.5),
            Data::String("2024-08-01".into()),
            Data::String("2025-08-01".into()),
            pallet_net.map(Data::Float).unwrap_or(Data::Empty),
            Data::Empty,
        ]
    }

    #[test]
    fn header_whitespace_is_collapsed() {
        assert_eq!(normalize_header("Нетто соуса\n на  паллете "), "Нетто соуса на паллете");
        assert_eq!(normalize_header("\tPH"), "PH");
    }

    #[test]
    fn forward_fill_copies_last_value_down() {
        let mut values: Vec<FieldValue> = vec![
            10.5.into(),
            FieldValue::Empty,
            FieldValue::Empty,
            20.0.into(),
            FieldValue::Empty,
        ];
        forward_fill(&mut values);
        let want: Vec<FieldValue> = vec![
            10.5.into(),
            10.5.into(),
            10.5.into(),
            20.0.into(),
            20.0.into(),
        ];
        assert_eq!(values, want);
    }

    #[test]
    fn leading_empties_stay_empty() {
        let mut values = vec![FieldValue::Empty, 3.0.into()];
        forward_fill(&mut values);
        assert_eq!(values[0], FieldValue::Empty);
    }

    #[test]
    fn rows_without_lot_are_dropped_and_reindexed() {
        let range = sheet(
            4,
            &[
                row("L1", Some(10.5)),
                row("L2", None),
                row("", None),
                row("L4", Some(20.0)),
                row("L5", None),
            ],
        );
        let sheet = normalize(&range, 4).unwrap();
        let lots: Vec<String> = sheet.records.iter().map(|r| r.lot_number.to_string()).collect();
        assert_eq!(lots, ["L1", "L2", "L4", "L5"]);
        let indices: Vec<usize> = sheet.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
        assert_eq!(sheet.records[2].sheet_row, 9);
    }

    #[test]
    fn aggregates_fill_through_dropped_rows() {
        let range = sheet(
            4,
            &[
                row("L1", None),
                row("", Some(99.0)),
                row("L3", None),
            ],
        );
        let sheet = normalize(&range, 4).unwrap();
        assert_eq!(sheet.records[0].pallet_net_weight, FieldValue::Empty);
        assert_eq!(sheet.records[1].pallet_net_weight, FieldValue::Number(99.0));
    }

    #[test]
    fn headers_are_matched_after_normalisation() {
        let range = sheet(4, &[row("L1", Some(1.0))]);
        let sheet = normalize(&range, 4).unwrap();
        assert!(sheet.columns.iter().any(|c| c == columns::PALLET_NET_WEIGHT));
        assert!(sheet.columns.iter().any(|c| c == columns::LOT_NUMBER));
        assert_eq!(sheet.records[0].net_weight, FieldValue::Number(220.0));
    }

    #[test]
    fn missing_lot_column_is_fatal() {
        let mut range = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("BRIX".into()));
        range.set_value((0, 1), Data::String("PH".into()));
        range.set_value((1, 0), Data::Float(28.0));
        let err = normalize(&range, 0).unwrap_err();
        match err {
            LabelError::MissingColumn { column, present } => {
                assert_eq!(column, columns::LOT_NUMBER);
                assert_eq!(present, "BRIX, PH");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_sheet_has_no_header_row() {
        let mut range = Range::new((0, 0), (1, 0));
        range.set_value((0, 0), Data::String("title".into()));
        let err = normalize(&range, 4).unwrap_err();
        assert!(matches!(
            err,
            LabelError::HeaderRowMissing {
                row: 4,
                rows_available: 2
            }
        ));
    }

    #[test]
    fn header_only_sheet_yields_no_records() {
        let range = sheet(4, &[]);
        let sheet = normalize(&range, 4).unwrap();
        assert!(sheet.records.is_empty());
        assert_eq!(sheet.columns.len(), 9);
    }

    #[test]
    fn error_cells_are_empty() {
        assert_eq!(cell_value(&Data::Error(CellErrorType::NA)), FieldValue::Empty);
        assert_eq!(cell_value(&Data::Error(CellErrorType::Value)), FieldValue::Empty);
    }

    #[test]
    fn error_cell_under_aggregate_is_filled_from_above() {
        let mut rows = [
            row("L1", Some(100.0)),
            row("L2", None),
            row("L3", None),
            row("L4", None),
        ];
        rows[3][7] = Data::Error(CellErrorType::NA);
        let sheet = normalize(&sheet(4, &rows), 4).unwrap();
        assert_eq!(sheet.records[3].pallet_net_weight, FieldValue::Number(100.0));

        let summary = pallet_summary(&sheet.records[3], 1).unwrap();
        assert_eq!(summary.net, "Вес Нетто  -  100,0");
        assert_eq!(summary.gross, "Вес Брутто  -  0,0");
    }

    #[test]
    fn error_cell_in_lot_column_drops_the_row() {
        let mut rows = [row("L1", None), row("L2", None), row("L3", None)];
        rows[1][0] = Data::Error(CellErrorType::NA);
        let sheet = normalize(&sheet(4, &rows), 4).unwrap();
        let lots: Vec<String> = sheet.records.iter().map(|r| r.lot_number.to_string()).collect();
        assert_eq!(lots, ["L1", "L3"]);
    }

    #[test]
    fn native_date_cells_become_dates() {
        let value = cell_value(&Data::DateTimeIso("2024-05-01T00:00:00".into()));
        assert!(matches!(value, FieldValue::DateTime(_)));
        assert_eq!(value.to_string(), "01.05.2024");
    }
}
