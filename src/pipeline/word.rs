//! Word label renderer: one 150×100 mm page per record.

use crate::config::LabelConfig;
use crate::error::LabelError;
use crate::output::{LabelDocument, OutputFormat, RenderStats};
use crate::pipeline::docx::{Align, DocumentBody, PageSetup, Paragraph, Run, TableRow};
use crate::pipeline::fields::fact_lines;
use crate::record::LabelRecord;
use crate::text;
use std::time::Instant;
use tracing::{debug, info};

/// Label page geometry.
pub const PAGE: PageSetup = PageSetup {
    width_mm: 150.0,
    height_mm: 100.0,
    margin_top_mm: 10.0,
    margin_bottom_mm: 10.0,
    margin_left_mm: 12.0,
    margin_right_mm: 12.0,
};

/// Width of the header table, i.e. the text area between the side margins.
const HEADER_TABLE_WIDTH_MM: f64 = 126.0;

const DEFAULT_FONT: &str = "Arial";
const LINE_SPACING: f64 = 1.3;
const TITLE_PT: f64 = 8.0;
const NOTE_PT: f64 = 6.0;
const FACT_PT: f64 = 11.0;
const LEGAL_PT: f64 = 9.0;

fn xml_err(_: std::fmt::Error) -> LabelError {
    LabelError::DocumentBuild {
        format: "Word",
        detail: "failed to format document XML".into(),
    }
}

fn header_row() -> TableRow {
    TableRow {
        width_mm: HEADER_TABLE_WIDTH_MM,
        cells: vec![
            Paragraph::new(),
            Paragraph::new()
                .align(Align::Center)
                .run(Run::new(text::PRODUCT_TITLE).bold().size(TITLE_PT)),
            Paragraph::new()
                .align(Align::Right)
                .run(Run::new(text::PASTEURISED_NOTE).bold().size(NOTE_PT)),
        ],
    }
}

fn legal_paragraph() -> Paragraph {
    let block: String = text::word_legal_lines()
        .flat_map(|line| [line, "\n"])
        .collect();
    Paragraph::new()
        .line_spacing(LINE_SPACING)
        .run(Run::new(block).size(LEGAL_PT))
        .run(Run::new(text::ORIGIN_STATEMENT).bold().size(LEGAL_PT))
}

/// Append one label page for `record` to `body`.
fn write_label(body: &mut DocumentBody, record: &LabelRecord) -> Result<(), LabelError> {
    let facts = fact_lines(record)?;

    body.table_row(&header_row()).map_err(xml_err)?;
    for line in facts.iter() {
        let paragraph = Paragraph::new()
            .space(0.0, 0.0)
            .line_spacing(LINE_SPACING)
            .run(Run::new(line).bold().size(FACT_PT));
        body.paragraph(&paragraph).map_err(xml_err)?;
    }
    body.paragraph(&legal_paragraph()).map_err(xml_err)?;
    Ok(())
}

/// Render all records into a `.docx` document held in memory.
///
/// Every record starts on a new page; no break precedes the first one.
pub fn render_word(records: &[LabelRecord], config: &LabelConfig) -> Result<LabelDocument, LabelError> {
    let started = Instant::now();
    let total = records.len();
    let progress = config.progress_callback.as_ref();

    if let Some(cb) = progress {
        cb.on_render_start(OutputFormat::Word, total);
    }

    let mut body = DocumentBody::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            body.page_break();
        }
        write_label(&mut body, record)?;
        debug!("Word label {}/{} (lot {})", i + 1, total, record.lot_number);
        if let Some(cb) = progress {
            cb.on_label_rendered(i, total);
        }
    }

    let page_breaks = body.page_breaks();
    let document_xml = body.into_document_xml(&PAGE).map_err(xml_err)?;
    let bytes = crate::pipeline::docx::package(&document_xml, DEFAULT_FONT, "Labels")?;

    let stats = RenderStats {
        labels: total,
        pallet_pages: 0,
        total_pages: page_breaks + usize::from(total > 0),
        duration_ms: started.elapsed().as_millis() as u64,
    };

    if let Some(cb) = progress {
        cb.on_render_complete(OutputFormat::Word, stats.total_pages);
    }
    info!(
        "Word document: {} labels, {} bytes in {}ms",
        total,
        bytes.len(),
        stats.duration_ms
    );

    Ok(LabelDocument {
        format: OutputFormat::Word,
        bytes,
        stats,
        warnings: Vec::new(),
    })
}
