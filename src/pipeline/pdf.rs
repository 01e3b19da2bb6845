//! PDF label renderer.
//!
//! One 150×100 mm page per record, drawn in absolute coordinates from the
//! bottom-left corner, with a pallet summary page after every full pallet.
//! Fonts and logos are resolved once before the first page; the image
//! XObjects are written once and shared by every page.

use crate::config::LabelConfig;
use crate::error::{AssetWarning, LabelError};
use crate::output::{LabelDocument, OutputFormat, RenderStats};
use crate::pipeline::fields::{fact_lines, pallet_summary};
use crate::pipeline::fonts::{deflate, load_fonts, FontPair, PdfFont, RefAlloc};
use crate::pipeline::logos::{load_logos, LogoImage};
use crate::pipeline::pallet::{plan_pages, PagePlan};
use crate::record::LabelRecord;
use crate::text;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::time::Instant;
use tracing::{debug, info};

/// Millimetres to PDF points.
pub fn mm(v: f32) -> f32 {
    v * 72.0 / 25.4
}

const PAGE_WIDTH_MM: f32 = 150.0;
const PAGE_HEIGHT_MM: f32 = 100.0;
const MARGIN_X_MM: f32 = 5.0;
const MARGIN_TOP_MM: f32 = 7.0;

const TITLE_PT: f32 = 12.0;
const NOTE_PT: f32 = 10.0;
const FACT_PT: f32 = 10.0;
const LEGAL_PT: f32 = 10.0;
const LEGAL_LEADING: f32 = 13.0;
/// Gap between the last legal line and the origin statement, in points.
const ORIGIN_GAP: f32 = 3.0;

const LOGO_SIZE_MM: f32 = 10.0;
const LOGO_Y_MM: f32 = 3.0;
const LOGO_GAP_MM: f32 = 1.0;

const PALLET_TITLE_PT: f32 = 28.0;
const PALLET_WEIGHT_PT: f32 = 24.0;
const PALLET_TITLE_Y_MM: f32 = 75.0;
const PALLET_WEIGHT_X_MM: f32 = 25.0;
const PALLET_NET_Y_MM: f32 = 45.0;
const PALLET_GROSS_Y_MM: f32 = 20.0;

/// Fixed object ids; everything else is allocated from [`FIRST_FREE_ID`].
const CATALOG_ID: i32 = 1;
const PAGE_TREE_ID: i32 = 2;
const REGULAR_FONT_ID: i32 = 3;
const BOLD_FONT_ID: i32 = 4;
const INFO_ID: i32 = 5;
const FIRST_FREE_ID: i32 = 6;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");
const RIGHT_LOGO: Name<'static> = Name(b"Im1");
const LEFT_LOGO: Name<'static> = Name(b"Im2");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

/// Content stream under construction plus the fonts it measures with.
struct PageCanvas<'a> {
    content: Content,
    fonts: &'a mut FontPair,
}

impl<'a> PageCanvas<'a> {
    fn new(fonts: &'a mut FontPair) -> Self {
        Self {
            content: Content::new(),
            fonts,
        }
    }

    fn font(&mut self, face: Face) -> (&mut PdfFont, Name<'static>) {
        match face {
            Face::Regular => (&mut self.fonts.regular, REGULAR),
            Face::Bold => (&mut self.fonts.bold, BOLD),
        }
    }

    /// Draw `text` with its baseline starting at (`x`, `y`).
    fn text(&mut self, face: Face, size: f32, x: f32, y: f32, text: &str) {
        let (font, name) = self.font(face);
        let encoded = font.encode(text);
        self.content
            .begin_text()
            .set_font(name, size)
            .next_line(x, y)
            .show(Str(&encoded))
            .end_text();
    }

    fn centred(&mut self, face: Face, size: f32, centre_x: f32, y: f32, text: &str) {
        let width = self.font(face).0.text_width(text, size);
        self.text(face, size, centre_x - width / 2.0, y, text);
    }

    fn right_aligned(&mut self, face: Face, size: f32, right_x: f32, y: f32, text: &str) {
        let width = self.font(face).0.text_width(text, size);
        self.text(face, size, right_x - width, y, text);
    }

    fn rule(&mut self, x1: f32, x2: f32, y: f32) {
        self.content
            .set_line_width(1.0)
            .move_to(x1, y)
            .line_to(x2, y)
            .stroke();
    }

    /// Draw an image XObject scaled into the rectangle (`x`, `y`, `w`, `h`).
    fn image(&mut self, name: Name<'_>, (x, y, w, h): (f32, f32, f32, f32)) {
        self.content
            .save_state()
            .transform([w, 0.0, 0.0, h, x, y])
            .x_object(name)
            .restore_state();
    }

    fn finish(self, compress: bool) -> Result<Vec<u8>, LabelError> {
        let raw = self.content.finish();
        if compress {
            deflate(&raw)
        } else {
            Ok(raw.to_vec())
        }
    }
}

/// Logos written to the document, with the XObject each page references.
struct PlacedLogos<'a> {
    right: Option<(&'a LogoImage, Ref)>,
    left: Option<(&'a LogoImage, Ref)>,
}

fn write_logo(
    pdf: &mut Pdf,
    refs: &mut RefAlloc,
    logo: &LogoImage,
    compress: bool,
) -> Result<Ref, LabelError> {
    let id = refs.bump();
    let mask_id = logo.alpha.as_ref().map(|_| refs.bump());

    let data = logo.rgb_stream(compress)?;
    let mut image = pdf.image_xobject(id, &data);
    if compress {
        image.filter(Filter::FlateDecode);
    }
    image.width(logo.width as i32);
    image.height(logo.height as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    if let Some(mask_id) = mask_id {
        image.s_mask(mask_id);
    }
    image.finish();

    if let (Some(mask_id), Some(alpha)) = (mask_id, logo.alpha_stream(compress)?) {
        let mut mask = pdf.image_xobject(mask_id, &alpha);
        if compress {
            mask.filter(Filter::FlateDecode);
        }
        mask.width(logo.width as i32);
        mask.height(logo.height as i32);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        mask.finish();
    }
    Ok(id)
}

fn place_logo<'a>(
    pdf: &mut Pdf,
    refs: &mut RefAlloc,
    logo: Option<&'a LogoImage>,
    compress: bool,
) -> Result<Option<(&'a LogoImage, Ref)>, LabelError> {
    logo.map(|l| write_logo(pdf, refs, l, compress).map(|id| (l, id)))
        .transpose()
}

fn draw_label(
    canvas: &mut PageCanvas<'_>,
    record: &LabelRecord,
    logos: &PlacedLogos<'_>,
) -> Result<(), LabelError> {
    let width = mm(PAGE_WIDTH_MM);
    let height = mm(PAGE_HEIGHT_MM);
    let margin_x = mm(MARGIN_X_MM);
    let facts = fact_lines(record)?;

    let header_y = height - mm(MARGIN_TOP_MM);
    canvas.centred(Face::Bold, TITLE_PT, width / 2.0, header_y, text::PRODUCT_TITLE);
    canvas.right_aligned(
        Face::Bold,
        NOTE_PT,
        width - margin_x,
        header_y,
        text::PASTEURISED_NOTE,
    );

    let mut y = header_y - mm(5.0);
    for (i, line) in facts.iter().enumerate() {
        if i > 0 {
            y -= mm(4.0);
        }
        canvas.text(Face::Bold, FACT_PT, margin_x, y, line);
    }

    canvas.rule(margin_x, width - margin_x, y - mm(3.0));

    let mut line_y = y - mm(10.0);
    for line in text::pdf_legal_lines() {
        if !line.is_empty() {
            canvas.text(Face::Regular, LEGAL_PT, margin_x, line_y, line);
        }
        line_y -= LEGAL_LEADING;
    }
    canvas.text(
        Face::Bold,
        FACT_PT,
        margin_x,
        line_y - ORIGIN_GAP,
        text::ORIGIN_STATEMENT,
    );

    let logo_size = mm(LOGO_SIZE_MM);
    let logo_y = mm(LOGO_Y_MM);
    if let Some((logo, _)) = logos.right {
        let x = width - logo_size - margin_x;
        canvas.image(RIGHT_LOGO, logo.fit_in_square(x, logo_y, logo_size));
    }
    if let Some((logo, _)) = logos.left {
        let x = width - 2.0 * logo_size - margin_x - mm(LOGO_GAP_MM);
        canvas.image(LEFT_LOGO, logo.fit_in_square(x, logo_y, logo_size));
    }
    Ok(())
}

fn draw_pallet_summary(
    canvas: &mut PageCanvas<'_>,
    record: &LabelRecord,
    pallet_no: usize,
) -> Result<(), LabelError> {
    let summary = pallet_summary(record, pallet_no)?;
    canvas.centred(
        Face::Bold,
        PALLET_TITLE_PT,
        mm(PAGE_WIDTH_MM) / 2.0,
        mm(PALLET_TITLE_Y_MM),
        &summary.title,
    );
    let x = mm(PALLET_WEIGHT_X_MM);
    canvas.text(Face::Bold, PALLET_WEIGHT_PT, x, mm(PALLET_NET_Y_MM), &summary.net);
    canvas.text(Face::Bold, PALLET_WEIGHT_PT, x, mm(PALLET_GROSS_Y_MM), &summary.gross);
    Ok(())
}

/// Render all records, and a summary per full pallet, into a PDF in memory.
pub fn render_pdf(records: &[LabelRecord], config: &LabelConfig) -> Result<LabelDocument, LabelError> {
    let started = Instant::now();
    let total = records.len();
    let progress = config.progress_callback.as_ref();
    let compress = config.compress_pdf;

    let (mut fonts, font_warning) = load_fonts(config);
    let (logos, logo_warnings) = load_logos(config);
    let warnings: Vec<AssetWarning> = font_warning.into_iter().chain(logo_warnings).collect();

    if let Some(cb) = progress {
        cb.on_render_start(OutputFormat::Pdf, total);
    }

    let catalog_id = Ref::new(CATALOG_ID);
    let page_tree_id = Ref::new(PAGE_TREE_ID);
    let regular_font_id = Ref::new(REGULAR_FONT_ID);
    let bold_font_id = Ref::new(BOLD_FONT_ID);

    let mut pdf = Pdf::new();
    let mut refs = RefAlloc::new(FIRST_FREE_ID);

    let placed = PlacedLogos {
        right: place_logo(&mut pdf, &mut refs, logos.right.as_ref(), compress)?,
        left: place_logo(&mut pdf, &mut refs, logos.left.as_ref(), compress)?,
    };

    let plan = plan_pages(total, config.pallet_size);
    let mut page_ids = Vec::with_capacity(plan.len());
    let mut pallet_pages = 0usize;

    for page in &plan {
        let mut canvas = PageCanvas::new(&mut fonts);
        match *page {
            PagePlan::Label { record } => {
                draw_label(&mut canvas, &records[record], &placed)?;
            }
            PagePlan::PalletSummary { record, pallet } => {
                draw_pallet_summary(&mut canvas, &records[record], pallet)?;
            }
        }
        let content = canvas.finish(compress)?;

        let page_id = refs.bump();
        let content_id = refs.bump();
        let mut stream = pdf.stream(content_id, &content);
        if compress {
            stream.filter(Filter::FlateDecode);
        }
        stream.finish();

        let mut pdf_page = pdf.page(page_id);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, mm(PAGE_WIDTH_MM), mm(PAGE_HEIGHT_MM)))
            .parent(page_tree_id)
            .contents(content_id);
        let mut resources = pdf_page.resources();
        resources
            .fonts()
            .pair(REGULAR, regular_font_id)
            .pair(BOLD, bold_font_id);
        if matches!(page, PagePlan::Label { .. })
            && (placed.right.is_some() || placed.left.is_some())
        {
            let mut x_objects = resources.x_objects();
            if let Some((_, id)) = placed.right {
                x_objects.pair(RIGHT_LOGO, id);
            }
            if let Some((_, id)) = placed.left {
                x_objects.pair(LEFT_LOGO, id);
            }
        }
        resources.finish();
        pdf_page.finish();
        page_ids.push(page_id);

        match *page {
            PagePlan::Label { record } => {
                debug!("PDF label {}/{}", record + 1, total);
                if let Some(cb) = progress {
                    cb.on_label_rendered(record, total);
                }
            }
            PagePlan::PalletSummary { pallet, .. } => {
                pallet_pages += 1;
                debug!("PDF pallet summary {pallet:02}");
                if let Some(cb) = progress {
                    cb.on_pallet_summary(pallet);
                }
            }
        }
    }

    fonts.regular.write(&mut pdf, regular_font_id, &mut refs, compress)?;
    fonts.bold.write(&mut pdf, bold_font_id, &mut refs, compress)?;

    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.document_info(Ref::new(INFO_ID))
        .title(TextStr("Labels"))
        .producer(TextStr(concat!("pallet-labels ", env!("CARGO_PKG_VERSION"))));

    let bytes = pdf.finish();
    let stats = RenderStats {
        labels: total,
        pallet_pages,
        total_pages: page_ids.len(),
        duration_ms: started.elapsed().as_millis() as u64,
    };

    if let Some(cb) = progress {
        cb.on_render_complete(OutputFormat::Pdf, stats.total_pages);
    }
    info!(
        "PDF document: {} labels + {} pallet pages, {} bytes in {}ms",
        total,
        pallet_pages,
        bytes.len(),
        stats.duration_ms
    );

    Ok(LabelDocument {
        format: OutputFormat::Pdf,
        bytes,
        stats,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    fn record(i: usize) -> LabelRecord {
        LabelRecord {
            index: i,
            sheet_row: i + 6,
            lot_number: format!("L{i}").as_str().into(),
            brix: 28.0.into(),
            ph: 4.2.into(),
            net_weight: 25.0.into(),
            gross_weight: 27.5.into(),
            produced_on: "2024-08-01".into(),
            expires_on: "2025-08-01".into(),
            ..Default::default()
        }
    }

    fn plain_config(dir: &std::path::Path) -> LabelConfig {
        LabelConfig::builder()
            .assets_dir(dir)
            .compress_pdf(false)
            .build()
            .unwrap()
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    /// Numeric operands of every `op` in the uncompressed content streams.
    fn operands(bytes: &[u8], op: &str, arity: usize) -> Vec<Vec<f32>> {
        let text = String::from_utf8_lossy(bytes);
        let tokens: Vec<&str> = text.split_ascii_whitespace().collect();
        tokens
            .iter()
            .enumerate()
            .filter(|(i, t)| **t == op && *i >= arity)
            .filter_map(|(i, _)| {
                tokens[i - arity..i]
                    .iter()
                    .map(|t| t.parse::<f32>().ok())
                    .collect::<Option<Vec<f32>>>()
            })
            .collect()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    fn square_png(path: &std::path::Path) {
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn mm_conversion() {
        assert!((mm(25.4) - 72.0).abs() < 1e-4);
        assert!((mm(150.0) - 425.19685).abs() < 1e-3);
    }

    #[test]
    fn four_records_make_one_pallet() {
        let dir = tempfile::tempdir().unwrap();
        let mut records: Vec<_> = (0..4).map(record).collect();
        records[3].pallet_net_weight = 100.0.into();
        records[3].pallet_gross_weight = 110.0.into();

        let doc = render_pdf(&records, &plain_config(dir.path())).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-"));
        assert_eq!(doc.stats.labels, 4);
        assert_eq!(doc.stats.pallet_pages, 1);
        assert_eq!(doc.stats.total_pages, 5);
        assert!(contains(&doc.bytes, "-  100,0) Tj"));
        assert!(contains(&doc.bytes, "-  110,0) Tj"));
        assert!(contains(&doc.bytes, "/Count 5"));
    }

    #[test]
    fn partial_pallet_gets_no_summary() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<_> = (0..6).map(record).collect();
        let doc = render_pdf(&records, &plain_config(dir.path())).unwrap();
        assert_eq!(doc.stats.total_pages, 7);
        assert_eq!(doc.stats.pallet_pages, 1);
    }

    #[test]
    fn empty_aggregates_print_zero() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<_> = (0..4).map(record).collect();
        let doc = render_pdf(&records, &plain_config(dir.path())).unwrap();
        assert!(contains(&doc.bytes, "-  0,0) Tj"));
    }

    #[test]
    fn fact_lines_are_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render_pdf(&[record(0)], &plain_config(dir.path())).unwrap();
        assert!(contains(&doc.bytes, "BRIX: 28%  /  PH: 4.20"));
        assert!(contains(&doc.bytes, "01.08.2024"));
        assert!(contains(&doc.bytes, "/Helvetica-Bold"));
    }

    #[test]
    fn missing_assets_only_warn_about_fonts() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render_pdf(&[record(0)], &plain_config(dir.path())).unwrap();
        assert_eq!(doc.warnings.len(), 1);
        assert!(matches!(doc.warnings[0], AssetWarning::FontFallback { .. }));
        assert!(!contains(&doc.bytes, "/Im1"));
    }

    #[test]
    fn logo_is_shared_across_pages() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(8, 4, image::Rgba([0, 0, 0, 100]));
        img.save(dir.path().join("logo_right.png")).unwrap();

        let records: Vec<_> = (0..3).map(record).collect();
        let doc = render_pdf(&records, &plain_config(dir.path())).unwrap();
        assert!(contains(&doc.bytes, "/SMask"));
        assert_eq!(
            doc.bytes
                .windows(b"/Subtype /Image".len())
                .filter(|w| *w == b"/Subtype /Image")
                .count(),
            2,
            "one image plus its soft mask"
        );
        assert!(contains(&doc.bytes, "/Im1 Do"));
        assert!(!contains(&doc.bytes, "/Im2 Do"));
    }

    #[test]
    fn both_logos_sit_in_the_footer() {
        let dir = tempfile::tempdir().unwrap();
        square_png(&dir.path().join("logo_right.png"));
        square_png(&dir.path().join("logo_left.png"));

        let doc = render_pdf(&[record(0)], &plain_config(dir.path())).unwrap();
        assert!(doc.warnings.iter().all(|w| matches!(w, AssetWarning::FontFallback { .. })));
        assert!(contains(&doc.bytes, "/Im1 Do"));
        assert!(contains(&doc.bytes, "/Im2 Do"));

        let size = mm(10.0);
        let right_x = mm(150.0) - size - mm(5.0);
        let left_x = mm(150.0) - 2.0 * size - mm(5.0) - mm(1.0);
        let matrices = operands(&doc.bytes, "cm", 6);
        assert_eq!(matrices.len(), 2, "{matrices:?}");
        for (m, x) in matrices.iter().zip([right_x, left_x]) {
            assert!(close(m[0], size) && close(m[3], size), "{m:?}");
            assert_eq!((m[1], m[2]), (0.0, 0.0));
            assert!(close(m[4], x), "{m:?}, want x = {x}");
            assert!(close(m[5], mm(3.0)), "{m:?}");
        }
    }

    #[test]
    fn pallet_summary_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = LabelConfig::builder()
            .assets_dir(dir.path())
            .pallet_size(1)
            .compress_pdf(false)
            .build()
            .unwrap();
        let mut rec = record(0);
        rec.pallet_net_weight = 100.0.into();
        rec.pallet_gross_weight = 110.0.into();
        let doc = render_pdf(&[rec], &config).unwrap();
        assert_eq!(doc.stats.total_pages, 2);

        let offsets = operands(&doc.bytes, "Td", 2);
        let at = |x: f32, y: f32| offsets.iter().any(|o| close(o[0], x) && close(o[1], y));
        assert!(at(mm(25.0), mm(45.0)), "net line missing: {offsets:?}");
        assert!(at(mm(25.0), mm(20.0)), "gross line missing: {offsets:?}");

        let title = offsets
            .iter()
            .find(|o| close(o[1], mm(75.0)))
            .expect("pallet title line");
        let title_width = mm(150.0) - 2.0 * title[0];
        assert!(title[0] > 0.0 && title_width > 0.0, "title not centred: {title:?}");
        let sizes: Vec<f32> = operands(&doc.bytes, "Tf", 1).into_iter().map(|o| o[0]).collect();
        assert!(sizes.contains(&28.0) && sizes.contains(&24.0), "{sizes:?}");
    }

    #[test]
    fn label_header_and_facts_positions() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render_pdf(&[record(0)], &plain_config(dir.path())).unwrap();
        let offsets = operands(&doc.bytes, "Td", 2);
        let header_y = mm(100.0) - mm(7.0);
        let first_fact_y = header_y - mm(5.0);
        assert!(offsets.iter().any(|o| close(o[1], header_y)));
        for step in 0..3 {
            let y = first_fact_y - step as f32 * mm(4.0);
            assert!(
                offsets.iter().any(|o| close(o[0], mm(5.0)) && close(o[1], y)),
                "fact line {step} missing: {offsets:?}"
            );
        }
    }

    #[test]
    fn invalid_ph_aborts_render() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = record(0);
        bad.ph = FieldValue::Empty;
        let err = render_pdf(&[bad], &plain_config(dir.path())).unwrap_err();
        assert!(matches!(err, LabelError::InvalidNumber { .. }));
    }

    #[test]
    fn empty_input_gives_pageless_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render_pdf(&[], &plain_config(dir.path())).unwrap();
        assert_eq!(doc.stats.total_pages, 0);
        assert!(contains(&doc.bytes, "/Count 0"));
    }

    #[test]
    fn compressed_output_hides_operators() {
        let dir = tempfile::tempdir().unwrap();
        let config = LabelConfig::builder()
            .assets_dir(dir.path())
            .build()
            .unwrap();
        let doc = render_pdf(&[record(0)], &config).unwrap();
        assert!(contains(&doc.bytes, "/FlateDecode"));
        assert!(!contains(&doc.bytes, "BRIX: 28%"));
    }
}
