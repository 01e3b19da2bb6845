//! Minimal WordprocessingML writer.
//!
//! Only the pieces a label needs: sized pages with margins, bold runs at a
//! fixed point size, aligned paragraphs with exact spacing, a borderless
//! fixed-width table and hard page breaks. XML is written by hand into a
//! `String` and packaged into a `.docx` zip with the `zip` crate.

use crate::error::LabelError;
use std::fmt::{self, Write as FmtWrite};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Twentieths of a point per millimetre.
const TWIPS_PER_MM: f64 = 1440.0 / 25.4;

/// Convert millimetres to twips, rounded to the nearest whole twip.
pub fn mm_to_twips(mm: f64) -> u32 {
    (mm * TWIPS_PER_MM).round() as u32
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// A run of text with uniform formatting. `\n` becomes a line break.
#[derive(Debug, Clone, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    /// Font size in points.
    pub size_pt: Option<f64>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn size(mut self, pt: f64) -> Self {
        self.size_pt = Some(pt);
        self
    }

    fn to_xml(&self, xml: &mut String) -> fmt::Result {
        xml.push_str("<w:r>");
        if self.bold || self.size_pt.is_some() {
            xml.push_str("<w:rPr>");
            if self.bold {
                xml.push_str("<w:b/><w:bCs/>");
            }
            if let Some(pt) = self.size_pt {
                let half_points = (pt * 2.0).round() as u32;
                write!(
                    xml,
                    "<w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/>"
                )?;
            }
            xml.push_str("</w:rPr>");
        }
        for (i, line) in self.text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<w:br/>");
            }
            if !line.is_empty() {
                write!(xml, "<w:t xml:space=\"preserve\">{}</w:t>", escape_xml(line))?;
            }
        }
        xml.push_str("</w:r>");
        Ok(())
    }
}

/// A paragraph: alignment, spacing and a sequence of runs.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub align: Option<Align>,
    /// Space before and after, in points.
    pub space_pt: Option<(f64, f64)>,
    /// Line spacing as a multiple of single spacing.
    pub line_spacing: Option<f64>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn space(mut self, before_pt: f64, after_pt: f64) -> Self {
        self.space_pt = Some((before_pt, after_pt));
        self
    }

    pub fn line_spacing(mut self, multiple: f64) -> Self {
        self.line_spacing = Some(multiple);
        self
    }

    fn to_xml(&self, xml: &mut String) -> fmt::Result {
        xml.push_str("<w:p>");
        if self.align.is_some() || self.space_pt.is_some() || self.line_spacing.is_some() {
            xml.push_str("<w:pPr>");
            if self.space_pt.is_some() || self.line_spacing.is_some() {
                xml.push_str("<w:spacing");
                if let Some((before, after)) = self.space_pt {
                    let before = (before * 20.0).round() as u32;
                    let after = (after * 20.0).round() as u32;
                    write!(xml, " w:before=\"{before}\" w:after=\"{after}\"")?;
                }
                if let Some(multiple) = self.line_spacing {
                    let line = (multiple * 240.0).round() as u32;
                    write!(xml, " w:line=\"{line}\" w:lineRule=\"auto\"")?;
                }
                xml.push_str("/>");
            }
            if let Some(align) = self.align {
                write!(xml, "<w:jc w:val=\"{}\"/>", align.as_str())?;
            }
            xml.push_str("</w:pPr>");
        }
        for run in &self.runs {
            run.to_xml(xml)?;
        }
        xml.push_str("</w:p>");
        Ok(())
    }
}

/// A single-row, borderless table with equal fixed-width columns.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub width_mm: f64,
    pub cells: Vec<Paragraph>,
}

impl TableRow {
    fn to_xml(&self, xml: &mut String) -> fmt::Result {
        let width = mm_to_twips(self.width_mm);
        let cols = self.cells.len().max(1) as u32;
        let col_width = width / cols;

        xml.push_str("<w:tbl><w:tblPr>");
        write!(xml, "<w:tblW w:w=\"{width}\" w:type=\"dxa\"/>")?;
        xml.push_str("<w:tblLayout w:type=\"fixed\"/>");
        xml.push_str("<w:tblCellMar><w:left w:w=\"0\" w:type=\"dxa\"/><w:right w:w=\"0\" w:type=\"dxa\"/></w:tblCellMar>");
        xml.push_str("</w:tblPr><w:tblGrid>");
        for _ in 0..cols {
            write!(xml, "<w:gridCol w:w=\"{col_width}\"/>")?;
        }
        xml.push_str("</w:tblGrid><w:tr>");
        for cell in &self.cells {
            xml.push_str("<w:tc><w:tcPr>");
            write!(xml, "<w:tcW w:w=\"{col_width}\" w:type=\"dxa\"/>")?;
            xml.push_str("</w:tcPr>");
            cell.to_xml(xml)?;
            xml.push_str("</w:tc>");
        }
        xml.push_str("</w:tr></w:tbl>");
        Ok(())
    }
}

/// Page size and margins, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_top_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
    pub margin_right_mm: f64,
}

impl PageSetup {
    fn to_xml(&self, xml: &mut String) -> fmt::Result {
        xml.push_str("<w:sectPr>");
        write!(
            xml,
            "<w:pgSz w:w=\"{}\" w:h=\"{}\"/>",
            mm_to_twips(self.width_mm),
            mm_to_twips(self.height_mm)
        )?;
        write!(
            xml,
            "<w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" w:header=\"0\" w:footer=\"0\" w:gutter=\"0\"/>",
            mm_to_twips(self.margin_top_mm),
            mm_to_twips(self.margin_right_mm),
            mm_to_twips(self.margin_bottom_mm),
            mm_to_twips(self.margin_left_mm)
        )?;
        xml.push_str("</w:sectPr>");
        Ok(())
    }
}

/// Accumulates body content for `word/document.xml`.
#[derive(Debug, Default)]
pub struct DocumentBody {
    xml: String,
    page_breaks: usize,
}

impl DocumentBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraph(&mut self, paragraph: &Paragraph) -> fmt::Result {
        paragraph.to_xml(&mut self.xml)
    }

    pub fn table_row(&mut self, row: &TableRow) -> fmt::Result {
        row.to_xml(&mut self.xml)
    }

    /// Append a paragraph holding only a hard page break.
    pub fn page_break(&mut self) {
        self.xml.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>");
        self.page_breaks += 1;
    }

    pub fn page_breaks(&self) -> usize {
        self.page_breaks
    }

    /// Wrap the body in a complete `document.xml` with a trailing section.
    pub fn into_document_xml(self, page: &PageSetup) -> Result<String, fmt::Error> {
        let mut xml = String::with_capacity(self.xml.len() + 512);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        write!(xml, "<w:document xmlns:w=\"{W_NS}\" xmlns:r=\"{R_NS}\"><w:body>")?;
        xml.push_str(&self.xml);
        page.to_xml(&mut xml)?;
        xml.push_str("</w:body></w:document>");
        Ok(xml)
    }
}

fn styles_xml(font: &str) -> String {
    let font = escape_xml(font);
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<w:styles xmlns:w=\"{W_NS}\">\
<w:docDefaults>\
<w:rPrDefault><w:rPr><w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\" w:eastAsia=\"{font}\"/>\
<w:sz w:val=\"22\"/><w:szCs w:val=\"22\"/><w:lang w:val=\"ru-RU\"/></w:rPr></w:rPrDefault>\
<w:pPrDefault><w:pPr><w:spacing w:before=\"0\" w:after=\"0\"/></w:pPr></w:pPrDefault>\
</w:docDefaults>\
<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/><w:qFormat/></w:style>\
<w:style w:type=\"table\" w:default=\"1\" w:styleId=\"TableNormal\"><w:name w:val=\"Normal Table\"/>\
<w:tblPr><w:tblInd w:w=\"0\" w:type=\"dxa\"/></w:tblPr></w:style>\
</w:styles>"
    )
}

const CONTENT_TYPES_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
</Types>";

const ROOT_RELS_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
</Relationships>";

const DOCUMENT_RELS_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
</Relationships>";

fn core_xml(title: &str) -> String {
    let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
<dc:title>{}</dc:title>\
<dcterms:created xsi:type=\"dcterms:W3CDTF\">{created}</dcterms:created>\
</cp:coreProperties>",
        escape_xml(title)
    )
}

/// Package a finished `document.xml` into `.docx` bytes.
pub fn package(document_xml: &str, default_font: &str, title: &str) -> Result<Vec<u8>, LabelError> {
    let build_err = |detail: String| LabelError::DocumentBuild {
        format: "Word",
        detail,
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let styles = styles_xml(default_font);
    let core = core_xml(title);
    let parts: [(&str, &str); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("word/document.xml", document_xml),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML),
        ("word/styles.xml", &styles),
        ("docProps/core.xml", &core),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)
            .map_err(|e| build_err(format!("{name}: {e}")))?;
        zip.write_all(content.as_bytes())
            .map_err(|e| build_err(format!("{name}: {e}")))?;
    }

    let cursor = zip.finish().map_err(|e| build_err(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn twips_for_label_geometry() {
        assert_eq!(mm_to_twips(150.0), 8504);
        assert_eq!(mm_to_twips(100.0), 5669);
        assert_eq!(mm_to_twips(10.0), 567);
        assert_eq!(mm_to_twips(12.0), 680);
    }

    #[test]
    fn run_writes_breaks_and_escapes() {
        let mut xml = String::new();
        Run::new("a & b\nc").bold().size(9.0).to_xml(&mut xml).unwrap();
        assert_eq!(
            xml,
            "<w:r><w:rPr><w:b/><w:bCs/><w:sz w:val=\"18\"/><w:szCs w:val=\"18\"/></w:rPr>\
<w:t xml:space=\"preserve\">a &amp; b</w:t><w:br/><w:t xml:space=\"preserve\">c</w:t></w:r>"
        );
    }

    #[test]
    fn paragraph_spacing_and_alignment() {
        let mut xml = String::new();
        Paragraph::new()
            .space(0.0, 0.0)
            .line_spacing(1.3)
            .align(Align::Center)
            .to_xml(&mut xml)
            .unwrap();
        assert!(xml.contains("w:before=\"0\" w:after=\"0\" w:line=\"312\" w:lineRule=\"auto\""));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
    }

    #[test]
    fn body_counts_page_breaks() {
        let mut body = DocumentBody::new();
        body.paragraph(&Paragraph::new().run(Run::new("one"))).unwrap();
        body.page_break();
        body.paragraph(&Paragraph::new().run(Run::new("two"))).unwrap();
        assert_eq!(body.page_breaks(), 1);

        let page = PageSetup {
            width_mm: 150.0,
            height_mm: 100.0,
            margin_top_mm: 10.0,
            margin_bottom_mm: 10.0,
            margin_left_mm: 12.0,
            margin_right_mm: 12.0,
        };
        let xml = body.into_document_xml(&page).unwrap();
        assert!(xml.contains("<w:pgSz w:w=\"8504\" w:h=\"5669\"/>"));
        assert!(xml.contains("w:left=\"680\""));
        assert!(xml.ends_with("</w:sectPr></w:body></w:document>"));
    }

    #[test]
    fn package_contains_required_parts() {
        let bytes = package("<w:document/>", "Arial", "Labels").unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "docProps/core.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing part {name}");
        }
        let mut doc = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut doc)
            .unwrap();
        assert_eq!(doc, "<w:document/>");
    }
}
