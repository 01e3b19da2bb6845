//! PDF fonts: an embedded TrueType pair, or the built-in Helvetica pair.
//!
//! TrueType faces are embedded whole as `CIDFontType2` fonts under a `Type0`
//! wrapper with `Identity-H` encoding, so any glyph the face carries
//! (Cyrillic included) can be shown. Only glyphs actually drawn get width
//! and `ToUnicode` entries.
//!
//! The built-in fallback uses `WinAnsiEncoding`. Characters outside it are
//! drawn as `?`.

use crate::config::LabelConfig;
use crate::error::{AssetWarning, LabelError};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Filter, Finish, Name, Pdf, Rect, Ref, Str};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const IDENTITY: SystemInfo = SystemInfo {
    registry: Str(b"Adobe"),
    ordering: Str(b"Identity"),
    supplement: 0,
};

/// Helvetica advance widths for WinAnsi codes 32..=126, per 1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for WinAnsi codes 32..=126, per 1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width used for WinAnsi codes above 126.
const BUILTIN_DEFAULT_WIDTH: u16 = 556;

/// Hands out consecutive PDF object ids.
#[derive(Debug)]
pub struct RefAlloc {
    next: i32,
}

impl RefAlloc {
    pub fn new(first: i32) -> Self {
        Self { next: first }
    }

    pub fn bump(&mut self) -> Ref {
        let id = Ref::new(self.next);
        self.next += 1;
        id
    }
}

/// One of the two built-in faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFont {
    pub fn base_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            BuiltinFont::Helvetica => &HELVETICA_WIDTHS,
            BuiltinFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    /// WinAnsi byte for `c`. Latin-1 maps directly; anything else is `?`.
    fn code(c: char) -> u8 {
        match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            _ => b'?',
        }
    }

    fn code_width(self, code: u8) -> u16 {
        match code {
            32..=126 => self.widths()[(code - 32) as usize],
            _ => BUILTIN_DEFAULT_WIDTH,
        }
    }
}

/// A TrueType face to be embedded.
pub struct TrueTypeFont {
    data: Vec<u8>,
    base_name: String,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    cap_height: f32,
    bbox: Rect,
    /// Glyph id and advance per character seen so far.
    glyphs: HashMap<char, (u16, u16)>,
    /// Glyphs drawn, for `W` and `ToUnicode`.
    used: BTreeMap<u16, char>,
}

impl std::fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("base_name", &self.base_name)
            .field("bytes", &self.data.len())
            .field("used_glyphs", &self.used.len())
            .finish()
    }
}

impl TrueTypeFont {
    /// Read and validate a TrueType file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = std::fs::read(path).map_err(|e| e.to_string())?;
        Self::from_bytes(data, &base_name_for(path))
    }

    pub fn from_bytes(data: Vec<u8>, base_name: &str) -> Result<Self, String> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| e.to_string())?;
        let units_per_em = f32::from(face.units_per_em());
        let scale = |v: i16| f32::from(v) * 1000.0 / units_per_em;
        let bb = face.global_bounding_box();
        let ascender = scale(face.ascender());
        let descender = scale(face.descender());
        let cap_height = face.capital_height().map(scale).unwrap_or(ascender);
        let bbox = Rect::new(
            scale(bb.x_min),
            scale(bb.y_min),
            scale(bb.x_max),
            scale(bb.y_max),
        );
        drop(face);

        Ok(Self {
            data,
            base_name: base_name.to_string(),
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox,
            glyphs: HashMap::new(),
            used: BTreeMap::new(),
        })
    }

    /// Glyph id and advance for `c`, looked up once and cached.
    fn glyph(&mut self, c: char) -> (u16, u16) {
        if let Some(g) = self.glyphs.get(&c) {
            return *g;
        }
        let g = match ttf_parser::Face::parse(&self.data, 0) {
            Ok(face) => {
                let id = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
                (id.0, face.glyph_hor_advance(id).unwrap_or(0))
            }
            Err(_) => (0, 0),
        };
        self.glyphs.insert(c, g);
        g
    }

    fn pdf_width(&self, advance: u16) -> f32 {
        f32::from(advance) * 1000.0 / self.units_per_em
    }
}

/// A font as used by the page renderer.
#[derive(Debug)]
pub enum PdfFont {
    TrueType(Box<TrueTypeFont>),
    Builtin(BuiltinFont),
}

impl PdfFont {
    /// Encode `text` into the byte string shown with `Tj`, recording glyph use.
    pub fn encode(&mut self, text: &str) -> Vec<u8> {
        match self {
            PdfFont::Builtin(_) => text.chars().map(BuiltinFont::code).collect(),
            PdfFont::TrueType(font) => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    let (gid, _) = font.glyph(c);
                    font.used.entry(gid).or_insert(c);
                    out.extend_from_slice(&gid.to_be_bytes());
                }
                out
            }
        }
    }

    /// Width of `text` in points at `size`.
    pub fn text_width(&mut self, text: &str, size: f32) -> f32 {
        let units: f32 = match self {
            PdfFont::Builtin(b) => text
                .chars()
                .map(|c| f32::from(b.code_width(BuiltinFont::code(c))))
                .sum(),
            PdfFont::TrueType(font) => text
                .chars()
                .map(|c| {
                    let (_, advance) = font.glyph(c);
                    font.pdf_width(advance)
                })
                .sum(),
        };
        units * size / 1000.0
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, PdfFont::Builtin(_))
    }

    /// Write the font dictionary (and, for TrueType, its descendants) at `id`.
    pub fn write(
        &self,
        pdf: &mut Pdf,
        id: Ref,
        refs: &mut RefAlloc,
        compress: bool,
    ) -> Result<(), LabelError> {
        match self {
            PdfFont::Builtin(b) => {
                pdf.type1_font(id)
                    .base_font(Name(b.base_name().as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                Ok(())
            }
            PdfFont::TrueType(font) => write_truetype(pdf, id, refs, font, compress),
        }
    }
}

fn write_truetype(
    pdf: &mut Pdf,
    id: Ref,
    refs: &mut RefAlloc,
    font: &TrueTypeFont,
    compress: bool,
) -> Result<(), LabelError> {
    let cid_id = refs.bump();
    let descriptor_id = refs.bump();
    let file_id = refs.bump();
    let cmap_id = refs.bump();
    let base = Name(font.base_name.as_bytes());

    pdf.type0_font(id)
        .base_font(base)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_id)
        .to_unicode(cmap_id);

    let mut cid = pdf.cid_font(cid_id);
    cid.subtype(CidFontType::Type2);
    cid.base_font(base);
    cid.system_info(IDENTITY);
    cid.font_descriptor(descriptor_id);
    cid.default_width(0.0);
    cid.cid_to_gid_map_predefined(Name(b"Identity"));
    {
        let mut widths = cid.widths();
        for (&gid, &c) in &font.used {
            let advance = font.glyphs.get(&c).map(|g| g.1).unwrap_or(0);
            widths.consecutive(gid, [font.pdf_width(advance)]);
        }
    }
    cid.finish();

    pdf.font_descriptor(descriptor_id)
        .name(base)
        .flags(FontFlags::NON_SYMBOLIC)
        .bbox(font.bbox)
        .italic_angle(0.0)
        .ascent(font.ascender)
        .descent(font.descender)
        .cap_height(font.cap_height)
        .stem_v(80.0)
        .font_file2(file_id);

    if compress {
        pdf.stream(file_id, &deflate(&font.data)?)
            .filter(Filter::FlateDecode)
            .pair(Name(b"Length1"), font.data.len() as i32);
    } else {
        pdf.stream(file_id, &font.data)
            .pair(Name(b"Length1"), font.data.len() as i32);
    }

    let mut cmap = UnicodeCmap::new(Name(b"Custom"), IDENTITY);
    for (&gid, &c) in &font.used {
        cmap.pair(gid, c);
    }
    pdf.stream(cmap_id, &cmap.finish());
    Ok(())
}

/// Zlib-compress a stream body.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>, LabelError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| LabelError::DocumentBuild {
            format: "PDF",
            detail: format!("stream compression failed: {e}"),
        })
}

/// PostScript-safe font name derived from the file stem.
fn base_name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        name
    }
}

/// The regular and bold faces used by one render.
#[derive(Debug)]
pub struct FontPair {
    pub regular: PdfFont,
    pub bold: PdfFont,
}

/// Load the configured TrueType pair, or fall back to Helvetica for both.
///
/// A failure on either face switches both to the built-in fonts so regular
/// and bold text always match.
pub fn load_fonts(config: &LabelConfig) -> (FontPair, Option<AssetWarning>) {
    let regular_path = config.asset_path(&config.regular_font);
    let bold_path = config.asset_path(&config.bold_font);

    let load = |path: &PathBuf| TrueTypeFont::load(path).map_err(|e| (path.clone(), e));

    match load(&regular_path).and_then(|r| load(&bold_path).map(|b| (r, b))) {
        Ok((regular, bold)) => {
            debug!(
                "Embedding fonts {} / {}",
                regular_path.display(),
                bold_path.display()
            );
            (
                FontPair {
                    regular: PdfFont::TrueType(Box::new(regular)),
                    bold: PdfFont::TrueType(Box::new(bold)),
                },
                None,
            )
        }
        Err((path, detail)) => {
            let warning = AssetWarning::FontFallback { path, detail };
            warn!("{warning}");
            (
                FontPair {
                    regular: PdfFont::Builtin(BuiltinFont::Helvetica),
                    bold: PdfFont::Builtin(BuiltinFont::HelveticaBold),
                },
                Some(warning),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A common system face, used when present.
    const SYSTEM_TTF: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    #[test]
    fn builtin_width_of_ascii() {
        let mut font = PdfFont::Builtin(BuiltinFont::Helvetica);
        // "AB" = 667 + 667
        assert!((font.text_width("AB", 10.0) - 13.34).abs() < 1e-3);
        let mut bold = PdfFont::Builtin(BuiltinFont::HelveticaBold);
        assert!((bold.text_width("A", 1000.0) - 722.0).abs() < 1e-3);
    }

    #[test]
    fn builtin_encoding_replaces_cyrillic() {
        let mut font = PdfFont::Builtin(BuiltinFont::Helvetica);
        assert_eq!(font.encode("PH: 4.10"), b"PH: 4.10");
        assert_eq!(font.encode("ПИ"), b"??");
        assert_eq!(font.encode("°"), vec![0xB0]);
    }

    #[test]
    fn missing_fonts_fall_back_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let config = LabelConfig::builder().assets_dir(dir.path()).build().unwrap();
        let (fonts, warning) = load_fonts(&config);
        assert!(fonts.regular.is_builtin());
        assert!(fonts.bold.is_builtin());
        match warning {
            Some(AssetWarning::FontFallback { path, .. }) => {
                assert!(path.ends_with("Arial.ttf"));
            }
            other => panic!("expected font fallback, got {other:?}"),
        }
    }

    #[test]
    fn garbage_font_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Arial.ttf"), b"not a font").unwrap();
        std::fs::write(dir.path().join("Arial-Bold.ttf"), b"not a font").unwrap();
        let config = LabelConfig::builder().assets_dir(dir.path()).build().unwrap();
        let (fonts, warning) = load_fonts(&config);
        assert!(fonts.regular.is_builtin());
        assert!(warning.is_some());
    }

    #[test]
    fn truetype_encodes_two_byte_glyph_ids() {
        let Ok(data) = std::fs::read(SYSTEM_TTF) else {
            eprintln!("skipping: {SYSTEM_TTF} not available");
            return;
        };
        let font = TrueTypeFont::from_bytes(data, "DejaVuSans").unwrap();
        let mut font = PdfFont::TrueType(Box::new(font));
        let bytes = font.encode("ПА");
        assert_eq!(bytes.len(), 4);
        assert_ne!(&bytes[..2], &[0, 0]);
        assert!(font.text_width("ПА", 10.0) > 0.0);
    }

    #[test]
    fn base_name_is_postscript_safe() {
        assert_eq!(base_name_for(Path::new("fonts/Arial-Bold.ttf")), "Arial-Bold");
        assert_eq!(base_name_for(Path::new("My Font.ttf")), "MyFont");
        assert_eq!(base_name_for(Path::new(".ttf")), "ttf");
    }

    #[test]
    fn deflate_round_trips_through_zlib() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let data = b"BT /F1 10 Tf 14.17 260 Td (PH: 4.20) Tj ET".repeat(20);
        let packed = deflate(&data).unwrap();
        assert!(packed.len() < data.len());
        let mut unpacked = Vec::new();
        ZlibDecoder::new(packed.as_slice())
            .read_to_end(&mut unpacked)
            .unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn ref_alloc_is_sequential() {
        let mut refs = RefAlloc::new(5);
        assert_eq!(refs.bump(), Ref::new(5));
        assert_eq!(refs.bump(), Ref::new(6));
    }
}
