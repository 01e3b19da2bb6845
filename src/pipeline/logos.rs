//! Logo images for the PDF label footer.
//!
//! A logo that does not exist is simply not drawn. One that exists but does
//! not decode is skipped with an [`AssetWarning`].

use crate::config::LabelConfig;
use crate::error::{AssetWarning, LabelError};
use crate::pipeline::fonts::deflate;
use image::GenericImageView;
use std::path::Path;
use tracing::{debug, warn};

/// A decoded logo: 8-bit RGB samples plus an optional 8-bit alpha channel.
#[derive(Debug, Clone)]
pub struct LogoImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    /// Present only if some pixel is not fully opaque.
    pub alpha: Option<Vec<u8>>,
}

impl LogoImage {
    /// Decode any format `image` recognises from its contents.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err("image has no pixels".into());
        }

        let rgba = decoded.to_rgba8();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        let mut has_alpha = false;
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            if a != 255 {
                has_alpha = true;
            }
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        Ok(Self {
            width,
            height,
            rgb,
            alpha: has_alpha.then_some(alpha),
        })
    }

    /// Placement inside a `size`×`size` box at (`x`, `y`): scaled to fit with
    /// the aspect ratio kept, centred. Returns `(x, y, width, height)`.
    pub fn fit_in_square(&self, x: f32, y: f32, size: f32) -> (f32, f32, f32, f32) {
        let scale = (size / self.width as f32).min(size / self.height as f32);
        let w = self.width as f32 * scale;
        let h = self.height as f32 * scale;
        (x + (size - w) / 2.0, y + (size - h) / 2.0, w, h)
    }

    /// RGB samples, compressed when `compress` is set.
    pub fn rgb_stream(&self, compress: bool) -> Result<Vec<u8>, LabelError> {
        if compress {
            deflate(&self.rgb)
        } else {
            Ok(self.rgb.clone())
        }
    }

    pub fn alpha_stream(&self, compress: bool) -> Result<Option<Vec<u8>>, LabelError> {
        match &self.alpha {
            Some(a) if compress => deflate(a).map(Some),
            Some(a) => Ok(Some(a.clone())),
            None => Ok(None),
        }
    }
}

/// The two footer logos, each loaded if its file exists and decodes.
#[derive(Debug, Default)]
pub struct Logos {
    pub right: Option<LogoImage>,
    pub left: Option<LogoImage>,
}

fn load_one(path: &Path, warnings: &mut Vec<AssetWarning>) -> Option<LogoImage> {
    if !path.is_file() {
        debug!("Logo {} not present, skipping", path.display());
        return None;
    }
    let result = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| LogoImage::decode(&bytes));
    match result {
        Ok(logo) => {
            debug!(
                "Loaded logo {} ({}x{}, alpha: {})",
                path.display(),
                logo.width,
                logo.height,
                logo.alpha.is_some()
            );
            Some(logo)
        }
        Err(detail) => {
            let warning = AssetWarning::LogoUnreadable {
                path: path.to_path_buf(),
                detail,
            };
            warn!("{warning}");
            warnings.push(warning);
            None
        }
    }
}

/// Load both configured logos once per render.
pub fn load_logos(config: &LabelConfig) -> (Logos, Vec<AssetWarning>) {
    let mut warnings = Vec::new();
    let right = load_one(&config.asset_path(&config.right_logo), &mut warnings);
    let left = load_one(&config.asset_path(&config.left_logo), &mut warnings);
    (Logos { right, left }, warnings)
}
