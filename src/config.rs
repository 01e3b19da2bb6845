//! Configuration types for label generation.
//!
//! All behaviour that is not fixed by the label layout itself is controlled
//! through [`LabelConfig`], built via its [`LabelConfigBuilder`]: where the
//! header row sits in the sheet, how many barrels make a pallet, and where the
//! optional fonts and logos live.

use crate::error::LabelError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for loading records and rendering labels.
///
/// Built via [`LabelConfig::builder()`] or using [`LabelConfig::default()`].
///
/// # Example
/// ```rust
/// use pallet_labels::LabelConfig;
///
/// let config = LabelConfig::builder()
///     .assets_dir("assets")
///     .pallet_size(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.header_row, 4);
/// ```
#[derive(Clone)]
pub struct LabelConfig {
    /// 0-based sheet row holding the column headers. Default: 4.
    ///
    /// The production sheets carry four rows of title block above the table.
    pub header_row: usize,

    /// Consecutive records per pallet. Default: 4.
    ///
    /// A pallet summary page follows every `pallet_size`-th label page in the
    /// PDF. A trailing group with fewer records gets no summary.
    pub pallet_size: usize,

    /// Directory the font and logo file names below are resolved against.
    /// Default: the current directory.
    pub assets_dir: PathBuf,

    /// Regular TrueType face for the PDF. Default: `Arial.ttf`.
    pub regular_font: PathBuf,

    /// Bold TrueType face for the PDF. Default: `Arial-Bold.ttf`.
    pub bold_font: PathBuf,

    /// Logo drawn flush to the right margin. Default: `logo_right.png`.
    pub right_logo: PathBuf,

    /// Logo drawn left of the right logo. Default: `logo_left.png`.
    pub left_logo: PathBuf,

    /// Flate-compress PDF content streams. Default: true.
    ///
    /// Turning this off leaves the drawing operators readable, which helps
    /// when debugging layout.
    pub compress_pdf: bool,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            header_row: 4,
            pallet_size: 4,
            assets_dir: PathBuf::from("."),
            regular_font: PathBuf::from("Arial.ttf"),
            bold_font: PathBuf::from("Arial-Bold.ttf"),
            right_logo: PathBuf::from("logo_right.png"),
            left_logo: PathBuf::from("logo_left.png"),
            compress_pdf: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for LabelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelConfig")
            .field("header_row", &self.header_row)
            .field("pallet_size", &self.pallet_size)
            .field("assets_dir", &self.assets_dir)
            .field("regular_font", &self.regular_font)
            .field("bold_font", &self.bold_font)
            .field("right_logo", &self.right_logo)
            .field("left_logo", &self.left_logo)
            .field("compress_pdf", &self.compress_pdf)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RenderProgressCallback>"),
            )
            .finish()
    }
}

impl LabelConfig {
    /// Create a new builder for `LabelConfig`.
    pub fn builder() -> LabelConfigBuilder {
        LabelConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve an asset file name against [`LabelConfig::assets_dir`].
    ///
    /// Absolute paths are returned unchanged.
    pub fn asset_path(&self, name: &Path) -> PathBuf {
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.assets_dir.join(name)
        }
    }
}

/// Builder for [`LabelConfig`].
pub struct LabelConfigBuilder {
    config: LabelConfig,
}

impl fmt::Debug for LabelConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl LabelConfigBuilder {
    pub fn header_row(mut self, row: usize) -> Self {
        self.config.header_row = row;
        self
    }

    pub fn pallet_size(mut self, n: usize) -> Self {
        self.config.pallet_size = n;
        self
    }

    pub fn assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.assets_dir = dir.into();
        self
    }

    pub fn regular_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.regular_font = path.into();
        self
    }

    pub fn bold_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.bold_font = path.into();
        self
    }

    pub fn right_logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.right_logo = path.into();
        self
    }

    pub fn left_logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.left_logo = path.into();
        self
    }

    pub fn compress_pdf(mut self, v: bool) -> Self {
        self.config.compress_pdf = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<LabelConfig, LabelError> {
        let c = &self.config;
        if c.pallet_size == 0 {
            return Err(LabelError::InvalidConfig(
                "Pallet size must be ≥ 1".into(),
            ));
        }
        for (what, path) in [
            ("regular font", &c.regular_font),
            ("bold font", &c.bold_font),
            ("right logo", &c.right_logo),
            ("left logo", &c.left_logo),
        ] {
            if path.as_os_str().is_empty() {
                return Err(LabelError::InvalidConfig(format!(
                    "{what} path must not be empty"
                )));
            }
        }
        Ok(self.config)
    }
}
