//! CLI binary for pallet-labels.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `LabelConfig`, renders the requested formats and writes them to disk.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pallet_labels::{
    inspect, load_records, render, write_document, AssetWarning, LabelConfig, OutputFormat,
    ProgressCallback, RenderProgressCallback, RenderStats,
};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per rendered document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold:>5}  [{bar:42.green/238}] {pos:>4}/{len} labels  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_render_start(&self, format: OutputFormat, total_labels: usize) {
        self.bar.set_length(total_labels as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(format.to_string());
    }

    fn on_label_rendered(&self, _index: usize, _total_labels: usize) {
        self.bar.inc(1);
    }

    fn on_pallet_summary(&self, pallet_no: usize) {
        self.bar.set_message(format!("pallet {pallet_no:02}"));
    }

    fn on_render_complete(&self, _format: OutputFormat, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Both documents into the current directory
  labelgen shipment.xlsx

  # PDF only, fonts and logos from ./assets, into ./out
  labelgen --format pdf --assets-dir assets -o out shipment.xlsx

  # Check what the sheet contains without rendering
  labelgen --inspect-only shipment.xlsx

  # Machine-readable summary
  labelgen --json shipment.xlsx > result.json

INPUT SHEET:
  First worksheet, column headers on row 5 (index 4). Required columns:
    Номер Партии, BRIX, PH, Нетто соуса, Брутто бочек,
    Дата Производства, Годен до
  Optional pallet columns (written once per pallet, filled downwards):
    Нетто соуса на паллете, Брутто паллета

OPTIONAL ASSETS (looked up in --assets-dir):
  Arial.ttf, Arial-Bold.ttf      embedded in the PDF; without them the PDF
                                 falls back to Helvetica (no Cyrillic)
  logo_right.png, logo_left.png  drawn in the PDF footer when present

ENVIRONMENT VARIABLES:
  RUST_LOG                Override the log filter (e.g. pallet_labels=debug)
  LABELGEN_*              Every flag can be set via its LABELGEN_ variable
"#;

/// Generate 150×100 mm barrel labels (DOCX and PDF) from a production sheet.
#[derive(Parser, Debug)]
#[command(
    name = "labelgen",
    version,
    about = "Generate 150×100 mm barrel labels (DOCX and PDF) from a production sheet",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input `.xlsx` workbook.
    input: PathBuf,

    /// Which documents to produce.
    #[arg(long, env = "LABELGEN_FORMAT", value_enum, default_value = "both")]
    format: FormatArg,

    /// Directory to write Labels.docx / Labels.pdf into.
    #[arg(short, long, env = "LABELGEN_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Directory holding the optional fonts and logos.
    #[arg(long, env = "LABELGEN_ASSETS_DIR", default_value = ".")]
    assets_dir: PathBuf,

    /// 0-based row index of the column headers.
    #[arg(long, env = "LABELGEN_HEADER_ROW", default_value_t = 4)]
    header_row: usize,

    /// Barrels per pallet; a summary page follows every full pallet.
    #[arg(long, env = "LABELGEN_PALLET_SIZE", default_value_t = 4,
          value_parser = clap::value_parser!(u16).range(1..))]
    pallet_size: u16,

    /// Leave PDF streams uncompressed (for debugging layouts).
    #[arg(long, env = "LABELGEN_NO_COMPRESS")]
    no_compress: bool,

    /// Print a summary of the sheet only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Output a JSON summary instead of human-readable lines.
    #[arg(long, env = "LABELGEN_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "LABELGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LABELGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LABELGEN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Pdf,
    Word,
    Both,
}

impl FormatArg {
    fn formats(self) -> &'static [OutputFormat] {
        match self {
            FormatArg::Pdf => &[OutputFormat::Pdf],
            FormatArg::Word => &[OutputFormat::Word],
            FormatArg::Both => &[OutputFormat::Word, OutputFormat::Pdf],
        }
    }
}

/// One written document, as reported by `--json`.
#[derive(Serialize)]
struct Artifact {
    format: OutputFormat,
    path: PathBuf,
    stats: RenderStats,
    warnings: Vec<AssetWarning>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(&cli.input, &config).context("Failed to inspect workbook")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        } else {
            println!("File:            {}", cli.input.display());
            println!("Header row:      {}", summary.header_row);
            println!("Columns:         {}", summary.columns.join(", "));
            println!("Records:         {}", summary.records);
            println!("Full pallets:    {}", summary.full_pallets);
            println!("Partial pallet:  {} records", summary.partial_pallet_records);
        }
        return Ok(());
    }

    // ── Load once, render each format ────────────────────────────────────
    let records = load_records(&cli.input, &config)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;

    let mut artifacts = Vec::new();
    for &format in cli.format.formats() {
        let mut format_config = config.clone();
        if show_progress {
            let cb = CliProgressCallback::new();
            format_config.progress_callback = Some(cb as ProgressCallback);
        }

        let document = render(&records, format, &format_config)
            .with_context(|| format!("Failed to render {format} labels"))?;
        let path = cli.output_dir.join(document.file_name());
        write_document(&document, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        if !cli.quiet && !cli.json {
            eprintln!(
                "{}  {:<5} {} pages  {}  {}",
                green("✔"),
                format.to_string(),
                document.stats.total_pages,
                dim(&format!("{}ms", document.stats.duration_ms)),
                bold(&path.display().to_string()),
            );
            for warning in &document.warnings {
                eprintln!("   {} {}", yellow("⚠"), warning);
            }
        }

        artifacts.push(Artifact {
            format,
            path,
            stats: document.stats,
            warnings: document.warnings,
        });
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&artifacts).context("Failed to serialise output")?
        );
    }

    Ok(())
}

/// Map CLI args to `LabelConfig`.
fn build_config(cli: &Cli) -> Result<LabelConfig> {
    LabelConfig::builder()
        .header_row(cli.header_row)
        .pallet_size(usize::from(cli.pallet_size))
        .assets_dir(&cli.assets_dir)
        .compress_pdf(!cli.no_compress)
        .build()
        .context("Invalid configuration")
}
