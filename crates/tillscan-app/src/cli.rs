// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their merge onto `ScanConfig`.
//
// Precedence, lowest first: built-in defaults, the `--config` JSON file, then
// flags and their environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tillscan_core::{PageSegMode, ScanConfig};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Built-in detector, English receipt
  tillscan -i receipt.jpg

  # Russian receipt, contours from a segmentation model, write previews
  tillscan -i receipt.jpg -l rus --contours regions.json -d

  # Machine-readable output
  tillscan -i receipt.jpg --json > receipt.json

CONTOUR FILE FORMAT:
  [{"confidence": 0.93, "points": [[12, 8], [410, 15], [402, 790], [5, 781]]}, ...]
  Coordinates are in the working image (scaled to --working-height rows).
"#;

/// Find the receipt in a photo, flatten it, and list its priced line items.
#[derive(Parser, Debug)]
#[command(
    name = "tillscan",
    version,
    about = "Find the receipt in a photo, flatten it, and list its priced line items",
    after_long_help = AFTER_HELP
)]
pub struct Cli {
    /// Receipt photograph.
    #[arg(short, long)]
    pub image: PathBuf,

    /// Write intermediate previews (outline and flattened receipt).
    #[arg(short, long, env = "TILLSCAN_DEBUG")]
    pub debug: bool,

    /// Directory for previews [default: tillscan-debug].
    #[arg(long, env = "TILLSCAN_PREVIEW_DIR")]
    pub preview_dir: Option<PathBuf>,

    /// JSON contours exported by an external segmentation model.
    #[arg(long, env = "TILLSCAN_CONTOURS")]
    pub contours: Option<PathBuf>,

    /// Confidence threshold for contours from --contours [default: 0.6].
    #[arg(long, env = "TILLSCAN_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// Tesseract executable [default: tesseract].
    #[arg(long, env = "TILLSCAN_TESSERACT")]
    pub tesseract: Option<PathBuf>,

    /// Tesseract language data directory.
    #[arg(long, env = "TILLSCAN_TESSDATA")]
    pub tessdata_dir: Option<PathBuf>,

    /// Recognition language [default: eng].
    #[arg(short, long, env = "TILLSCAN_LANG")]
    pub lang: Option<String>,

    /// Tesseract page-segmentation mode, 0-13 [default: 4].
    #[arg(long, env = "TILLSCAN_PSM", value_parser = clap::value_parser!(u8).range(0..=13))]
    pub psm: Option<u8>,

    /// Height in pixels of the working copy used for detection [default: 800].
    #[arg(long, env = "TILLSCAN_WORKING_HEIGHT")]
    pub working_height: Option<u32>,

    /// JSON scan configuration; flags override its values.
    #[arg(long, env = "TILLSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the ocrs detection and recognition models; selects
    /// the built-in ocrs recognizer instead of tesseract.
    #[cfg(feature = "ocrs")]
    #[arg(long, env = "TILLSCAN_OCRS_MODELS")]
    pub ocrs_models: Option<PathBuf>,

    /// Call libtesseract in-process instead of running the executable.
    #[cfg(feature = "leptess")]
    #[arg(long, env = "TILLSCAN_LIBTESSERACT")]
    pub libtesseract: bool,

    /// Emit a JSON report instead of text sections.
    #[arg(long)]
    pub json: bool,

    /// Debug-level logging.
    #[arg(short, long, env = "TILLSCAN_VERBOSE")]
    pub verbose: bool,
}

impl Cli {
    /// Build the effective configuration.
    pub fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ScanConfig::default(),
        };

        if self.debug {
            config.preview.enabled = true;
        }
        if let Some(dir) = &self.preview_dir {
            config.preview.directory = dir.clone();
        }
        if let Some(min) = self.min_confidence {
            config.detection.min_confidence = min;
        }
        if let Some(exe) = &self.tesseract {
            config.recognizer.executable = exe.clone();
        }
        if let Some(dir) = &self.tessdata_dir {
            config.recognizer.tessdata_dir = Some(dir.clone());
        }
        if let Some(lang) = &self.lang {
            config.recognizer.language = lang.clone();
        }
        if let Some(psm) = self.psm {
            config.recognizer.page_seg_mode = PageSegMode::new(psm)?;
        }
        if let Some(height) = self.working_height {
            config.working_height = height;
        }

        config.validate()?;
        Ok(config)
    }
}
