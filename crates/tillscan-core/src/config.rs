// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration.
//
// Every deployment-specific value (recognizer executable, language, detection
// thresholds) lives here instead of in code. The CLI starts from `Default`,
// optionally overlays a JSON file, then applies flags and environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TillscanError};
use crate::types::PageSegMode;

/// Pattern a recognized line must contain to count as a priced line item.
pub const DEFAULT_PRICE_PATTERN: &str = r"[0-9]+\.[0-9]+";

/// Settings for one receipt scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Height in pixels of the working copy handed to the region detector.
    pub working_height: u32,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Region detector settings.
    pub detection: DetectionConfig,
    /// Text recognizer settings.
    pub recognizer: RecognizerConfig,
    /// Regular expression selecting priced lines.
    pub price_pattern: String,
    /// Debug preview output.
    pub preview: PreviewConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            working_height: 800,
            approx_epsilon_ratio: 0.02,
            detection: DetectionConfig::default(),
            recognizer: RecognizerConfig::default(),
            price_pattern: DEFAULT_PRICE_PATTERN.to_string(),
            preview: PreviewConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.working_height == 0 {
            return Err(TillscanError::InvalidConfig(
                "working_height must be at least 1 pixel".into(),
            ));
        }
        if !(self.approx_epsilon_ratio > 0.0 && self.approx_epsilon_ratio < 1.0) {
            return Err(TillscanError::InvalidConfig(format!(
                "approx_epsilon_ratio must be in (0, 1), got {}",
                self.approx_epsilon_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.detection.min_confidence) {
            return Err(TillscanError::InvalidConfig(format!(
                "detection.min_confidence must be in [0, 1], got {}",
                self.detection.min_confidence
            )));
        }
        if self.detection.max_candidates == 0 {
            return Err(TillscanError::InvalidConfig(
                "detection.max_candidates must be at least 1".into(),
            ));
        }
        if self.recognizer.language.trim().is_empty() {
            return Err(TillscanError::InvalidConfig(
                "recognizer.language must not be empty".into(),
            ));
        }
        if self.preview.width == 0 {
            return Err(TillscanError::InvalidConfig(
                "preview.width must be at least 1 pixel".into(),
            ));
        }
        Ok(())
    }
}

/// Region detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Contours reported below this confidence are discarded.
    pub min_confidence: f32,
    /// Gaussian blur sigma applied before binarization (built-in detector).
    pub blur_sigma: f32,
    /// Regions smaller than this fraction of the working image are ignored
    /// (built-in detector).
    pub min_area_fraction: f32,
    /// Upper bound on candidates handed to boundary selection (built-in
    /// detector).
    pub max_candidates: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            blur_sigma: 2.0,
            min_area_fraction: 0.05,
            max_candidates: 5,
        }
    }
}

/// Text recognizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Tesseract executable; a bare name is resolved through `PATH`.
    pub executable: PathBuf,
    /// Tesseract language code (`-l`).
    pub language: String,
    /// Page-segmentation hint (`--psm`).
    pub page_seg_mode: PageSegMode,
    /// Optional `--tessdata-dir`.
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_seg_mode: PageSegMode::SINGLE_COLUMN,
            tessdata_dir: None,
        }
    }
}

/// Where and how to write intermediate images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    /// Width the rectified receipt preview is resized to.
    pub width: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("tillscan-debug"),
            width: 500,
        }
    }
}
