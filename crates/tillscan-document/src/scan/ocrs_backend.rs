// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust text recognition backed by the `ocrs` engine and `rten` models.
//
// # Feature Gate
//
// Only available with the `ocrs` feature:
//
// ```toml
// tillscan-document = { path = "crates/tillscan-document", features = ["ocrs"] }
// ```
//
// # Model Setup
//
// The engine needs `text-detection.rten` and `text-recognition.rten`. Running
// `ocrs-cli` once downloads them to `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`), which is also the default lookup directory here.
//
// ocrs has no page-segmentation setting; lines come back in reading order.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tillscan_core::error::{Result, TillscanError};
use tracing::{debug, info, instrument};

use super::ocr::TextRecognizer;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, else `~/.cache/ocrs`, else `./ocrs-models`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Recognizer running the ocrs detection and recognition models in-process.
///
/// Model loading is the expensive step; build once and reuse.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load both models from `dir`.
    ///
    /// # Errors
    ///
    /// [`TillscanError::OcrError`] if a model file is missing or corrupt.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let detection_model = load_model(&dir.join(DETECTION_MODEL_FILENAME))?;
        let recognition_model = load_model(&dir.join(RECOGNITION_MODEL_FILENAME))?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| TillscanError::OcrError(format!("failed to initialise ocrs: {}", err)))?;

        info!("ocrs engine initialised");
        Ok(Self { engine })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::from_model_dir(default_model_dir())
    }
}

fn load_model(path: &Path) -> Result<Model> {
    if !path.exists() {
        return Err(TillscanError::OcrError(format!(
            "ocrs model not found at {}; run `ocrs-cli` once to download models",
            path.display()
        )));
    }
    debug!(path = %path.display(), "Loading ocrs model");
    Model::load_file(path).map_err(|err| {
        TillscanError::OcrError(format!(
            "failed to load ocrs model from {}: {}",
            path.display(),
            err
        ))
    })
}

impl TextRecognizer for OcrsRecognizer {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            TillscanError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| TillscanError::OcrError(format!("OCR preprocessing failed: {}", err)))?;
        let text = self.engine.get_text(&input).map_err(|err| {
            TillscanError::OcrError(format!("OCR text recognition failed: {}", err))
        })?;

        debug!(line_count = text.lines().count(), "ocrs recognition complete");
        Ok(text)
    }
}
