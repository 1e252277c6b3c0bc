// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) for flattened receipts.
//
// The default backend drives the `tesseract` command-line tool. Receipts are
// recognised with page-segmentation mode 4 ("single column of text of
// variable sizes"), which makes tesseract concatenate each physical row of
// the receipt into one output line, so an item name and its price end up on
// the same line.
//
// # Setup
//
// Install tesseract and the language pack you need, e.g.
//
// ```sh
// apt install tesseract-ocr tesseract-ocr-rus
// ```
//
// Point `RecognizerConfig::executable` at the binary when it is not on
// `PATH` (the CLI reads `--tesseract` / `TILLSCAN_TESSERACT`).

use std::process::Command;

use image::{DynamicImage, ImageFormat};
use tillscan_core::config::RecognizerConfig;
use tillscan_core::error::{Result, TillscanError};
use tracing::{debug, info, instrument};

/// Abstraction over a text recognition backend.
///
/// One synchronous call per image; implementations do not retry.
pub trait TextRecognizer {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Recognise all text in `image`, lines separated by `\n`.
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize(image)
    }
}

/// Runs the tesseract executable on a temporary PNG and reads its stdout.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    config: RecognizerConfig,
}

impl TesseractRecognizer {
    pub fn new(config: RecognizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Arguments following the input path: `stdout --psm N -l LANG [--tessdata-dir DIR]`.
    fn arguments(&self) -> Vec<String> {
        let mut args = vec![
            "stdout".to_string(),
            "--psm".to_string(),
            self.config.page_seg_mode.to_string(),
            "-l".to_string(),
            self.config.language.clone(),
        ];
        if let Some(dir) = &self.config.tessdata_dir {
            args.push("--tessdata-dir".to_string());
            args.push(dir.display().to_string());
        }
        args
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(RecognizerConfig::default())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    /// The image is converted to RGB8 before hand-off, whatever its source
    /// colour layout.
    ///
    /// # Errors
    ///
    /// Returns [`TillscanError::OcrError`] if the image cannot be written, the
    /// executable cannot be started, it exits unsuccessfully, or its output is
    /// not UTF-8.
    #[instrument(skip_all, fields(
        width = image.width(),
        height = image.height(),
        language = %self.config.language,
        psm = %self.config.page_seg_mode,
    ))]
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        info!(
            executable = %self.config.executable.display(),
            "Starting OCR text recognition"
        );

        let input = tempfile::Builder::new()
            .prefix("tillscan-")
            .suffix(".png")
            .tempfile()
            .map_err(|err| {
                TillscanError::OcrError(format!("failed to create temporary image: {}", err))
            })?;

        DynamicImage::ImageRgb8(image.to_rgb8())
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|err| {
                TillscanError::OcrError(format!("failed to write temporary image: {}", err))
            })?;

        let output = Command::new(&self.config.executable)
            .arg(input.path())
            .args(self.arguments())
            .output()
            .map_err(|err| {
                TillscanError::OcrError(format!(
                    "failed to start tesseract at {}: {}",
                    self.config.executable.display(),
                    err
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TillscanError::OcrError(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8(output.stdout).map_err(|err| {
            TillscanError::OcrError(format!("tesseract produced invalid UTF-8: {}", err))
        })?;

        let line_count = text.lines().count();
        let char_count = text.len();
        debug!(line_count, char_count, "OCR recognition complete");

        Ok(text)
    }
}
