// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process tesseract via the `leptess` bindings.
//
// Only available with the `leptess` feature, which links the system
// libtesseract and libleptonica instead of spawning the executable.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use leptess::{LepTess, Variable};
use tillscan_core::config::RecognizerConfig;
use tillscan_core::error::{Result, TillscanError};
use tracing::{debug, instrument};

use super::ocr::TextRecognizer;

/// Recognizer calling libtesseract directly.
///
/// Honours the language, page-segmentation mode and tessdata directory of
/// [`RecognizerConfig`]; `executable` is unused. An engine is created per
/// call since `LepTess` needs exclusive access.
#[derive(Debug, Clone)]
pub struct LeptessRecognizer {
    config: RecognizerConfig,
}

impl LeptessRecognizer {
    pub fn new(config: RecognizerConfig) -> Self {
        Self { config }
    }
}

impl TextRecognizer for LeptessRecognizer {
    fn name(&self) -> &'static str {
        "libtesseract"
    }

    #[instrument(skip_all, fields(
        width = image.width(),
        height = image.height(),
        language = %self.config.language,
    ))]
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(image.to_rgb8())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|err| TillscanError::OcrError(format!("failed to encode image: {}", err)))?;

        let data_path = self
            .config
            .tessdata_dir
            .as_ref()
            .map(|dir| dir.display().to_string());
        let mut engine = LepTess::new(data_path.as_deref(), &self.config.language).map_err(
            |err| {
                TillscanError::OcrError(format!(
                    "failed loading language {}: {}",
                    self.config.language, err
                ))
            },
        )?;
        engine
            .set_variable(
                Variable::TesseditPagesegMode,
                &self.config.page_seg_mode.to_string(),
            )
            .map_err(|err| {
                TillscanError::OcrError(format!("failed to set page segmentation mode: {}", err))
            })?;
        engine
            .set_image_from_mem(&png)
            .map_err(|err| TillscanError::OcrError(format!("failed to load image: {}", err)))?;
        let text = engine
            .get_utf8_text()
            .map_err(|err| TillscanError::OcrError(format!("libtesseract failed: {}", err)))?;

        debug!(line_count = text.lines().count(), "libtesseract recognition complete");
        Ok(text)
    }
}
