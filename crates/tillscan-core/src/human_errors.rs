// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity tells the operator whether to retake the photo, fix the setup,
// or give up on the input.

use crate::error::TillscanError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The input itself needs attention (retake the photo, tune thresholds).
    ActionRequired,
    /// Something on this machine is missing or misconfigured.
    SetupRequired,
    /// The input cannot be used at all.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n  {}", self.message, self.suggestion)
    }
}

/// Convert a `TillscanError` into a `HumanError`.
pub fn humanize_error(err: &TillscanError) -> HumanError {
    match err {
        TillscanError::BoundaryNotFound { candidates } => HumanError {
            message: format!(
                "Could not find the receipt outline ({candidates} region(s) checked)."
            ),
            suggestion: "Photograph the receipt flat against a darker background with all four \
                         corners visible, or lower --min-confidence if you supply contours."
                .into(),
            severity: Severity::ActionRequired,
        },

        TillscanError::ImageError(detail) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: format!(
                "The image may be damaged or in an unusual format. Try saving it as a \
                 JPEG or PNG first. ({detail})"
            ),
            severity: Severity::Permanent,
        },

        TillscanError::DetectionError(detail) => HumanError {
            message: "Region detection failed.".into(),
            suggestion: format!("Check the contour file or detector settings. ({detail})"),
            severity: Severity::ActionRequired,
        },

        TillscanError::OcrError(detail) => humanize_ocr_error(detail),

        TillscanError::InvalidConfig(detail) => HumanError {
            message: "The configuration is not valid.".into(),
            suggestion: format!("Fix the setting and run again. ({detail})"),
            severity: Severity::SetupRequired,
        },

        TillscanError::Io(io) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check the path and its permissions. ({io})"),
            severity: Severity::ActionRequired,
        },

        TillscanError::Serialization(detail) => HumanError {
            message: "A JSON file could not be understood.".into(),
            suggestion: format!("Check the file's syntax. ({detail})"),
            severity: Severity::ActionRequired,
        },
    }
}

/// OCR failures are mostly setup problems: a missing executable or language pack.
fn humanize_ocr_error(detail: &str) -> HumanError {
    let lower = detail.to_lowercase();

    if lower.contains("failed to start") || lower.contains("not found") {
        HumanError {
            message: "The text recognizer could not be started.".into(),
            suggestion: "Install tesseract, or point --tesseract (TILLSCAN_TESSERACT) at the \
                         executable."
                .into(),
            severity: Severity::SetupRequired,
        }
    } else if lower.contains("failed loading language") || lower.contains("traineddata") {
        HumanError {
            message: "The recognition language is not installed.".into(),
            suggestion: "Install the tesseract language pack for --lang, or set --tessdata-dir."
                .into(),
            severity: Severity::SetupRequired,
        }
    } else {
        HumanError {
            message: "Text recognition didn't work on this receipt.".into(),
            suggestion: format!(
                "Try a sharper photo with better lighting. (Detail: {detail})"
            ),
            severity: Severity::ActionRequired,
        }
    }
}
