// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tillscan-document — Receipt image processing for tillscan.
//
// Provides image loading and height normalisation, candidate region detection,
// receipt outline selection, perspective rectification, text recognition, and
// priced-line filtering.

pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `tillscan_document::ReceiptScanner` etc.
pub use self::image::loader::ReceiptImage;
pub use scan::boundary::select_boundary;
pub use scan::detect::{ContourFileDetector, RegionDetector, ThresholdContourDetector};
pub use scan::ocr::{TesseractRecognizer, TextRecognizer};
pub use scan::pipeline::{ReceiptScanner, ScanReport, ScanSummary};
pub use scan::price::PriceFilter;
pub use scan::rectify::{Rectified, rectify};

#[cfg(feature = "leptess")]
pub use scan::leptess_backend::LeptessRecognizer;
#[cfg(feature = "ocrs")]
pub use scan::ocrs_backend::OcrsRecognizer;
