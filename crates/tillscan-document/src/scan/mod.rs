// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — region detection, outline selection, perspective
// rectification, optical character recognition, and price filtering.

pub mod boundary;
pub mod detect;
pub mod ocr;
pub mod pipeline;
pub mod preview;
pub mod price;
pub mod rectify;

#[cfg(feature = "leptess")]
pub mod leptess_backend;
#[cfg(feature = "ocrs")]
pub mod ocrs_backend;

pub use boundary::select_boundary;
pub use detect::RegionDetector;
pub use ocr::TextRecognizer;
pub use pipeline::ReceiptScanner;
pub use price::PriceFilter;
