// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the tillscan receipt scanner.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TillscanError};

/// A 2D point in pixel coordinates (x to the right, y downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Multiply both coordinates by `factor`.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn as_tuple(self) -> (f32, f32) {
        (self.x, self.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Outline of one detected region, in working-image coordinates.
///
/// Supplied by a region detector and consumed once by boundary selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<Point>,
    /// Detector confidence (0.0–1.0), when the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            confidence: None,
        }
    }

    pub fn with_confidence(points: Vec<Point>, confidence: f32) -> Self {
        Self {
            points,
            confidence: Some(confidence.clamp(0.0, 1.0)),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<(f32, f32)>> for Contour {
    fn from(points: Vec<(f32, f32)>) -> Self {
        Self::new(points.into_iter().map(Point::from).collect())
    }
}

/// Factor relating the working copy back to the original resolution
/// (`original_width / working_width`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRatio(f32);

impl ScaleRatio {
    /// Ratio of an original width to the width of its resized copy.
    pub fn from_widths(original_width: u32, working_width: u32) -> Self {
        Self(original_width as f32 / working_width.max(1) as f32)
    }

    pub fn new(value: f32) -> Self {
        Self(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Project a working-space point into original-image space.
    pub fn apply(self, point: Point) -> Point {
        point.scaled(self.0)
    }
}

/// The receipt outline: the first four-vertex polygon approximation found
/// among the candidate contours, in working-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceiptBoundary {
    /// Vertices in the order the polygon approximation emitted them.
    pub points: [Point; 4],
    /// Position of the winning contour in the detector's output.
    pub candidate_index: usize,
}

impl ReceiptBoundary {
    /// The four vertices mapped into original-image coordinates.
    pub fn scaled(&self, ratio: ScaleRatio) -> [Point; 4] {
        self.points.map(|p| ratio.apply(p))
    }
}

/// Four corners of a quadrilateral in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Corners {
    /// `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn to_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Corners as `(x, y)` tuples, the shape imageproc's projection expects.
    pub fn to_control_points(&self) -> [(f32, f32); 4] {
        self.to_array().map(Point::as_tuple)
    }
}

/// Tesseract page-segmentation mode (`--psm`), 0 through 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PageSegMode(u8);

impl PageSegMode {
    /// Single column of text of variable sizes: every physical row of the
    /// receipt comes back as one line.
    pub const SINGLE_COLUMN: Self = Self(4);
    /// Fully automatic page segmentation.
    pub const AUTO: Self = Self(3);
    /// A single uniform block of text.
    pub const SINGLE_BLOCK: Self = Self(6);

    pub fn new(mode: u8) -> Result<Self> {
        if mode > 13 {
            return Err(TillscanError::InvalidConfig(format!(
                "page segmentation mode must be between 0 and 13, got {mode}"
            )));
        }
        Ok(Self(mode))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for PageSegMode {
    fn default() -> Self {
        Self::SINGLE_COLUMN
    }
}

impl TryFrom<u8> for PageSegMode {
    type Error = TillscanError;

    fn try_from(mode: u8) -> Result<Self> {
        Self::new(mode)
    }
}

impl From<PageSegMode> for u8 {
    fn from(mode: PageSegMode) -> Self {
        mode.0
    }
}

impl std::fmt::Display for PageSegMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_ratio_from_widths() {
        let ratio = ScaleRatio::from_widths(1600, 800);
        assert_eq!(ratio.value(), 2.0);
        assert_eq!(ratio.apply(Point::new(10.0, 100.0)), Point::new(20.0, 200.0));
    }

    #[test]
    fn scale_ratio_zero_working_width_does_not_divide_by_zero() {
        let ratio = ScaleRatio::from_widths(100, 0);
        assert!(ratio.value().is_finite());
    }

    #[test]
    fn boundary_scaled_keeps_vertex_order() {
        let boundary = ReceiptBoundary {
            points: [
                Point::new(10.0, 10.0),
                Point::new(10.0, 100.0),
                Point::new(100.0, 100.0),
                Point::new(100.0, 10.0),
            ],
            candidate_index: 0,
        };
        let scaled = boundary.scaled(ScaleRatio::new(2.0));
        assert_eq!(
            scaled,
            [
                Point::new(20.0, 20.0),
                Point::new(20.0, 200.0),
                Point::new(200.0, 200.0),
                Point::new(200.0, 20.0),
            ]
        );
    }

    #[test]
    fn point_distance() {
        assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn contour_confidence_is_clamped() {
        let c = Contour::with_confidence(vec![], 1.7);
        assert_eq!(c.confidence, Some(1.0));
    }

    #[test]
    fn page_seg_mode_range() {
        assert_eq!(PageSegMode::new(4).unwrap(), PageSegMode::SINGLE_COLUMN);
        assert!(PageSegMode::new(14).is_err());
        assert_eq!(PageSegMode::default().value(), 4);
    }

    #[test]
    fn page_seg_mode_rejects_out_of_range_json() {
        let parsed: std::result::Result<PageSegMode, _> = serde_json::from_str("42");
        assert!(parsed.is_err());
        let parsed: PageSegMode = serde_json::from_str("6").unwrap();
        assert_eq!(parsed, PageSegMode::SINGLE_BLOCK);
    }

    #[test]
    fn contour_json_without_confidence() {
        let c: Contour = serde_json::from_str(r#"{"points":[{"x":1.0,"y":2.0}]}"#).unwrap();
        assert_eq!(c.points, vec![Point::new(1.0, 2.0)]);
        assert_eq!(c.confidence, None);
    }
}
