// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — maps the receipt quadrilateral onto a flat
// rectangle in the original image's resolution.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tillscan_core::{Corners, Point, ReceiptBoundary, ScaleRatio};
use tracing::{debug, info, instrument, warn};

/// A flattened, top-down receipt and the geometry that produced it.
#[derive(Debug, Clone)]
pub struct Rectified {
    /// Source corners in original-image coordinates.
    pub corners: Corners,
    pub image: DynamicImage,
}

impl Rectified {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Warp the receipt outlined by `boundary` out of `original`.
///
/// ## Pipeline
///
/// 1. Scale the working-space outline by `ratio` into original coordinates
/// 2. Order the corners top-left, top-right, bottom-right, bottom-left
/// 3. Size the output from the longer of each pair of opposite edges
/// 4. Build a projective transformation from the corners to the output
///    rectangle and apply it via `imageproc::geometric_transformations::warp_into`
///
/// A degenerate outline (collinear or coincident corners) cannot be
/// projected; the result is then a blank white image of the computed size.
#[instrument(skip_all, fields(
    width = original.width(),
    height = original.height(),
    ratio = ratio.value(),
))]
pub fn rectify(original: &DynamicImage, boundary: &ReceiptBoundary, ratio: ScaleRatio) -> Rectified {
    let scaled = boundary.scaled(ratio);
    let corners = order_corners(scaled);
    debug!(
        top_left = %corners.top_left,
        top_right = %corners.top_right,
        bottom_right = %corners.bottom_right,
        bottom_left = %corners.bottom_left,
        "Receipt corners ordered"
    );

    let (out_w, out_h) = destination_size(&corners);
    let right = (out_w - 1) as f32;
    let bottom = (out_h - 1) as f32;
    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),      // top-left
        (right, 0.0),    // top-right
        (right, bottom), // bottom-right
        (0.0, bottom),   // bottom-left
    ];

    let default_pixel = Rgba([255u8, 255, 255, 255]);
    let mut output = RgbaImage::from_pixel(out_w, out_h, default_pixel);

    match Projection::from_control_points(corners.to_control_points(), dest) {
        Some(projection) => {
            let rgba_input = original.to_rgba8();
            warp_into(
                &rgba_input,
                &projection,
                Interpolation::Bilinear,
                default_pixel,
                &mut output,
            );
            info!(out_w, out_h, "Perspective rectification applied");
        }
        None => {
            warn!(out_w, out_h, "Receipt outline is degenerate; returning blank image");
        }
    }

    Rectified {
        corners,
        image: DynamicImage::ImageRgba8(output),
    }
}

/// Assign the four points to canonical corners.
///
/// Top-left has the smallest `x + y`, bottom-right the largest; top-right has
/// the smallest `y - x`, bottom-left the largest. Ties go to the smaller `y`
/// for the top corners and the larger `y` for the bottom ones. When that rule
/// lands one point on two corners (a square rotated by 45 degrees, say), the
/// points are instead walked clockwise around their centroid starting from the
/// top-left pick. Either way the answer is the same for every traversal order
/// of the same four points.
pub fn order_corners(points: [Point; 4]) -> Corners {
    let sum = |p: &Point| p.x + p.y;
    let diff = |p: &Point| p.y - p.x;

    let top_left = pick(&points, |a, b| sum(a).total_cmp(&sum(b)).then(a.y.total_cmp(&b.y)));
    let bottom_right = pick(&points, |a, b| sum(b).total_cmp(&sum(a)).then(b.y.total_cmp(&a.y)));
    let top_right = pick(&points, |a, b| diff(a).total_cmp(&diff(b)).then(a.y.total_cmp(&b.y)));
    let bottom_left = pick(&points, |a, b| diff(b).total_cmp(&diff(a)).then(b.y.total_cmp(&a.y)));

    let corners = Corners {
        top_left,
        top_right,
        bottom_right,
        bottom_left,
    };
    if all_distinct(&corners.to_array()) {
        corners
    } else {
        clockwise_from(points, top_left)
    }
}

/// Output size: the longer of the two horizontal edges by the longer of the
/// two vertical edges, rounded, at least one pixel each way.
pub fn destination_size(corners: &Corners) -> (u32, u32) {
    let width = corners
        .top_left
        .distance(corners.top_right)
        .max(corners.bottom_left.distance(corners.bottom_right));
    let height = corners
        .top_left
        .distance(corners.bottom_left)
        .max(corners.top_right.distance(corners.bottom_right));
    (round_px(width), round_px(height))
}

fn round_px(len: f32) -> u32 {
    if len.is_finite() {
        (len.round() as u32).max(1)
    } else {
        1
    }
}

/// Smallest point under `cmp`; on full ties the lower `x` wins.
fn pick(points: &[Point; 4], cmp: impl Fn(&Point, &Point) -> std::cmp::Ordering) -> Point {
    let mut best = points[0];
    for p in &points[1..] {
        let ord = cmp(p, &best).then(p.x.total_cmp(&best.x));
        if ord.is_lt() {
            best = *p;
        }
    }
    best
}

fn all_distinct(points: &[Point; 4]) -> bool {
    (0..4).all(|i| (i + 1..4).all(|j| points[i] != points[j]))
}

/// Sort by angle around the centroid (clockwise on screen, y pointing down)
/// and rotate so `start` comes first.
fn clockwise_from(points: [Point; 4], start: Point) -> Corners {
    let cx = points.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f32>() / 4.0;
    let angle = |p: &Point| (p.y - cy).atan2(p.x - cx);

    let mut sorted = points;
    sorted.sort_by(|a, b| {
        angle(a)
            .total_cmp(&angle(b))
            .then(a.x.total_cmp(&b.x))
            .then(a.y.total_cmp(&b.y))
    });
    let offset = sorted.iter().position(|p| *p == start).unwrap_or(0);
    sorted.rotate_left(offset);

    Corners {
        top_left: sorted[0],
        top_right: sorted[1],
        bottom_right: sorted[2],
        bottom_left: sorted[3],
    }
}
