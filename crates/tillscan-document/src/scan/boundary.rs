// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Receipt outline selection — polygon approximation of candidate contours and
// first-match search for a four-sided outline.

use tillscan_core::error::{Result, TillscanError};
use tillscan_core::{Contour, Point, ReceiptBoundary};
use tracing::{debug, info, instrument, trace};

/// Pick the receipt outline from the detector's candidates.
///
/// Candidates are visited in the order supplied. Each is reduced with
/// [`approximate_polygon`] at a tolerance of `epsilon_ratio` times its
/// perimeter; the first reduction with exactly four vertices wins and the
/// search stops. A later, more rectangular candidate never replaces an
/// earlier match.
///
/// # Errors
///
/// [`TillscanError::BoundaryNotFound`] when no candidate reduces to four
/// vertices (including when there are no candidates at all).
#[instrument(skip(contours), fields(candidates = contours.len()))]
pub fn select_boundary(contours: &[Contour], epsilon_ratio: f64) -> Result<ReceiptBoundary> {
    for (index, contour) in contours.iter().enumerate() {
        let peri = perimeter(&contour.points);
        let approx = approximate_polygon(&contour.points, epsilon_ratio * peri);
        trace!(
            index,
            points = contour.len(),
            perimeter = peri,
            vertices = approx.len(),
            "Candidate approximated"
        );

        if let Ok(points) = <[Point; 4]>::try_from(approx) {
            info!(index, ?points, "Receipt outline found");
            return Ok(ReceiptBoundary {
                points,
                candidate_index: index,
            });
        }
    }

    debug!("No candidate reduced to four vertices");
    Err(TillscanError::BoundaryNotFound {
        candidates: contours.len(),
    })
}

/// Length of the closed polygon through `points` (last vertex joins the first).
pub fn perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.distance(*b) as f64)
        .sum()
}

/// Simplify a closed polygon (Ramer–Douglas–Peucker).
///
/// Keeps a subset of the input vertices such that every dropped vertex lies
/// within `epsilon` of the simplified outline. The closed curve is cut at two
/// mutually distant vertices and each half is simplified as an open chain, so
/// the result does not depend on where the detector started tracing.
///
/// Repeated consecutive points (including a closing copy of the first point)
/// are ignored. Inputs with fewer than three distinct points are returned
/// unchanged after de-duplication.
pub fn approximate_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    let ring = dedup_ring(points);
    let n = ring.len();
    if n < 3 {
        return ring;
    }

    // Cut points: the vertex farthest from an arbitrary start, then the vertex
    // farthest from that one.
    let start = farthest_from(&ring, ring[0]);
    let end = farthest_from(&ring, ring[start]);

    let first_half = cyclic_chain(&ring, start, end);
    let second_half = cyclic_chain(&ring, end, start);

    let mut out = simplify_chain(&first_half, epsilon);
    out.pop();
    let mut rest = simplify_chain(&second_half, epsilon);
    rest.pop();
    out.append(&mut rest);
    out
}

/// Drop consecutive duplicates and a trailing copy of the first point.
fn dedup_ring(points: &[Point]) -> Vec<Point> {
    let mut ring: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if ring.last() != Some(&p) {
            ring.push(p);
        }
    }
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn farthest_from(ring: &[Point], origin: Point) -> usize {
    ring.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.distance(origin).total_cmp(&b.distance(origin)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Vertices from `from` to `to` inclusive, walking forward and wrapping.
fn cyclic_chain(ring: &[Point], from: usize, to: usize) -> Vec<Point> {
    let n = ring.len();
    let steps = (to + n - from) % n;
    (0..=steps).map(|k| ring[(from + k) % n]).collect()
}

/// Open-chain Douglas–Peucker. Endpoints are always kept.
fn simplify_chain(chain: &[Point], epsilon: f64) -> Vec<Point> {
    if chain.len() < 3 {
        return chain.to_vec();
    }

    let mut keep = vec![false; chain.len()];
    keep[0] = true;
    keep[chain.len() - 1] = true;

    let mut stack = vec![(0usize, chain.len() - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let (index, dist) = (lo + 1..hi)
            .map(|i| (i, segment_distance(chain[i], chain[lo], chain[hi])))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((lo, 0.0));

        if dist > epsilon {
            keep[index] = true;
            stack.push((lo, index));
            stack.push((index, hi));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Perpendicular distance from `p` to the line through `a` and `b`, or the
/// point distance when `a` and `b` coincide.
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let len = dx.hypot(dy);
    if len < f64::EPSILON {
        return p.distance(a) as f64;
    }
    ((p.x - a.x) as f64 * dy - (p.y - a.y) as f64 * dx).abs() / len
}
