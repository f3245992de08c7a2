//! Quadrilateral vertex discovery and sub-pixel refinement on a contour.

use fiducial_core::Pixel;
use nalgebra::{Point2, Vector2};
use thiserror::Error;

use crate::pca::principal_axis;

/// Why a contour was not accepted as a quadrilateral.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum QuadRejection {
    #[error("contour has too few points to enclose a quadrilateral")]
    TooShort,
    #[error("vertex search did not settle on four corners")]
    VertexCount,
    #[error("corners form a concave or bowtie shape")]
    Concave,
}

/// Convex quadrilateral found on a contour: vertex positions plus the
/// contour indices they came from, clockwise starting at the seed.
#[derive(Clone, Debug)]
pub struct Quad {
    pub vertices: [Point2<f32>; 4],
    pub corners: [usize; 4],
}

/// Contour index furthest (squared Euclidean) from `from`.
fn furthest_point(contour: &[Pixel], from: usize) -> usize {
    let s = contour[from];
    let mut best = from;
    let mut best_d = 0i64;
    for (i, p) in contour.iter().enumerate().skip(1) {
        let dx = p.x as i64 - s.x as i64;
        let dy = p.y as i64 - s.y as i64;
        let d = dx * dx + dy * dy;
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Index in `(a, b)` with the greatest perpendicular distance to the chord
/// `a -> b`, provided that distance clears the straightness threshold
/// `|ab|^2 / 300 + 1`. `None` means the sub-chain is straight enough to
/// carry no vertex.
fn furthest_perpendicular(contour: &[Pixel], a: usize, b: usize) -> Option<usize> {
    let sp = contour[a];
    let ep = contour[b];

    let xe_minus_xs = ep.x as i32 - sp.x as i32;
    let ys_minus_ye = sp.y as i32 - ep.y as i32;
    if xe_minus_xs == 0 && ys_minus_ye == 0 {
        return None;
    }

    let threshold = (xe_minus_xs * xe_minus_xs + ys_minus_ye * ys_minus_ye) / 300 + 1;

    let mut best = None;
    let mut best_d = -1.0f32;
    for i in a + 1..b {
        let xt_minus_xs = contour[i].x as i32 - sp.x as i32;
        let yt_minus_ys = contour[i].y as i32 - sp.y as i32;

        let dividend = (ys_minus_ye * xt_minus_xs + xe_minus_xs * yt_minus_ys) as f32;
        let divisor = (-(xe_minus_xs * xe_minus_xs) - ys_minus_ye * ys_minus_ye) as f32;
        let scale = dividend / divisor;

        let x_dist = ys_minus_ye as f32 * scale;
        let y_dist = xe_minus_xs as f32 * scale;
        let d = x_dist * x_dist + y_dist * y_dist;
        if d > best_d {
            best_d = d;
            best = Some(i);
        }
    }

    if best_d < threshold as f32 {
        return None;
    }
    best
}

/// Recursive furthest-point vertex search on the sub-chain `a..b`, bounded
/// at four vertices overall.
fn intermediate_vertices(
    contour: &[Pixel],
    a: usize,
    b: usize,
    out: &mut Vec<usize>,
    found: &mut u8,
) {
    let Some(furthest) = furthest_perpendicular(contour, a, b) else {
        return;
    };

    *found += 1;
    out.push(furthest);

    if *found > 4 {
        return;
    }
    intermediate_vertices(contour, a, furthest, out, found);
    if *found > 4 {
        return;
    }
    intermediate_vertices(contour, furthest, b, out, found);
}

/// Re-run the search on the two halves of `a..b`, accepting only the case
/// of exactly one vertex per half.
fn split_and_rescan(contour: &[Pixel], a: usize, b: usize) -> Option<(usize, usize)> {
    let mid = a + (b - a) / 2;
    let mut found = 2u8;
    let mut p1 = Vec::new();
    let mut p2 = Vec::new();
    intermediate_vertices(contour, a, mid, &mut p1, &mut found);
    intermediate_vertices(contour, mid, b, &mut p2, &mut found);
    if p1.len() == 1 && p2.len() == 1 {
        Some((p1[0], p2[0]))
    } else {
        None
    }
}

/// Decide whether a closed contour outlines a convex quadrilateral.
pub fn find_quad(contour: &[Pixel]) -> Result<Quad, QuadRejection> {
    if contour.len() <= 4 {
        return Err(QuadRejection::TooShort);
    }

    let v1 = 0usize;
    let v2 = furthest_point(contour, v1);
    let end = contour.len() - 1;

    let mut found = 2u8;
    let mut points1 = Vec::new();
    let mut points2 = Vec::new();
    intermediate_vertices(contour, v1, v2, &mut points1, &mut found);
    intermediate_vertices(contour, v2, end, &mut points2, &mut found);

    let (v3, v4) = if points1.len() == 1 && points2.len() == 1 {
        // v1 and v2 are opposite corners
        (points1[0], points2[0])
    } else if points1.is_empty() && points2.len() > 1 {
        split_and_rescan(contour, v2, end).ok_or(QuadRejection::VertexCount)?
    } else if points1.len() > 1 && points2.is_empty() {
        split_and_rescan(contour, v1, v2).ok_or(QuadRejection::VertexCount)?
    } else {
        return Err(QuadRejection::VertexCount);
    };

    // clockwise order is contour order, starting from the seed
    let mut rest = [v2, v3, v4];
    rest.sort_unstable();
    let corners = [v1, rest[0], rest[1], rest[2]];

    let vertices = corners.map(|i| {
        let p = contour[i];
        Point2::new(p.x as f32, p.y as f32)
    });

    // boomerang test: v1 and v3 must straddle the v0-v2 midline
    let cx = (vertices[0].x + vertices[2].x) / 2.0;
    if (cx - vertices[1].x) * (cx - vertices[3].x) > 0.0 {
        return Err(QuadRejection::Concave);
    }

    Ok(Quad { vertices, corners })
}

/// Centre 90 % of the chain `a..=b` (5 % trimmed from each end).
fn centre_section(a: usize, b: usize) -> (usize, usize) {
    let len = b - a + 1;
    let offset = (len as f32 * 0.05) as usize;
    let trimmed = (len as f32 * 0.9) as usize;
    (a + offset, a + offset + trimmed)
}

fn line_intersection(
    a: (Point2<f32>, Vector2<f32>),
    b: (Point2<f32>, Vector2<f32>),
) -> Option<Point2<f32>> {
    let (a_mean, a_vect) = a;
    let (b_mean, b_vect) = b;

    let denom = -b_vect.x * a_vect.y + b_vect.y * a_vect.x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let k = (b_vect.y * (b_mean.x - a_mean.x) - b_vect.x * (b_mean.y - a_mean.y)) / denom;
    let p = a_mean + a_vect * k;
    if p.x.is_finite() && p.y.is_finite() {
        Some(p)
    } else {
        None
    }
}

/// Replace the coarse corner estimates with the intersections of PCA line
/// fits through the middle of each edge chain.
///
/// Sides whose chain cannot be fitted (fewer than two points, parallel
/// fits) leave the affected vertices unrefined.
pub fn refine_vertices(quad: &mut Quad, contour: &[Pixel]) {
    let mut lines: [Option<(Point2<f32>, Vector2<f32>)>; 4] = [None; 4];

    for side in 0..4 {
        let a = quad.corners[side];
        let b = if side < 3 {
            quad.corners[side + 1]
        } else {
            contour.len() - 1
        };
        let (s, e) = centre_section(a, b);
        let e = e.min(contour.len() - 1);
        lines[side] = principal_axis(&contour[s..=e]);
    }

    for i in 0..4 {
        let (Some(prev), Some(this)) = (lines[(i + 3) % 4], lines[i]) else {
            continue;
        };
        if let Some(p) = line_intersection(prev, this) {
            quad.vertices[i] = p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integer chain along the closed polygon with roughly unit steps.
    fn polygon_chain(corners: &[(i32, i32)], steps_per_edge: usize) -> Vec<Pixel> {
        let mut pts = Vec::new();
        let n = corners.len();
        for e in 0..n {
            let (x0, y0) = corners[e];
            let (x1, y1) = corners[(e + 1) % n];
            for s in 0..steps_per_edge {
                let t = s as f32 / steps_per_edge as f32;
                let x = (x0 as f32 + (x1 - x0) as f32 * t).round() as i32;
                let y = (y0 as f32 + (y1 - y0) as f32 * t).round() as i32;
                let p = Pixel::new(x as u16, y as u16);
                if pts.last() != Some(&p) {
                    pts.push(p);
                }
            }
        }
        pts.push(pts[0]);
        pts
    }

    #[test]
    fn square_contour_yields_an_ordered_quad() {
        let chain = polygon_chain(&[(10, 10), (70, 10), (70, 70), (10, 70)], 60);
        let quad = find_quad(&chain).expect("quad");

        // vertex 0 is the seed on the top row; winding is clockwise
        assert_eq!(quad.vertices[0], Point2::new(10.0, 10.0));
        assert_eq!(quad.vertices[1], Point2::new(70.0, 10.0));
        assert_eq!(quad.vertices[2], Point2::new(70.0, 70.0));
        assert_eq!(quad.vertices[3], Point2::new(10.0, 70.0));
        assert!(quad.corners.windows(2).all(|w| w[0] < w[1]));
        let top_y = quad.vertices[0].y;
        assert!(quad.vertices.iter().all(|v| v.y >= top_y));
    }

    #[test]
    fn rotated_square_contour_is_found() {
        let chain = polygon_chain(&[(50, 10), (90, 50), (50, 90), (10, 50)], 55);
        let quad = find_quad(&chain).expect("quad");
        assert_eq!(quad.vertices[0], Point2::new(50.0, 10.0));
        assert_eq!(quad.vertices[2], Point2::new(50.0, 90.0));
    }

    #[test]
    fn straight_line_is_rejected() {
        let chain: Vec<Pixel> = (0..40)
            .map(|i| Pixel::new(10 + i, 10 + i))
            .chain((0..40).rev().map(|i| Pixel::new(10 + i, 10 + i)))
            .collect();
        assert!(find_quad(&chain).is_err());
    }

    #[test]
    fn tiny_contour_is_rejected() {
        let chain = vec![Pixel::new(1, 1); 4];
        assert!(matches!(find_quad(&chain), Err(QuadRejection::TooShort)));
    }

    #[test]
    fn refinement_recovers_exact_corners_of_a_clean_square() {
        let chain = polygon_chain(&[(10, 10), (90, 10), (90, 90), (10, 90)], 80);
        let mut quad = find_quad(&chain).expect("quad");
        refine_vertices(&mut quad, &chain);

        let expect = [(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 90.0)];
        for (v, (ex, ey)) in quad.vertices.iter().zip(expect) {
            assert!(
                (v.x - ex).abs() < 0.75 && (v.y - ey).abs() < 0.75,
                "vertex {v:?} vs ({ex},{ey})"
            );
        }
    }

    #[test]
    fn refinement_survives_degenerate_side_chains() {
        // corners packed so tightly that some side chains have < 2 points
        let chain = vec![
            Pixel::new(10, 10),
            Pixel::new(12, 10),
            Pixel::new(14, 10),
            Pixel::new(14, 12),
            Pixel::new(14, 14),
            Pixel::new(12, 14),
            Pixel::new(10, 14),
            Pixel::new(10, 12),
            Pixel::new(10, 10),
        ];
        if let Ok(mut quad) = find_quad(&chain) {
            let before = quad.vertices;
            refine_vertices(&mut quad, &chain);
            for v in quad.vertices {
                assert!(v.x.is_finite() && v.y.is_finite());
            }
            let _ = before;
        }
    }
}
