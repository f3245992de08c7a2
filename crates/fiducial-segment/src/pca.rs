//! Principal-component line fit for contour segments.

use fiducial_core::Pixel;
use nalgebra::{Matrix2, Point2, Vector2};

/// Fit a line through `points` by PCA: returns the mean and the unit
/// eigenvector of the larger eigenvalue of the 2×2 covariance.
///
/// `None` when fewer than two points are available; the caller keeps its
/// coarse estimate in that case.
pub(crate) fn principal_axis(points: &[Pixel]) -> Option<(Point2<f32>, Vector2<f32>)> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    let inv_n = 1.0 / n as f64;
    let mut mx = 0.0_f64;
    let mut my = 0.0_f64;
    for p in points {
        mx += p.x as f64;
        my += p.y as f64;
    }
    mx *= inv_n;
    my *= inv_n;

    let mut sxx = 0.0_f64;
    let mut syy = 0.0_f64;
    let mut sxy = 0.0_f64;
    for p in points {
        let dx = p.x as f64 - mx;
        let dy = p.y as f64 - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    sxx *= inv_n;
    syy *= inv_n;
    sxy *= inv_n;

    let cov = Matrix2::new(sxx, sxy, sxy, syy);
    let eigen = cov.symmetric_eigen();
    let dominant = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
        0
    } else {
        1
    };
    let v = eigen.eigenvectors.column(dominant);

    Some((
        Point2::new(mx as f32, my as f32),
        Vector2::new(v[0] as f32, v[1] as f32),
    ))
}
