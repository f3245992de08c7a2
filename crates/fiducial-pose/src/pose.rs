//! Passive ranging to a known planar square (Hung et al., 1985).

use nalgebra::{Matrix3, Point2, Point3, Vector3};

/// World-space reconstruction of a marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseEstimate {
    pub vertices: [Point3<f32>; 4],
    pub centre: Point3<f32>,
    /// Straight-line distance from the camera to the marker centre.
    pub distance: f32,
}

/// Recover the four world vertices of a square of side `side` metres from
/// its image points (relative to the principal point, y up) and the focal
/// length in pixels.
///
/// Each vertex lies on the ray `k_i * (x_i, y_i, f)`. Expressing `k_0..k_2`
/// in units of `k_3` gives a 3×3 linear system; `k_3` itself is then fixed
/// by the known physical length of the 3-0 edge. Returns `None` when the
/// system is singular, which only happens for degenerate image quads.
pub fn estimate_pose(image: &[Point2<f32>; 4], side: f32, focal: f32) -> Option<PoseEstimate> {
    let f = focal as f64;

    let a = Matrix3::new(
        -image[0].x as f64,
        image[1].x as f64,
        image[2].x as f64,
        -image[0].y as f64,
        image[1].y as f64,
        image[2].y as f64,
        -f,
        f,
        f,
    );
    let b = Vector3::new(image[3].x as f64, image[3].y as f64, f);

    let k_ratios = a.lu().solve(&b)?;

    let k0_over_k3 = k_ratios[0];
    let edge = ((-k0_over_k3 * image[0].x as f64 - image[3].x as f64).powi(2)
        + (-k0_over_k3 * image[0].y as f64 - image[3].y as f64).powi(2)
        + (-k0_over_k3 * f - f).powi(2))
    .sqrt();
    if !edge.is_finite() || edge == 0.0 {
        return None;
    }

    let k3 = (side as f64 / edge).abs();
    let k = [
        k_ratios[0].abs() * k3,
        k_ratios[1].abs() * k3,
        k_ratios[2].abs() * k3,
        k3,
    ];

    let mut vertices = [Point3::origin(); 4];
    let mut centre = Vector3::zeros();
    for i in 0..4 {
        let v = Point3::new(
            (image[i].x as f64 * k[i]) as f32,
            (image[i].y as f64 * k[i]) as f32,
            (f * k[i]) as f32,
        );
        vertices[i] = v;
        centre += v.coords;
    }
    centre /= 4.0;

    Some(PoseEstimate {
        vertices,
        centre: Point3::from(centre),
        distance: centre.norm(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FOCAL: f32 = 571.0;
    const SIDE: f32 = 0.11;

    fn project(world: &[Point3<f32>; 4]) -> [Point2<f32>; 4] {
        world.map(|p| Point2::new(FOCAL * p.x / p.z, FOCAL * p.y / p.z))
    }

    fn square_at(cx: f32, cy: f32, cz: f32, yaw_deg: f32) -> [Point3<f32>; 4] {
        let h = SIDE / 2.0;
        let (s, c) = yaw_deg.to_radians().sin_cos();
        // top-left, top-right, bottom-right, bottom-left in camera space
        [
            Point3::new(-h, h, 0.0),
            Point3::new(h, h, 0.0),
            Point3::new(h, -h, 0.0),
            Point3::new(-h, -h, 0.0),
        ]
        .map(|p| Point3::new(p.x * c + cx, p.y + cy, -p.x * s + cz))
    }

    #[test]
    fn frontal_square_is_reconstructed_exactly() {
        let world = square_at(0.0, 0.0, 1.0, 0.0);
        let pose = estimate_pose(&project(&world), SIDE, FOCAL).expect("pose");

        for (rec, truth) in pose.vertices.iter().zip(&world) {
            assert_relative_eq!(rec.x, truth.x, epsilon = 1e-4);
            assert_relative_eq!(rec.y, truth.y, epsilon = 1e-4);
            assert_relative_eq!(rec.z, truth.z, epsilon = 1e-4);
        }
        assert_relative_eq!(pose.distance, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn reconstruction_holds_over_the_working_range() {
        // property: within 1% from 5x to 50x the marker side
        for scale in [5.0f32, 12.0, 30.0, 50.0] {
            let z = SIDE * scale;
            let world = square_at(0.02, -0.01, z, 25.0);
            let pose = estimate_pose(&project(&world), SIDE, FOCAL).expect("pose");

            for (rec, truth) in pose.vertices.iter().zip(&world) {
                let err = (rec - truth).norm();
                assert!(err < 0.01 * z, "scale {scale}: err {err}");
            }
            let truth_centre =
                world.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / 4.0;
            assert!((pose.distance - truth_centre.norm()).abs() < 0.01 * z);
        }
    }

    #[test]
    fn off_axis_square_keeps_its_offset() {
        let world = square_at(0.25, 0.1, 0.9, 0.0);
        let pose = estimate_pose(&project(&world), SIDE, FOCAL).expect("pose");
        assert_relative_eq!(pose.centre.x, 0.25, epsilon = 1e-3);
        assert_relative_eq!(pose.centre.y, 0.1, epsilon = 1e-3);
        assert_relative_eq!(pose.centre.z, 0.9, epsilon = 1e-3);
    }

    #[test]
    fn collapsed_image_points_are_rejected() {
        // all four vertices on the principal point: the system loses rank
        let p = Point2::new(0.0, 0.0);
        assert!(estimate_pose(&[p, p, p, p], SIDE, FOCAL).is_none());
    }
}
