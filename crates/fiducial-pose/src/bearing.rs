//! Angular offset of a world point from the optical axis.

use nalgebra::Point3;

use crate::rotation::EulerDegrees;

/// Bearing from the camera's viewing direction to `point`, in degrees.
///
/// Signs follow Cartesian graph quadrants: a point right of the optical
/// axis has positive `y`, a point above it has positive `x`. The `z`
/// component is reserved and always zero.
pub fn bearing_to_point(point: Point3<f32>) -> EulerDegrees {
    let (px, py, pz) = (point.x as f64, point.y as f64, point.z as f64);

    let y = px.atan2(pz);
    let r = (px * px + py * py + pz * pz).sqrt();
    let x = (py / r).asin();

    EulerDegrees {
        x: x.to_degrees() as f32,
        y: y.to_degrees() as f32,
        z: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn on_axis_point_has_zero_bearing() {
        let b = bearing_to_point(Point3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(b.x, 0.0);
        assert_relative_eq!(b.y, 0.0);
        assert_relative_eq!(b.z, 0.0);
    }

    #[test]
    fn point_right_of_axis_has_positive_y() {
        let b = bearing_to_point(Point3::new(1.0, 0.0, 1.0));
        assert_relative_eq!(b.y, 45.0, epsilon = 1e-4);
        assert_relative_eq!(b.x, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn point_above_axis_has_positive_x() {
        let b = bearing_to_point(Point3::new(0.0, 1.0, 1.0));
        assert_relative_eq!(b.x, 45.0, epsilon = 1e-4);
        assert_relative_eq!(b.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn point_left_and_below_is_negative_on_both() {
        let b = bearing_to_point(Point3::new(-0.5, -0.5, 2.0));
        assert!(b.y < 0.0);
        assert!(b.x < 0.0);
    }
}
