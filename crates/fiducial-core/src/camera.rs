use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Pinhole camera intrinsics for the resolution the frames arrive at.
///
/// The principal point is usually the image centre; the two focal lengths
/// are in pixels and are averaged where a single focal length is needed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub width: u32,
    pub height: u32,
    pub principal_point: Point2<f32>,
    pub focal_x: f32,
    pub focal_y: f32,
}

impl CameraParams {
    pub fn new(
        width: u32,
        height: u32,
        principal_point: Point2<f32>,
        focal_x: f32,
        focal_y: f32,
    ) -> Self {
        let params = Self {
            width,
            height,
            principal_point,
            focal_x,
            focal_y,
        };
        params.assert_valid();
        params
    }

    /// Intrinsics with the principal point at the image centre.
    pub fn centred(width: u32, height: u32, focal_x: f32, focal_y: f32) -> Self {
        Self::new(
            width,
            height,
            Point2::new(width as f32 / 2.0, height as f32 / 2.0),
            focal_x,
            focal_y,
        )
    }

    #[inline]
    pub fn mean_focal(&self) -> f32 {
        (self.focal_x + self.focal_y) / 2.0
    }

    /// Panics on parameters that are programming errors: non-positive image
    /// size, non-finite or non-positive focal lengths, or a principal point
    /// outside the image.
    pub fn assert_valid(&self) {
        assert!(self.width > 0 && self.height > 0, "image size must be positive");
        assert!(
            self.focal_x.is_finite() && self.focal_x > 0.0,
            "focal_x must be positive"
        );
        assert!(
            self.focal_y.is_finite() && self.focal_y > 0.0,
            "focal_y must be positive"
        );
        let pp = self.principal_point;
        assert!(
            pp.x >= 0.0 && pp.y >= 0.0 && pp.x < self.width as f32 && pp.y < self.height as f32,
            "principal point must lie inside the image"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centred_places_principal_point_mid_image() {
        let cam = CameraParams::centred(640, 480, 570.0, 572.0);
        assert_eq!(cam.principal_point, Point2::new(320.0, 240.0));
        assert!((cam.mean_focal() - 571.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn principal_point_outside_image_is_rejected() {
        let _ = CameraParams::new(640, 480, Point2::new(700.0, 240.0), 571.0, 571.0);
    }
}
