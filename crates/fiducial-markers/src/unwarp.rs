//! Perspective unwarp of a marker interior to the canonical square.

use fiducial_core::{
    homography_from_4pt, warp_perspective_gray, DebugSink, GrayImage, GrayImageView,
};
use nalgebra::Point2;

/// Map the quad bounded by `vertices` onto a `width`×`width` square.
///
/// Vertices are truncated to whole pixels first (the refiner's sub-pixel
/// precision matters for pose, not for reading ~10 px cells). Returns
/// `None` when any vertex is non-finite or outside the frame, or when the
/// bounding box of the quad has no area. When a sink is given, the clip
/// rectangle around the marker is logged before warping.
pub fn unwarp_marker(
    frame: &GrayImageView<'_>,
    vertices: &[Point2<f32>; 4],
    width: u32,
    mut sink: Option<&mut (dyn DebugSink + 'static)>,
) -> Option<GrayImage> {
    assert!(width > 0 && width % 10 == 0, "unwarp width must be a multiple of 10");

    for v in vertices {
        if !v.x.is_finite() || !v.y.is_finite() {
            return None;
        }
        if v.x < 0.0 || v.y < 0.0 || v.x >= frame.width as f32 || v.y >= frame.height as f32 {
            return None;
        }
    }

    let truncated = vertices.map(|v| Point2::new(v.x.trunc(), v.y.trunc()));

    let min_x = truncated.iter().fold(f32::MAX, |m, v| m.min(v.x)) as usize;
    let min_y = truncated.iter().fold(f32::MAX, |m, v| m.min(v.y)) as usize;
    let max_x = truncated.iter().fold(0.0f32, |m, v| m.max(v.x)) as usize;
    let max_y = truncated.iter().fold(0.0f32, |m, v| m.max(v.y)) as usize;
    if max_x == min_x || max_y == min_y {
        return None;
    }

    if let Some(sink) = sink.as_deref_mut() {
        let mut clip = GrayImage::new(max_x - min_x + 1, max_y - min_y + 1);
        for y in 0..clip.height {
            for x in 0..clip.width {
                clip.set(x, y, frame.get(min_x + x, min_y + y));
            }
        }
        sink.log(Some("warped marker"), Some(&clip.as_view()));
    }

    let side = width as f32;
    let square = [
        Point2::new(0.0, 0.0),
        Point2::new(side, 0.0),
        Point2::new(side, side),
        Point2::new(0.0, side),
    ];

    let h = homography_from_4pt(&square, &truncated)?;
    Some(warp_perspective_gray(frame, h, width as usize, width as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame() -> GrayImage {
        let mut img = GrayImage::new(64, 64);
        for y in 0..64 {
            for x in 0..64 {
                img.set(x, y, (x * 4) as u8);
            }
        }
        img
    }

    #[test]
    fn axis_aligned_quad_unwarps_to_its_content() {
        let mut img = GrayImage::from_raw(64, 64, vec![255; 64 * 64]);
        for y in 20..40 {
            for x in 20..40 {
                img.set(x, y, 0);
            }
        }
        let verts = [
            Point2::new(20.0, 20.0),
            Point2::new(39.0, 20.0),
            Point2::new(39.0, 39.0),
            Point2::new(20.0, 39.0),
        ];
        let out = unwarp_marker(&img.as_view(), &verts, 100, None).expect("unwarp");
        assert_eq!(out.width, 100);
        // the middle of the unwarped square is the dark block
        assert!(out.get(50, 50) < 32);
        assert!(out.get(5, 5) < 32);
    }

    #[test]
    fn vertices_outside_the_frame_are_rejected() {
        let img = gradient_frame();
        let verts = [
            Point2::new(-1.0, 10.0),
            Point2::new(50.0, 10.0),
            Point2::new(50.0, 50.0),
            Point2::new(10.0, 50.0),
        ];
        assert!(unwarp_marker(&img.as_view(), &verts, 100, None).is_none());
    }

    #[test]
    fn non_finite_vertices_are_rejected() {
        let img = gradient_frame();
        let verts = [
            Point2::new(f32::NAN, 10.0),
            Point2::new(50.0, 10.0),
            Point2::new(50.0, 50.0),
            Point2::new(10.0, 50.0),
        ];
        assert!(unwarp_marker(&img.as_view(), &verts, 100, None).is_none());
    }

    #[test]
    fn zero_area_quads_are_rejected() {
        let img = gradient_frame();
        let verts = [
            Point2::new(10.2, 10.0),
            Point2::new(10.4, 10.3),
            Point2::new(10.6, 10.9),
            Point2::new(10.8, 10.5),
        ];
        assert!(unwarp_marker(&img.as_view(), &verts, 100, None).is_none());
    }

    #[test]
    #[should_panic]
    fn unwarp_width_must_be_grid_aligned() {
        let img = gradient_frame();
        let verts = [
            Point2::new(10.0, 10.0),
            Point2::new(50.0, 10.0),
            Point2::new(50.0, 50.0),
            Point2::new(10.0, 50.0),
        ];
        let _ = unwarp_marker(&img.as_view(), &verts, 55, None);
    }
}
