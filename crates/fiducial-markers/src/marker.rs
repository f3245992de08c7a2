use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use fiducial_pose::{normalise_degrees, EulerDegrees};

/// A marker location in both image and world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerPoint {
    pub image: Point2<f32>,
    pub world: Point3<f32>,
}

/// One fully decoded marker detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// User-visible code (after translation through the code table).
    pub code: u8,
    /// Multiple of 90 degrees the code grid was rotated to decode.
    pub rotation_offset: f32,
    pub centre: MarkerPoint,
    /// Vertices clockwise from the top-left, in image and world space.
    pub vertices: [MarkerPoint; 4],
    /// Rotation about the camera axes, degrees in `(-180, 180]`.
    pub rotation: EulerDegrees,
    /// Bearing of the centre off the optical axis, degrees.
    pub bearing: EulerDegrees,
    /// Straight-line distance to the centre in metres.
    pub distance: f32,
}

/// Mean of the four vertices.
pub(crate) fn image_centre(vertices: &[Point2<f32>; 4]) -> Point2<f32> {
    let mut sx = 0.0;
    let mut sy = 0.0;
    for v in vertices {
        sx += v.x;
        sy += v.y;
    }
    Point2::new(sx / 4.0, sy / 4.0)
}

/// Rotate the vertex array so index 0 is the top-left corner.
///
/// The contour seed may be the top-right corner of a tilted quad, in which
/// case vertex 0 sits below vertex 1 and the array shifts by one.
pub(crate) fn orient_top_left(vertices: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    if vertices[0].y > vertices[1].y {
        [vertices[1], vertices[2], vertices[3], vertices[0]]
    } else {
        vertices
    }
}

/// Fold the grid's discrete rotation offset into the geometric rotation.
///
/// The offset joins the z component, the result is renormalised, and z is
/// negated so positive roll reads anticlockwise about +z.
pub(crate) fn compose_rotation(geometric: EulerDegrees, offset: f32) -> EulerDegrees {
    EulerDegrees {
        x: normalise_degrees(geometric.x),
        y: normalise_degrees(geometric.y),
        z: -normalise_degrees(geometric.z + offset),
    }
}
