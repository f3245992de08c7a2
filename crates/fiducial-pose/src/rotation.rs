//! Marker rotation about the three camera axes.

use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Rotation or bearing angles in degrees, one per camera axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerDegrees {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn normalise_degrees(mut angle: f32) -> f32 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Rotation of four coplanar vertices centred on the origin.
///
/// The plane normal comes from the cross product of the vectors to
/// vertices 0 and 1 (the origin is in the plane, so two points span it).
/// Yaw is `pi - atan2(n_x, n_z)`, then negated so positive yaw is
/// anticlockwise about +y seen from the origin; pitch is `asin(n_y)`. Roll
/// is recovered by un-rotating the top-edge midpoint through the pitch/yaw
/// estimate and measuring its remaining in-plane angle. All angles are
/// returned in degrees within `(-180, 180]`.
pub fn rotation_from_vertices(centred: &[Point3<f32>; 4]) -> EulerDegrees {
    let a = Vector3::new(
        centred[0].x as f64,
        centred[0].y as f64,
        centred[0].z as f64,
    );
    let b = Vector3::new(
        centred[1].x as f64,
        centred[1].y as f64,
        centred[1].z as f64,
    );

    let n = a.cross(&b).normalize();

    let mut rot_y = PI - n.x.atan2(n.z);
    let mut rot_x = n.y.asin();

    if rot_x >= PI {
        rot_x -= 2.0 * PI;
    }
    if rot_y >= PI {
        rot_y -= 2.0 * PI;
    }
    rot_y = -rot_y;

    // un-rotate the top-edge midpoint about x and y, then read the roll
    let sin_x = (-rot_x).sin();
    let sin_y = (-rot_y).sin();
    let cos_x = (-rot_x).cos();
    let cos_y = (-rot_y).cos();

    let unrotate = Matrix3::new(
        cos_y,
        0.0,
        sin_y,
        -sin_x * -sin_y,
        cos_x,
        -sin_x * cos_y,
        -sin_y * cos_x,
        sin_x,
        cos_x * cos_y,
    );

    let mid = (a + b) / 2.0;
    let un = unrotate * mid;
    let rot_z = un.x.atan2(un.y);

    EulerDegrees {
        x: normalise_degrees(rot_x.to_degrees() as f32),
        y: normalise_degrees(rot_y.to_degrees() as f32),
        z: normalise_degrees(rot_z.to_degrees() as f32),
    }
}
