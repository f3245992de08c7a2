//! Geometric reconstruction: world-space vertices from image points, then
//! rotation about the camera axes and the bearing off the optical axis.
//!
//! Image points handed to this crate are relative to the principal point
//! with y up; world coordinates keep the camera at the origin with +z into
//! the scene.

mod bearing;
mod pose;
mod rotation;

pub use bearing::bearing_to_point;
pub use pose::{estimate_pose, PoseEstimate};
pub use rotation::{normalise_degrees, rotation_from_vertices, EulerDegrees};
