//! Detection and 3-D pose estimation of square fiducial markers.
//!
//! Feed a grayscale frame and pinhole intrinsics to a [`MarkerDetector`]
//! and get back every marker whose 6×6 Hamming-plus-CRC code grid decodes,
//! each with world-space vertices, centre, distance, rotation and bearing.
//!
//! ```no_run
//! use fiducial_core::{CameraParams, GrayImageView};
//! use fiducial_markers::MarkerDetector;
//!
//! let pixels = vec![0u8; 640 * 480];
//! let frame = GrayImageView::new(640, 480, &pixels);
//! let mut detector = MarkerDetector::new(CameraParams::centred(640, 480, 571.0, 571.0));
//! for marker in detector.detect(&frame, 0.11) {
//!     println!("code {} at {:.2} m", marker.code, marker.distance);
//! }
//! ```

mod detector;
mod marker;
mod params;
mod sink;
mod unwarp;

pub use detector::MarkerDetector;
pub use marker::{Marker, MarkerPoint};
pub use params::DetectorParams;
pub use sink::{HtmlSink, TextSink};
pub use unwarp::unwarp_marker;

pub use fiducial_code as code;
pub use fiducial_core as core;
pub use fiducial_pose as pose;
pub use fiducial_segment as segment;

pub use fiducial_core::{CameraParams, DebugSink, GrayImage, GrayImageView};
pub use fiducial_pose::EulerDegrees;
