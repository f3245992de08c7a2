//! Core types and utilities for square fiducial marker detection.
//!
//! This crate is deliberately small: grayscale image views, pinhole camera
//! intrinsics, the incrementally completable integral image, a four-point
//! homography with its perspective warp, and the debug-sink contract shared
//! by the detection pipeline. It knows nothing about markers themselves.

mod camera;
mod debug;
mod homography;
mod image;
mod integral;
pub mod logger;

pub use camera::CameraParams;
pub use debug::DebugSink;
pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, Pixel, Rect};
pub use integral::IntegralImage;
