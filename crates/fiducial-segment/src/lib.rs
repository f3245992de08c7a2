//! From raw grayscale pixels to refined quadrilaterals.
//!
//! The stages live here in pipeline order: the adaptive threshold fused with
//! connected-component labelling, the region filter, the 8-connected contour
//! walk, recursive quad vertex discovery, and the PCA edge refiner.

mod contour;
mod label;
mod pca;
mod quad;
mod threshold;

pub use contour::trace_contour;
pub use label::{
    label_adaptive, ClipRegion, Label, LabelledImage, MAX_LABELS, MIN_EDGE_DISTANCE,
    MIN_REGION_MASS,
};
pub use quad::{find_quad, refine_vertices, Quad, QuadRejection};
pub use threshold::{pixel_is_dark, threshold_adaptive, threshold_global, threshold_window};
