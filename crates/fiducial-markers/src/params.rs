use serde::{Deserialize, Serialize};

/// Tunable knobs of the detection pipeline.
///
/// The defaults are the values the pipeline was calibrated with; the
/// windows must stay odd so a pixel can sit at the window centre, and the
/// unwarp width must stay a multiple of the 10-cell grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Side of the adaptive threshold window on the input frame.
    pub threshold_window: usize,
    /// How far below the window mean a pixel must sit to count as dark.
    pub threshold_margin: i32,
    /// Side in pixels of the unwarped marker image.
    pub unwarp_width: u32,
    /// Adaptive window applied to the unwarped marker.
    pub rethreshold_window: usize,
    /// Margin for the unwarped marker pass.
    pub rethreshold_margin: i32,
    /// Cell binarisation threshold on the re-thresholded marker.
    pub cell_threshold: u8,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            threshold_window: 11,
            threshold_margin: 5,
            unwarp_width: 100,
            rethreshold_window: 21,
            rethreshold_margin: 3,
            cell_threshold: 127,
        }
    }
}

impl DetectorParams {
    pub(crate) fn assert_valid(&self) {
        assert!(
            self.threshold_window % 2 == 1 && self.rethreshold_window % 2 == 1,
            "threshold windows must be odd"
        );
        assert!(
            self.unwarp_width > 0 && self.unwarp_width % 10 == 0,
            "unwarp width must be a positive multiple of 10"
        );
    }
}
