//! Adaptive (and reference global) thresholding.

use fiducial_core::{GrayImage, GrayImageView, IntegralImage, Rect};

/// Window of side `window_size` centred on `(x, y)`, clipped against the
/// image so border windows keep at least `window_size/2 + 1` pixels per axis.
///
/// `window_size` must be odd so the pixel can sit at the window centre.
pub fn threshold_window(
    width: usize,
    height: usize,
    window_size: usize,
    x: usize,
    y: usize,
) -> Rect {
    assert!(window_size % 2 == 1, "window size must be odd");
    assert!(x < width && y < height);
    let half = window_size / 2;

    let (wx, ww) = if x >= half && x < (width - 1) - half {
        (x - half, window_size)
    } else {
        (if x < half { 0 } else { (width - 1) - half }, half + 1)
    };

    let (wy, wh) = if y >= half && y < (height - 1) - half {
        (y - half, window_size)
    } else {
        (if y < half { 0 } else { (height - 1) - half }, half + 1)
    };

    Rect::new(wx, wy, ww, wh)
}

/// Adaptive classification of a single pixel against its window mean.
///
/// A pixel is dark iff `(src(x,y) + margin) · n < S` where `S` is the window
/// sum and `n` its pixel count. This is `src < mean - margin` rearranged to
/// avoid the division.
#[inline]
pub fn pixel_is_dark(
    frame: &GrayImageView<'_>,
    integral: &IntegralImage<'_>,
    window: &Rect,
    x: usize,
    y: usize,
    margin: i32,
) -> bool {
    let sum = integral.sum(window) as i64;
    let cmp = (frame.get(x, y) as i64 + margin as i64) * window.area() as i64;
    cmp < sum
}

/// Adaptively threshold a whole frame: dark pixels become 0, light 255.
///
/// Used on the unwarped marker before cell binarisation; the find-markers
/// path instead fuses this test with labelling (`label_adaptive`).
pub fn threshold_adaptive(frame: &GrayImageView<'_>, window_size: usize, margin: i32) -> GrayImage {
    let integral = IntegralImage::new(*frame, true);
    let mut out = GrayImage::new(frame.width, frame.height);

    for y in 0..frame.height {
        for x in 0..frame.width {
            let win = threshold_window(frame.width, frame.height, window_size, x, y);
            if !pixel_is_dark(frame, &integral, &win, x, y, margin) {
                out.set(x, y, 0xff);
            }
        }
    }
    out
}

const GLOBAL_LOWER_BOUND: u16 = 60;
const GLOBAL_UPPER_BOUND: u16 = 160;

fn classify_and_average(frame: &GrayImageView<'_>, threshold: u16) -> (u16, u16) {
    let mut sum_white = 0u64;
    let mut sum_black = 0u64;
    let mut num_white = 0u64;
    let mut num_black = 0u64;

    for &v in frame.data {
        if v as u16 >= threshold {
            sum_white += v as u64;
            num_white += 1;
        } else {
            sum_black += v as u64;
            num_black += 1;
        }
    }

    let avg_white = if num_white != 0 {
        (sum_white / num_white) as u16
    } else {
        255
    };
    let avg_black = if num_black != 0 {
        (sum_black / num_black) as u16
    } else {
        0
    };
    (avg_white, avg_black)
}

/// Single global threshold: linear search for the value equidistant from the
/// mean white level and the mean black level it induces.
///
/// Reference path only; detection uses the adaptive threshold. Kept because
/// it is handy for sanity-checking the thresholder on evenly lit frames.
pub fn threshold_global(frame: &GrayImageView<'_>) -> u8 {
    let mut avg_white = 256u16;
    let mut avg_black = 256u16;
    let mut threshold = GLOBAL_LOWER_BOUND - 1;

    while threshold < (avg_black + avg_white) / 2 && threshold < GLOBAL_UPPER_BOUND {
        threshold += 1;
        let (w, b) = classify_and_average(frame, threshold);
        avg_white = w;
        avg_black = b;
    }

    threshold as u8
}
