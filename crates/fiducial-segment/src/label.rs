//! Fused adaptive thresholding and 8-connected component labelling.

use fiducial_core::{DebugSink, GrayImage, GrayImageView, IntegralImage, Pixel};
use serde::{Deserialize, Serialize};

use crate::threshold::{pixel_is_dark, threshold_window};

/// Non-zero region identifier; 0 is the light background.
pub type Label = u16;

/// Hard ceiling on distinct labels in one frame.
pub const MAX_LABELS: usize = 0xFFFF;

/// Regions lighter than this many pixels are never markers.
pub const MIN_REGION_MASS: u32 = 64;

/// Regions closer than this to any image edge are rejected.
pub const MIN_EDGE_DISTANCE: u16 = 3;

/// Bounding box and pixel mass of a labelled component.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ClipRegion {
    pub min: Pixel,
    pub max: Pixel,
    pub mass: u32,
}

impl Default for ClipRegion {
    fn default() -> Self {
        Self {
            min: Pixel::new(u16::MAX, u16::MAX),
            max: Pixel::new(0, 0),
            mass: 0,
        }
    }
}

/// Labelled frame: a label grid with a one-pixel zero border, the union-find
/// alias vector, and per-canonical-label clip statistics.
///
/// The zero border means neighbour queries during labelling and contour
/// tracing never need bounds checks. Clip statistics exist only for
/// canonical labels; aliased entries keep zero mass and fail the usability
/// test, so callers iterating regions skip them for free.
pub struct LabelledImage {
    width: usize,
    height: usize,
    data: Vec<Label>,
    aliases: Vec<Label>,
    clips: Vec<ClipRegion>,
}

impl LabelledImage {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width + 2) * (height + 2)],
            aliases: Vec::new(),
            clips: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Label at `(x, y)`; coordinates may be one step outside the image,
    /// where the zero border answers.
    #[inline]
    pub fn label_at(&self, x: isize, y: isize) -> Label {
        debug_assert!(x >= -1 && y >= -1 && x <= self.width as isize && y <= self.height as isize);
        self.data[(y + 1) as usize * (self.width + 2) + (x + 1) as usize]
    }

    #[inline]
    fn set_label(&mut self, x: usize, y: usize, label: Label) {
        let resolved = if label == 0 {
            0
        } else {
            self.aliases[label as usize - 1]
        };
        self.data[(y + 1) * (self.width + 2) + x + 1] = resolved;
    }

    /// Walk the alias chain down to its fixed point.
    fn find_canonical(&self, mut label: Label) -> Label {
        loop {
            let alias = self.aliases[label as usize - 1];
            if alias == label {
                return alias;
            }
            label = alias;
        }
    }

    /// Resolved alias of `label`; after finalisation this is canonical.
    #[inline]
    pub fn canonical_of(&self, label: Label) -> Label {
        self.aliases[label as usize - 1]
    }

    /// Record that two labels belong to one component. The larger root is
    /// aliased to the smaller so the canonical label is always the lowest.
    fn merge(&mut self, a: Label, b: Label) {
        let ra = self.find_canonical(a);
        let rb = self.find_canonical(b);
        let (lo, hi) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.aliases[hi as usize - 1] = lo;
    }

    fn label_dark_pixel(&mut self, x: usize, y: usize) {
        let (xi, yi) = (x as isize, y as isize);

        // inherit straight from the north neighbour when possible
        let north = self.label_at(xi, yi - 1);
        if north != 0 {
            self.set_label(x, y, north);
            return;
        }

        // a labelled NE neighbour may bridge two regions via W/NW
        let ne = self.label_at(xi + 1, yi - 1);
        if ne != 0 {
            let west = self.label_at(xi - 1, yi);
            let nw = self.label_at(xi - 1, yi - 1);
            if west != 0 || nw != 0 {
                let l1 = self.aliases[ne as usize - 1];
                let other = if nw != 0 { nw } else { west };
                let l2 = self.aliases[other as usize - 1];
                self.set_label(x, y, l1.min(l2));
                self.merge(l1, l2);
            } else {
                self.set_label(x, y, ne);
            }
            return;
        }

        let nw = self.label_at(xi - 1, yi - 1);
        if nw != 0 {
            self.set_label(x, y, nw);
            return;
        }

        let west = self.label_at(xi - 1, yi);
        if west != 0 {
            self.set_label(x, y, west);
            return;
        }

        // new region
        assert!(self.aliases.len() < MAX_LABELS, "label overflow");
        let label = self.aliases.len() as Label + 1;
        self.aliases.push(label);
        self.set_label(x, y, label);
    }

    /// Collapse every alias chain to its root, then accumulate clip boxes
    /// and masses keyed by canonical label.
    fn finalise(&mut self) {
        for i in 0..self.aliases.len() {
            self.aliases[i] = self.find_canonical(i as Label + 1);
        }

        self.clips = vec![ClipRegion::default(); self.aliases.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                let label = self.label_at(x as isize, y as isize);
                if label == 0 {
                    continue;
                }
                let canon = self.aliases[label as usize - 1];
                let clip = &mut self.clips[canon as usize - 1];
                clip.mass += 1;
                clip.min.x = clip.min.x.min(x as u16);
                clip.min.y = clip.min.y.min(y as u16);
                clip.max.x = clip.max.x.max(x as u16);
                clip.max.y = clip.max.y.max(y as u16);
            }
        }
    }

    /// Number of region slots; index `i` corresponds to label `i + 1`.
    #[inline]
    pub fn region_count(&self) -> usize {
        self.clips.len()
    }

    #[inline]
    pub fn clip(&self, region: usize) -> &ClipRegion {
        &self.clips[region]
    }

    /// A region is usable iff it is heavy enough to be a marker and its
    /// bounding box keeps clear of the image edges. Aliased labels have zero
    /// mass and fail the first test.
    pub fn is_usable(&self, region: usize) -> bool {
        let clip = &self.clips[region];
        if clip.mass < MIN_REGION_MASS {
            return false;
        }
        clip.min.x >= MIN_EDGE_DISTANCE
            && clip.min.y >= MIN_EDGE_DISTANCE
            && clip.max.x <= self.width as u16 - MIN_EDGE_DISTANCE
            && clip.max.y <= self.height as u16 - MIN_EDGE_DISTANCE
    }
}

/// Threshold and label a frame in one cache-friendly sweep.
///
/// Each pixel is classified against the mean of a `window_size` window
/// (margin `margin` below the mean counts as dark) and dark pixels are
/// labelled with 8-connectivity on the fly. The integral image is advanced
/// lazily, one window-row ahead of the sweep, so source and accumulator stay
/// hot. When a sink is given the thresholded frame is logged to it.
pub fn label_adaptive(
    frame: &GrayImageView<'_>,
    window_size: usize,
    margin: i32,
    sink: Option<&mut (dyn DebugSink + 'static)>,
) -> LabelledImage {
    let mut integral = IntegralImage::new(*frame, false);
    let mut lmg = LabelledImage::new(frame.width, frame.height);
    let mut thresh_img = sink.is_some().then(|| GrayImage::new(frame.width, frame.height));

    for y in 0..frame.height {
        for x in 0..frame.width {
            let win = threshold_window(frame.width, frame.height, window_size, x, y);
            if x == 0 {
                integral.advance(frame.width - 1, win.y + win.height - 1);
            }
            if pixel_is_dark(frame, &integral, &win, x, y, margin) {
                lmg.label_dark_pixel(x, y);
            } else {
                lmg.set_label(x, y, 0);
                if let Some(img) = thresh_img.as_mut() {
                    img.set(x, y, 0xff);
                }
            }
        }
    }

    if let (Some(sink), Some(img)) = (sink, thresh_img.as_ref()) {
        sink.log(Some("thresholded image"), Some(&img.as_view()));
    }

    lmg.finalise();
    log::debug!("labelled {} region slots", lmg.region_count());
    lmg
}
