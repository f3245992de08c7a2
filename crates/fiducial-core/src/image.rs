use serde::{Deserialize, Serialize};

/// Borrowed single-channel 8-bit image, row-major, `data.len() == width * height`.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl<'a> GrayImageView<'a> {
    /// Wrap a raw buffer. Panics if the buffer length does not match.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Self {
        assert_eq!(data.len(), width * height, "buffer length must be w*h");
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Owned single-channel 8-bit image.
#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// All-black image of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Build from an existing buffer. Panics if the length does not match.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height, "buffer length must be w*h");
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn as_view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

/// Integer pixel coordinate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: u16,
    pub y: u16,
}

impl Pixel {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered.
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Bilinear sample at a fractional position.
///
/// The four surrounding pixels are blended by their coverage weights; taps
/// falling outside the image contribute 0, so samples near the border fade
/// towards black rather than wrapping or clamping.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let (xf, yf) = (x.floor(), y.floor());
    let (tx, ty) = (x - xf, y - yf);
    let (cx, cy) = (xf as i64, yf as i64);

    let tap = |dx: i64, dy: i64| -> f32 {
        let (px, py) = (cx + dx, cy + dy);
        if px < 0 || py < 0 || px >= src.width as i64 || py >= src.height as i64 {
            return 0.0;
        }
        src.data[py as usize * src.width + px as usize] as f32
    };

    let upper = (1.0 - tx) * tap(0, 0) + tx * tap(1, 0);
    let lower = (1.0 - tx) * tap(0, 1) + tx * tap(1, 1);
    (1.0 - ty) * upper + ty * lower
}

/// [`sample_bilinear`] truncated into the 8-bit range.
#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    let v = sample_bilinear(src, x, y);
    v.clamp(0.0, 255.0) as u8
}
