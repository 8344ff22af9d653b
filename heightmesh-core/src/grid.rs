/// Row-major pixel storage shared by the decoder and the mesh builders
use crate::color::Color;
use crate::error::GridError;

/// A decoded image. Pixel `(0, 0)` is the visual top-left corner and the
/// pixel at `(x, y)` lives at index `y * width + x`.
///
/// A grid whose pixel list is empty while its dimensions are not is the
/// sentinel left behind by [`crate::bmp::BmpDecoder::decode_or_empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, GridError> {
        let expected = (width as usize).saturating_mul(height as usize);
        if pixels.len() != expected {
            return Err(GridError::DimensionMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A grid of the given size with every pixel set to `color`
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Build a greyscale grid from one intensity byte per pixel
    pub fn from_luma(width: u32, height: u32, values: &[u8]) -> Result<Self, GridError> {
        let pixels = values.iter().map(|&v| Color::rgb(v, v, v)).collect();
        Self::new(width, height, pixels)
    }

    /// Failed-decode sentinel: dimensions as parsed, no pixels
    pub(crate) fn failed(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Vec::new(),
        }
    }

    /// Trusted constructor for decoders that size their buffer themselves
    pub(crate) fn from_parts(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Number of pixels the dimensions describe, saturating on 32-bit
    /// targets for failed grids with absurd headers
    pub fn pixel_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// True when no pixel data is present. After a decode this means the
    /// image could not be read, not that it was a valid empty image.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Iterate over rows, top to bottom
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[Color]> {
        // chunks() panics on zero
        let width = (self.width as usize).max(1);
        self.pixels.chunks(width)
    }

    /// Nearest-neighbour down-sample so the longest side is at most
    /// `max_sample_size` pixels. Grids already within the limit are cloned.
    pub fn sample(&self, max_sample_size: u32) -> PixelGrid {
        let longest = self.width.max(self.height);
        if self.is_empty() || max_sample_size >= longest {
            return self.clone();
        }
        if max_sample_size == 0 {
            return PixelGrid::from_parts(0, 0, Vec::new());
        }

        let scale_down = f64::from(max_sample_size) / f64::from(longest);
        let scale_up = 1.0 / scale_down;
        let width = (f64::from(self.width) * scale_down).round() as u32;
        let height = (f64::from(self.height) * scale_down).round() as u32;

        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for sy in 0..height {
            let y = ((f64::from(sy) * scale_up).round() as u32).min(self.height - 1);
            for sx in 0..width {
                let x = ((f64::from(sx) * scale_up).round() as u32).min(self.width - 1);
                pixels.push(self.pixels[self.index(x, y)]);
            }
        }

        PixelGrid::from_parts(width, height, pixels)
    }
}
