/// RGBA color values produced by the bitmap decoder

/// An 8-bit per channel color. Alpha defaults to opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Perceived brightness in `0..=255` using the W3C weights
    /// `(299 R + 587 G + 114 B) / 1000`, rounded to nearest.
    pub fn luminance(&self) -> u8 {
        let weighted = u32::from(self.r) * 299 + u32::from(self.g) * 587 + u32::from(self.b) * 114;
        // Max weighted value is 255_000, so the rounded quotient fits in a u8.
        ((weighted + 500) / 1000) as u8
    }

    pub fn is_greyscale(&self) -> bool {
        self.r == self.g && self.g == self.b
    }

    /// Channel values as `[r, g, b]`
    pub fn to_rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::rgba(r, g, b, a)
    }
}
