/// BMP decoder for uncompressed OS/2 v1 and Windows V3 bitmaps
///
/// Supported variants:
/// - DIB headers: BITMAPCOREHEADER (12 bytes), BITMAPINFOHEADER (40 bytes)
/// - Compression: BI_RGB only
/// - Bit depths: 1, 4, 8 (palettised), 16 (X1R5G5B5), 24, 32
use std::io::Read;

use log::{debug, warn};
use nom::{
    bytes::complete::{tag, take},
    number::complete::{le_i16, le_i32, le_u16, le_u32, u8 as byte},
    IResult,
};

use crate::color::Color;
use crate::error::{BmpError, BmpResult};
use crate::grid::PixelGrid;

pub const MAGIC_MARKER: &[u8; 2] = b"BM";

/// Size of the fields between the magic marker and the DIB header
pub const FILE_HEADER_SIZE: usize = 12;

// DIB header sizes
pub const BITMAPCOREHEADER: u32 = 12;
pub const BITMAPINFOHEADER: u32 = 40;
pub const BITMAPCOREHEADER2: u32 = 64;
pub const BITMAPV4HEADER: u32 = 108;
pub const BITMAPV5HEADER: u32 = 124;

pub const BI_RGB: u32 = 0;

/// Which DIB header layout the file uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// OS/2 v1, 3-byte palette entries
    Core,
    /// Windows V3, 4-byte palette entries
    Info,
}

impl HeaderKind {
    fn palette_entry_size(self) -> usize {
        match self {
            HeaderKind::Core => 3,
            HeaderKind::Info => 4,
        }
    }
}

/// The fields of the DIB header the decoder cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DibHeader {
    pub kind: HeaderKind,
    pub width: i32,
    pub height: i32,
    pub bits_per_pixel: u16,
    /// Absent for OS/2 headers
    pub compression: Option<u32>,
    /// Declared palette size; absent for OS/2 headers, zero means "maximum"
    pub palette_colors: Option<u32>,
}

impl DibHeader {
    pub fn abs_width(&self) -> u32 {
        self.width.unsigned_abs()
    }

    pub fn abs_height(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Negative heights store rows top-down
    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }

    /// Number of palette entries following the header, zero for direct color
    pub fn palette_len(&self) -> BmpResult<usize> {
        if self.bits_per_pixel >= 16 {
            return Ok(0);
        }
        match self.palette_colors {
            Some(n) if n > 0 => Ok(n as usize),
            _ => match self.bits_per_pixel {
                1 => Ok(2),
                4 => Ok(16),
                8 => Ok(256),
                bpp => Err(BmpError::unsupported(format!(
                    "no color palette for {} bits per pixel",
                    bpp
                ))),
            },
        }
    }
}

/// Bytes of pixel data in one row, before padding.
/// `None` when the size does not fit in `usize`.
pub fn row_data_size(width: u32, bits_per_pixel: u16) -> Option<usize> {
    let bits = (width as usize).checked_mul(bits_per_pixel as usize)?;
    Some(bits / 8 + usize::from(bits % 8 != 0))
}

/// Bytes of one row on disk, padded to a multiple of four.
/// `None` when the size does not fit in `usize`.
pub fn row_stride(width: u32, bits_per_pixel: u16) -> Option<usize> {
    let bits = (width as usize).checked_mul(bits_per_pixel as usize)?;
    (bits / 32 + usize::from(bits % 32 != 0)).checked_mul(4)
}

/// Reads BMP streams into [`PixelGrid`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct BmpDecoder {
    preserve_alpha: bool,
}

impl BmpDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the fourth byte of 32bpp pixels as alpha instead of forcing
    /// every pixel opaque. Most BI_RGB files leave that byte zeroed.
    pub fn preserve_alpha(mut self, preserve: bool) -> Self {
        self.preserve_alpha = preserve;
        self
    }

    /// Decode a complete BMP file held in memory
    pub fn decode(&self, data: &[u8]) -> BmpResult<PixelGrid> {
        let input = parse_magic(data)?;
        let input = skip_file_header(input)?;
        let (input, header) = parse_dib_header(input)?;

        let width = header.abs_width();
        let height = header.abs_height();
        let truncated = |_: nom::Err<nom::error::Error<&[u8]>>| BmpError::Truncated { width, height };

        if header.width < 0 {
            return Err(BmpError::malformed(
                width,
                height,
                format!("negative width {}", header.width),
            ));
        }
        if let Some(compression) = header.compression {
            if compression != BI_RGB {
                return Err(BmpError::unsupported(format!(
                    "compression type {}",
                    compression
                )));
            }
        }
        if !matches!(header.bits_per_pixel, 1 | 4 | 8 | 16 | 24 | 32) {
            return Err(BmpError::unsupported(format!(
                "bit depth {}",
                header.bits_per_pixel
            )));
        }

        let palette_len = header.palette_len()?;
        let (input, palette) =
            parse_palette(input, header.kind, palette_len).map_err(truncated)?;

        debug!(
            "BMP {:?} header: {}x{} @ {}bpp, palette {}, {}",
            header.kind,
            width,
            height,
            header.bits_per_pixel,
            palette.len(),
            if header.is_top_down() { "top-down" } else { "bottom-up" }
        );

        let pixels = self.read_pixels(input, &header, &palette)?;
        Ok(PixelGrid::from_parts(width, height, pixels))
    }

    /// Decode everything readable from `reader`
    pub fn decode_reader<R: Read>(&self, mut reader: R) -> BmpResult<PixelGrid> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.decode(&data)
    }

    /// Like [`decode`](Self::decode), but once the magic marker has been
    /// recognised, truncated or malformed content produces an empty grid
    /// carrying the parsed dimensions instead of an error. A missing marker
    /// and unsupported variants are still errors.
    /// Callers must treat [`PixelGrid::is_empty`] as a failed decode.
    pub fn decode_or_empty(&self, data: &[u8]) -> BmpResult<PixelGrid> {
        match self.decode(data) {
            Err(BmpError::Truncated { width, height }) => {
                warn!("BMP data truncated, returning empty {}x{} grid", width, height);
                Ok(PixelGrid::failed(width, height))
            }
            Err(BmpError::Malformed {
                width,
                height,
                reason,
            }) => {
                warn!("{}, returning empty {}x{} grid", reason, width, height);
                Ok(PixelGrid::failed(width, height))
            }
            result => result,
        }
    }

    fn read_pixels(
        &self,
        mut input: &[u8],
        header: &DibHeader,
        palette: &[Color],
    ) -> BmpResult<Vec<Color>> {
        let width = header.abs_width();
        let height = header.abs_height();
        let bpp = header.bits_per_pixel;
        // A size that overflows usize can never be backed by the input
        let truncated = || BmpError::Truncated { width, height };
        let data_size = row_data_size(width, bpp).ok_or_else(truncated)?;
        let stride = row_stride(width, bpp).ok_or_else(truncated)?;
        let padding = stride - data_size;

        // Bail out before allocating for dimensions the data cannot back
        if height > 0 {
            let required = stride
                .checked_mul(height as usize - 1)
                .and_then(|size| size.checked_add(data_size))
                .ok_or_else(truncated)?;
            if input.len() < required {
                return Err(truncated());
            }
        }

        let pixel_count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| BmpError::unsupported(format!("{}x{} is too large", width, height)))?;
        let mut pixels = vec![Color::BLACK; pixel_count];
        let mut row_pixels = Vec::with_capacity(width as usize);

        for row in 0..height {
            let (rest, data) = take_row(input, data_size).map_err(|_| truncated())?;

            row_pixels.clear();
            self.decode_row(data, header, palette, &mut row_pixels)?;

            // Rows are stored bottom-up unless the height is negative
            let y = if header.is_top_down() { row } else { height - 1 - row };
            let start = y as usize * width as usize;
            pixels[start..start + width as usize].copy_from_slice(&row_pixels);

            // A missing pad at the very end of the file is tolerated
            input = &rest[padding.min(rest.len())..];
        }

        Ok(pixels)
    }

    fn decode_row(
        &self,
        data: &[u8],
        header: &DibHeader,
        palette: &[Color],
        out: &mut Vec<Color>,
    ) -> BmpResult<()> {
        let width = header.abs_width() as usize;
        let lookup = |index: u8| -> BmpResult<Color> {
            palette.get(index as usize).copied().ok_or_else(|| {
                BmpError::malformed(
                    header.abs_width(),
                    header.abs_height(),
                    format!("palette index {} out of range ({} entries)", index, palette.len()),
                )
            })
        };

        match header.bits_per_pixel {
            1 => {
                for &value in data {
                    for bit in 0..8 {
                        if out.len() == width {
                            break;
                        }
                        out.push(lookup((value >> (7 - bit)) & 0x01)?);
                    }
                }
            }
            4 => {
                for &value in data {
                    out.push(lookup(value >> 4)?);
                    if out.len() < width {
                        out.push(lookup(value & 0x0f)?);
                    }
                }
            }
            8 => {
                for &value in data {
                    out.push(lookup(value)?);
                }
            }
            16 => {
                for chunk in data.chunks_exact(2) {
                    let c = u16::from_le_bytes([chunk[0], chunk[1]]);
                    let r = (((c >> 10) & 0x1f) << 3) as u8;
                    let g = (((c >> 5) & 0x1f) << 3) as u8;
                    let b = ((c & 0x1f) << 3) as u8;
                    out.push(Color::rgb(r, g, b));
                }
            }
            24 => {
                for bgr in data.chunks_exact(3) {
                    out.push(Color::rgb(bgr[2], bgr[1], bgr[0]));
                }
            }
            32 => {
                for bgra in data.chunks_exact(4) {
                    let a = if self.preserve_alpha { bgra[3] } else { 255 };
                    out.push(Color::rgba(bgra[2], bgra[1], bgra[0], a));
                }
            }
            other => return Err(BmpError::unsupported(format!("bit depth {}", other))),
        }

        Ok(())
    }
}

/// Decode a BMP with default options
pub fn decode_bmp(data: &[u8]) -> BmpResult<PixelGrid> {
    BmpDecoder::new().decode(data)
}

fn parse_magic(input: &[u8]) -> BmpResult<&[u8]> {
    let result: IResult<&[u8], &[u8]> = tag(&MAGIC_MARKER[..])(input);
    result
        .map(|(rest, _)| rest)
        .map_err(|_| BmpError::format("BMP magic marker not found"))
}

/// File size, two reserved words and the pixel data offset. The offset is
/// not trusted; the pixel data is located by walking the structures.
fn skip_file_header(input: &[u8]) -> BmpResult<&[u8]> {
    let result: IResult<&[u8], &[u8]> = take(FILE_HEADER_SIZE)(input);
    result
        .map(|(rest, _)| rest)
        .map_err(|_| BmpError::Truncated { width: 0, height: 0 })
}

fn parse_dib_header(input: &[u8]) -> BmpResult<(&[u8], DibHeader)> {
    let truncated = |_: nom::Err<nom::error::Error<&[u8]>>| BmpError::Truncated {
        width: 0,
        height: 0,
    };
    let (input, size) = le_u32(input).map_err(truncated)?;

    match size {
        BITMAPCOREHEADER => core_header(input).map_err(truncated),
        BITMAPINFOHEADER => info_header(input).map_err(truncated),
        BITMAPCOREHEADER2 | BITMAPV4HEADER | BITMAPV5HEADER => Err(BmpError::unsupported(format!(
            "DIB header (size: {})",
            size
        ))),
        _ => Err(BmpError::unsupported(format!(
            "unknown DIB header (size: {})",
            size
        ))),
    }
}

fn core_header(input: &[u8]) -> IResult<&[u8], DibHeader> {
    let (input, width) = le_i16(input)?;
    let (input, height) = le_i16(input)?;
    let (input, _planes) = le_u16(input)?;
    let (input, bits_per_pixel) = le_u16(input)?;

    Ok((
        input,
        DibHeader {
            kind: HeaderKind::Core,
            width: i32::from(width),
            height: i32::from(height),
            bits_per_pixel,
            compression: None,
            palette_colors: None,
        },
    ))
}

fn info_header(input: &[u8]) -> IResult<&[u8], DibHeader> {
    let (input, width) = le_i32(input)?;
    let (input, height) = le_i32(input)?;
    let (input, _planes) = le_u16(input)?;
    let (input, bits_per_pixel) = le_u16(input)?;
    let (input, compression) = le_u32(input)?;
    let (input, _image_size) = le_u32(input)?;
    let (input, _h_res) = le_i32(input)?;
    let (input, _v_res) = le_i32(input)?;
    let (input, palette_colors) = le_u32(input)?;
    let (input, _important_colors) = le_u32(input)?;

    Ok((
        input,
        DibHeader {
            kind: HeaderKind::Info,
            width,
            height,
            bits_per_pixel,
            compression: Some(compression),
            palette_colors: Some(palette_colors),
        },
    ))
}

/// Palette entries are stored B, G, R (, reserved) and returned as RGB
fn parse_palette(mut input: &[u8], kind: HeaderKind, len: usize) -> IResult<&[u8], Vec<Color>> {
    let mut palette = Vec::with_capacity(len.min(256));
    for _ in 0..len {
        let (rest, b) = byte(input)?;
        let (rest, g) = byte(rest)?;
        let (rest, r) = byte(rest)?;
        let (rest, _) = take(kind.palette_entry_size() - 3)(rest)?;
        palette.push(Color::rgb(r, g, b));
        input = rest;
    }
    Ok((input, palette))
}

fn take_row(input: &[u8], size: usize) -> IResult<&[u8], &[u8]> {
    take(size)(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a Windows V3 BMP from raw rows (already padded)
    fn info_bmp(width: i32, height: i32, bpp: u16, palette: &[[u8; 4]], rows: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&0u32.to_le_bytes()); // file size, ignored
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // pixel offset, ignored
        data.extend_from_slice(&BITMAPINFOHEADER.to_le_bytes());
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&bpp.to_le_bytes());
        data.extend_from_slice(&BI_RGB.to_le_bytes());
        data.extend_from_slice(&(rows.len() as u32).to_le_bytes());
        data.extend_from_slice(&2835i32.to_le_bytes());
        data.extend_from_slice(&2835i32.to_le_bytes());
        data.extend_from_slice(&(palette.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        for entry in palette {
            data.extend_from_slice(entry);
        }
        data.extend_from_slice(rows);
        data
    }

    /// Assemble an OS/2 v1 BMP from raw rows (already padded)
    fn core_bmp(width: i16, height: i16, bpp: u16, palette: &[[u8; 3]], rows: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&[0u8; FILE_HEADER_SIZE]);
        data.extend_from_slice(&BITMAPCOREHEADER.to_le_bytes());
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&bpp.to_le_bytes());
        for entry in palette {
            data.extend_from_slice(entry);
        }
        data.extend_from_slice(rows);
        data
    }

    const RED: Color = Color::rgb(255, 0, 0);
    const GREEN: Color = Color::rgb(0, 255, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);
    const WHITE: Color = Color::WHITE;

    #[test]
    fn test_missing_magic_marker() {
        let mut data = info_bmp(1, 1, 24, &[], &[0, 0, 0, 0]);
        data[0] = b'X';
        assert!(matches!(decode_bmp(&data), Err(BmpError::Format(_))));
        assert!(matches!(decode_bmp(b"B"), Err(BmpError::Format(_))));
        assert!(matches!(decode_bmp(&[]), Err(BmpError::Format(_))));
    }

    #[test]
    fn test_unsupported_dib_headers() {
        for size in [BITMAPCOREHEADER2, BITMAPV4HEADER, BITMAPV5HEADER, 56] {
            let mut data = info_bmp(1, 1, 24, &[], &[0, 0, 0, 0]);
            data[14..18].copy_from_slice(&size.to_le_bytes());
            assert!(
                matches!(decode_bmp(&data), Err(BmpError::UnsupportedFormat(_))),
                "header size {}",
                size
            );
        }
    }

    #[test]
    fn test_unsupported_compression() {
        let mut data = info_bmp(1, 1, 8, &[[0, 0, 0, 0]], &[0, 0, 0, 0]);
        // BI_RLE8
        data[30..34].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(decode_bmp(&data), Err(BmpError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_unsupported_bit_depths() {
        for bpp in [2u16, 0, 12, 48] {
            let data = info_bmp(1, 1, bpp, &[], &[0; 8]);
            assert!(
                matches!(decode_bmp(&data), Err(BmpError::UnsupportedFormat(_))),
                "bit depth {}",
                bpp
            );
        }
    }

    #[test]
    fn test_scenario_24bpp_bottom_up() {
        // File rows: bottom row (red, green) then top row (blue, white), each padded to 8 bytes
        let rows = [
            0, 0, 255, 0, 255, 0, 0, 0, //
            255, 0, 0, 255, 255, 255, 0, 0,
        ];
        let grid = decode_bmp(&info_bmp(2, 2, 24, &[], &rows)).unwrap();

        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.pixels(), &[BLUE, WHITE, RED, GREEN]);
    }

    #[test]
    fn test_negative_height_is_top_down() {
        let rows = [
            0, 0, 255, 0, 255, 0, 0, 0, //
            255, 0, 0, 255, 255, 255, 0, 0,
        ];
        let grid = decode_bmp(&info_bmp(2, -2, 24, &[], &rows)).unwrap();
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.pixels(), &[RED, GREEN, BLUE, WHITE]);
    }

    #[test]
    fn test_row_padding_is_skipped() {
        // 3x2 at 24bpp: 9 data bytes per row padded to 12
        let mut rows = Vec::new();
        for (row, pad) in [(0u8, 0xAAu8), (1, 0x55)] {
            for x in 0..3u8 {
                rows.extend_from_slice(&[x, row, 10 * x + row]);
            }
            rows.extend_from_slice(&[pad; 3]);
        }
        assert_eq!(row_stride(3, 24), Some(12));
        assert_eq!(rows.len(), 24);

        let grid = decode_bmp(&info_bmp(3, 2, 24, &[], &rows)).unwrap();
        for x in 0..3u8 {
            // File row 1 is the top row
            assert_eq!(grid.get(x as u32, 0), Some(Color::rgb(10 * x + 1, 1, x)));
            assert_eq!(grid.get(x as u32, 1), Some(Color::rgb(10 * x, 0, x)));
        }
    }

    #[test]
    fn test_1bpp_palette() {
        // 10 pixels wide: two data bytes, two padding bytes
        let palette = [[0, 0, 0, 0], [255, 255, 255, 0]];
        let rows = [0b1010_0000, 0b1100_0000, 0xFF, 0xFF];
        let grid = decode_bmp(&info_bmp(10, 1, 1, &palette, &rows)).unwrap();

        let expected: Vec<Color> = [1, 0, 1, 0, 0, 0, 0, 0, 1, 1]
            .iter()
            .map(|&bit| if bit == 1 { WHITE } else { Color::BLACK })
            .collect();
        assert_eq!(grid.pixels(), expected.as_slice());
    }

    #[test]
    fn test_1bpp_default_palette_size() {
        // Declared palette count of zero means two entries for 1bpp
        let palette = [[0, 0, 255, 0], [255, 0, 0, 0]];
        let mut data = info_bmp(2, 1, 1, &palette, &[0b0100_0000, 0, 0, 0]);
        data[46..50].copy_from_slice(&0u32.to_le_bytes());
        let grid = decode_bmp(&data).unwrap();
        assert_eq!(grid.pixels(), &[RED, BLUE]);
    }

    #[test]
    fn test_4bpp_odd_width() {
        let palette: Vec<[u8; 4]> = (0..16u8).map(|i| [i, i, i, 0]).collect();
        // 3 pixels: 0x12 -> 1, 2 ; 0x3F -> 3, low nibble dropped
        let rows = [0x12, 0x3F, 0, 0];
        let grid = decode_bmp(&info_bmp(3, 1, 4, &palette, &rows)).unwrap();
        let values: Vec<u8> = grid.pixels().iter().map(|c| c.r).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_8bpp_palette_bounds() {
        let palette = [[0, 0, 0, 0], [10, 20, 30, 0]];
        let grid = decode_bmp(&info_bmp(2, 1, 8, &palette, &[1, 0, 0, 0])).unwrap();
        assert_eq!(grid.pixels(), &[Color::rgb(30, 20, 10), Color::BLACK]);

        let data = info_bmp(2, 1, 8, &palette, &[5, 0, 0, 0]);
        match decode_bmp(&data) {
            Err(BmpError::Malformed { width, height, .. }) => assert_eq!((width, height), (2, 1)),
            other => panic!("expected malformed data, got {:?}", other),
        }

        let grid = BmpDecoder::new().decode_or_empty(&data).unwrap();
        assert!(grid.is_empty());
        assert_eq!((grid.width(), grid.height()), (2, 1));
    }

    #[test]
    fn test_1bpp_palette_index_out_of_range() {
        // One declared entry, second pixel uses index 1
        let data = info_bmp(2, 1, 1, &[[0, 0, 0, 0]], &[0b0100_0000, 0, 0, 0]);
        assert!(matches!(decode_bmp(&data), Err(BmpError::Malformed { .. })));
        assert!(BmpDecoder::new().decode_or_empty(&data).unwrap().is_empty());
    }

    #[test]
    fn test_4bpp_palette_index_out_of_range() {
        let palette = [[0, 0, 0, 0], [1, 1, 1, 0]];
        let data = info_bmp(2, 1, 4, &palette, &[0x1F, 0, 0, 0]);
        assert!(matches!(decode_bmp(&data), Err(BmpError::Malformed { .. })));

        let grid = BmpDecoder::new().decode_or_empty(&data).unwrap();
        assert!(grid.is_empty());
        assert_eq!((grid.width(), grid.height()), (2, 1));
    }

    #[test]
    fn test_negative_width_is_malformed() {
        let data = info_bmp(-2, 1, 24, &[], &[0; 8]);
        match decode_bmp(&data) {
            Err(BmpError::Malformed { width, height, .. }) => assert_eq!((width, height), (2, 1)),
            other => panic!("expected malformed data, got {:?}", other),
        }

        let grid = BmpDecoder::new().decode_or_empty(&data).unwrap();
        assert!(grid.is_empty());
        assert_eq!((grid.width(), grid.height()), (2, 1));
    }

    #[test]
    fn test_soft_fail_keeps_marker_and_unsupported_errors() {
        let decoder = BmpDecoder::new();
        assert!(matches!(decoder.decode_or_empty(b"XX"), Err(BmpError::Format(_))));

        let data = info_bmp(1, 1, 2, &[], &[0; 4]);
        assert!(matches!(
            decoder.decode_or_empty(&data),
            Err(BmpError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_4bpp_default_palette_size() {
        // Declared count of zero means 16 entries; a shorter read would
        // shift the pixel data
        let palette: Vec<[u8; 4]> = (0..16u8).map(|i| [i * 10, 0, 0, 0]).collect();
        let mut data = info_bmp(2, 1, 4, &palette, &[0x0F, 0, 0, 0]);
        data[46..50].copy_from_slice(&0u32.to_le_bytes());
        let grid = decode_bmp(&data).unwrap();
        assert_eq!(grid.pixels(), &[Color::rgb(0, 0, 0), Color::rgb(0, 0, 150)]);
    }

    #[test]
    fn test_8bpp_default_palette_size() {
        let palette: Vec<[u8; 4]> = (0..=255u8).map(|i| [i, i, i, 0]).collect();
        let mut data = info_bmp(2, 1, 8, &palette, &[7, 200, 0, 0]);
        data[46..50].copy_from_slice(&0u32.to_le_bytes());
        let grid = decode_bmp(&data).unwrap();
        assert_eq!(grid.pixels(), &[Color::rgb(7, 7, 7), Color::rgb(200, 200, 200)]);
    }

    #[test]
    fn test_16bpp_expansion() {
        // X1R5G5B5: r=31, g=16, b=1
        let value: u16 = (31 << 10) | (16 << 5) | 1;
        let bytes = value.to_le_bytes();
        let grid = decode_bmp(&info_bmp(1, 1, 16, &[], &[bytes[0], bytes[1], 0, 0])).unwrap();
        assert_eq!(grid.pixels(), &[Color::rgb(248, 128, 8)]);
    }

    #[test]
    fn test_32bpp_alpha() {
        let rows = [10, 20, 30, 0];
        let data = info_bmp(1, 1, 32, &[], &rows);

        let grid = decode_bmp(&data).unwrap();
        assert_eq!(grid.pixels(), &[Color::rgb(30, 20, 10)]);

        let grid = BmpDecoder::new().preserve_alpha(true).decode(&data).unwrap();
        assert_eq!(grid.pixels(), &[Color::rgba(30, 20, 10, 0)]);
    }

    #[test]
    fn test_os2_header_with_palette() {
        // OS/2 v1 always stores the full 256-entry palette for 8bpp
        let mut palette = vec![[0u8; 3]; 256];
        palette[0] = [0, 0, 255];
        palette[1] = [0, 255, 0];
        // 2x2 at 8bpp, rows padded to 4 bytes; bottom row first
        let rows = [0, 1, 0, 0, 1, 1, 0, 0];
        let grid = decode_bmp(&core_bmp(2, 2, 8, &palette, &rows)).unwrap();
        assert_eq!(grid.pixels(), &[GREEN, GREEN, RED, GREEN]);
    }

    #[test]
    fn test_os2_1bpp() {
        let palette = [[0, 0, 0], [255, 255, 255]];
        let grid = decode_bmp(&core_bmp(3, 1, 1, &palette, &[0b1010_0000, 0, 0, 0])).unwrap();
        assert_eq!(grid.pixels(), &[WHITE, Color::BLACK, WHITE]);
    }

    #[test]
    fn test_os2_4bpp() {
        let palette: Vec<[u8; 3]> = (0..16u8).map(|i| [i, i, i]).collect();
        let grid = decode_bmp(&core_bmp(2, 1, 4, &palette, &[0x3A, 0, 0, 0])).unwrap();
        let values: Vec<u8> = grid.pixels().iter().map(|c| c.r).collect();
        assert_eq!(values, vec![3, 10]);
    }

    #[test]
    fn test_os2_24bpp() {
        let rows = [
            0, 0, 255, 0, 255, 0, 0, 0, //
            255, 0, 0, 255, 255, 255, 0, 0,
        ];
        let grid = decode_bmp(&core_bmp(2, 2, 24, &[], &rows)).unwrap();
        assert_eq!(grid.pixels(), &[BLUE, WHITE, RED, GREEN]);
    }

    #[test]
    fn test_os2_negative_height_is_top_down() {
        let rows = [
            0, 0, 255, 0, 255, 0, 0, 0, //
            255, 0, 0, 255, 255, 255, 0, 0,
        ];
        let grid = decode_bmp(&core_bmp(2, -2, 24, &[], &rows)).unwrap();
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.pixels(), &[RED, GREEN, BLUE, WHITE]);
    }

    #[test]
    fn test_planes_field_is_ignored() {
        let mut data = info_bmp(1, 1, 24, &[], &[0, 0, 255, 0]);
        data[26..28].copy_from_slice(&0u16.to_le_bytes());
        assert_eq!(decode_bmp(&data).unwrap().pixels(), &[RED]);
    }

    #[test]
    fn test_truncated_pixel_data() {
        let data = info_bmp(2, 2, 24, &[], &[0, 0, 255, 0, 255, 0, 0, 0, 255]);
        match decode_bmp(&data) {
            Err(BmpError::Truncated { width, height }) => assert_eq!((width, height), (2, 2)),
            other => panic!("expected truncation, got {:?}", other),
        }

        let grid = BmpDecoder::new().decode_or_empty(&data).unwrap();
        assert!(grid.is_empty());
        assert_eq!((grid.width(), grid.height()), (2, 2));
    }

    #[test]
    fn test_truncated_header() {
        let data = info_bmp(2, 2, 24, &[], &[]);
        assert!(matches!(decode_bmp(&data[..20]), Err(BmpError::Truncated { .. })));

        let grid = BmpDecoder::new().decode_or_empty(&data[..20]).unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_missing_final_padding_is_tolerated() {
        // Final row lacks its two padding bytes
        let rows = [0, 0, 255, 0, 255, 0, 0, 0, 255, 0, 0, 255, 255, 255];
        let grid = decode_bmp(&info_bmp(2, 2, 24, &[], &rows)).unwrap();
        assert_eq!(grid.pixels(), &[BLUE, WHITE, RED, GREEN]);
    }

    #[test]
    fn test_decode_reader() {
        let rows = [0, 0, 255, 0];
        let data = info_bmp(1, 1, 24, &[], &rows);
        let grid = BmpDecoder::new().decode_reader(std::io::Cursor::new(data)).unwrap();
        assert_eq!(grid.pixels(), &[RED]);
    }

    #[test]
    fn test_row_sizes() {
        assert_eq!(row_data_size(3, 24), Some(9));
        assert_eq!(row_stride(3, 24), Some(12));
        assert_eq!(row_data_size(10, 1), Some(2));
        assert_eq!(row_stride(10, 1), Some(4));
        assert_eq!(row_data_size(3, 4), Some(2));
        assert_eq!(row_stride(33, 1), Some(8));
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_row_sizes_overflow() {
        assert_eq!(row_data_size(1 << 27, 32), None);
        assert_eq!(row_stride(1 << 27, 32), None);
    }

    #[test]
    fn test_huge_dimensions_are_truncated() {
        // width * 32 bits wraps a 32-bit usize; must fail cleanly everywhere
        let data = info_bmp(1 << 27, 32, 32, &[], &[0; 16]);
        match decode_bmp(&data) {
            Err(BmpError::Truncated { width, height }) => assert_eq!((width, height), (1 << 27, 32)),
            other => panic!("expected truncation, got {:?}", other),
        }
        assert!(BmpDecoder::new().decode_or_empty(&data).unwrap().is_empty());
    }
}
