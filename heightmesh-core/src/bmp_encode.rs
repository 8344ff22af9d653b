/// BMP writer: uncompressed 24bpp with an OS/2 v1 core header
use std::io::Write;

use crate::bmp::{row_data_size, row_stride, BITMAPCOREHEADER, FILE_HEADER_SIZE, MAGIC_MARKER};
use crate::error::{BmpError, BmpResult};
use crate::grid::PixelGrid;

const BITS_PER_PIXEL: u16 = 24;

/// Core header fields after the size word: width, height, planes, bit count
const CORE_HEADER_FIELDS: usize = 8;

/// Write `grid` as a BMP. Alpha is not stored.
pub fn write_bmp<W: Write>(grid: &PixelGrid, writer: &mut W) -> BmpResult<()> {
    if grid.is_empty() && grid.pixel_count() > 0 {
        return Err(BmpError::malformed(
            grid.width(),
            grid.height(),
            "cannot encode a grid without pixel data",
        ));
    }
    let max = i16::MAX as u32;
    if grid.width() > max || grid.height() > max {
        return Err(BmpError::unsupported(format!(
            "{}x{} exceeds the OS/2 header limit of {} pixels",
            grid.width(),
            grid.height(),
            max
        )));
    }

    let too_large = || BmpError::unsupported(format!("{}x{} is too large", grid.width(), grid.height()));
    let stride = row_stride(grid.width(), BITS_PER_PIXEL).ok_or_else(too_large)?;
    let padding = stride - row_data_size(grid.width(), BITS_PER_PIXEL).ok_or_else(too_large)?;
    let pixel_offset = MAGIC_MARKER.len() + FILE_HEADER_SIZE + 4 + CORE_HEADER_FIELDS;
    let file_size = stride
        .checked_mul(grid.height() as usize)
        .and_then(|size| size.checked_add(pixel_offset))
        .and_then(|size| u32::try_from(size).ok())
        .ok_or_else(too_large)?;

    let mut header = Vec::with_capacity(pixel_offset);
    header.extend_from_slice(MAGIC_MARKER);
    header.extend_from_slice(&file_size.to_le_bytes());
    header.extend_from_slice(&0u16.to_le_bytes());
    header.extend_from_slice(&0u16.to_le_bytes());
    header.extend_from_slice(&(pixel_offset as u32).to_le_bytes());
    header.extend_from_slice(&BITMAPCOREHEADER.to_le_bytes());
    header.extend_from_slice(&(grid.width() as i16).to_le_bytes());
    header.extend_from_slice(&(grid.height() as i16).to_le_bytes());
    header.extend_from_slice(&1u16.to_le_bytes());
    header.extend_from_slice(&BITS_PER_PIXEL.to_le_bytes());
    writer.write_all(&header)?;

    // Bottom row first
    let mut row = Vec::with_capacity(stride);
    for pixels in grid.rows().rev() {
        row.clear();
        for color in pixels {
            row.extend_from_slice(&[color.b, color.g, color.r]);
        }
        row.resize(row.len() + padding, 0);
        writer.write_all(&row)?;
    }

    Ok(())
}

/// Encode `grid` into an in-memory BMP file
pub fn encode_bmp(grid: &PixelGrid) -> BmpResult<Vec<u8>> {
    let mut data = Vec::new();
    write_bmp(grid, &mut data)?;
    Ok(data)
}
