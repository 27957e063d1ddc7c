use itertools::Itertools;
use std::io::Write;

use crate::Error;

/// Bytes per row of `bits` per pixel data, rounded up to a multiple of 4
#[must_use]
pub fn stride(bits: u16, width: u32) -> usize {
    let row_bits = usize::from(bits) * width as usize;
    row_bits.div_ceil(32) * 4
}

/// Number of samples in a `width` x `height` image
pub(crate) fn pixel_count(width: u32, height: u32) -> Result<usize, Error> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::InvalidDimensions {
            width: i64::from(width),
            height: i64::from(height),
        })
}

/// Allocates an empty buffer able to hold `len` bytes without reallocating
pub(crate) fn alloc_pixels(len: usize) -> Result<Vec<u8>, Error> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure { bytes: len })?;
    Ok(pixels)
}

// average of the three channels, truncated
fn intensity(b: u8, g: u8, r: u8) -> u8 {
    let sum = u16::from(b) + u16::from(g) + u16::from(r);
    u8::try_from(sum / 3).unwrap_or(u8::MAX)
}

/// Decodes padded 24-bit BGR rows into one gray sample per pixel
///
/// Rows are located with the padded [`stride`], only the first `3 * width` bytes of each row
/// are read. The output keeps the row order of `raw`.
///
/// # Errors
///
/// Returns [`Error::TruncatedPixelData`] if `raw` holds fewer than `stride * height` bytes and
/// [`Error::AllocationFailure`] if the output cannot be allocated.
pub fn decode_bgr24(raw: &[u8], width: u32, height: u32) -> Result<Vec<u8>, Error> {
    let row_len = stride(24, width);
    let expected = row_len
        .checked_mul(height as usize)
        .ok_or_else(|| Error::InvalidDimensions {
            width: i64::from(width),
            height: i64::from(height),
        })?;
    if raw.len() < expected {
        return Err(Error::TruncatedPixelData {
            expected,
            actual: raw.len(),
        });
    }
    let mut gray = alloc_pixels(pixel_count(width, height)?)?;
    if row_len == 0 {
        return Ok(gray);
    }
    let meaningful = 3 * width as usize;
    for row in raw.chunks_exact(row_len).take(height as usize) {
        gray.extend(
            row[..meaningful]
                .iter()
                .tuples::<(_, _, _)>()
                .map(|(&b, &g, &r)| intensity(b, g, r)),
        );
    }
    Ok(gray)
}

/// Writes gray samples as padded 24-bit rows, each sample copied into blue, green and red
///
/// Padding bytes are always zero.
///
/// # Errors
///
/// Returns [`Error::IncompleteWrite`] if a row cannot be written.
pub fn write_bgr24_rows(w: &mut impl Write, pixels: &[u8], width: u32) -> Result<(), Error> {
    let row_len = stride(24, width);
    if row_len == 0 {
        return Ok(());
    }
    let mut buf = alloc_pixels(row_len)?;
    buf.resize(row_len, 0);
    for row in pixels.chunks_exact(width as usize) {
        for (&sample, bgr) in row.iter().zip(buf.chunks_exact_mut(3)) {
            bgr.fill(sample);
        }
        w.write_all(&buf).map_err(|source| Error::IncompleteWrite {
            section: "pixel data",
            source,
        })?;
    }
    Ok(())
}

/// Writes gray samples one byte per pixel, without row padding
///
/// # Errors
///
/// Returns [`Error::IncompleteWrite`] if a row cannot be written.
pub fn write_gray8_rows(w: &mut impl Write, pixels: &[u8], width: u32) -> Result<(), Error> {
    if width == 0 {
        return Ok(());
    }
    for row in pixels.chunks_exact(width as usize) {
        w.write_all(row).map_err(|source| Error::IncompleteWrite {
            section: "pixel data",
            source,
        })?;
    }
    Ok(())
}
