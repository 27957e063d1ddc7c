#![allow(dead_code)]
use libimg264::{codec::write_record, image::raw::header::BmpHeader, stride};

/// Builds a 24-bit bitmap whose pixels are given as `[b, g, r]` triples, row by row, in the
/// order they are stored in the file
pub fn bmp_from_bgr(width: u32, rows: &[&[[u8; 3]]]) -> Vec<u8> {
    let height = u32::try_from(rows.len()).unwrap();
    let header = BmpHeader::for_gray(width, height).unwrap();
    let mut out = Vec::new();
    write_record(&mut out, &header).unwrap();
    let row_len = stride(24, width);
    for row in rows {
        let mut buf: Vec<u8> = row.iter().flatten().copied().collect();
        buf.resize(row_len, 0);
        out.extend_from_slice(&buf);
    }
    out
}
