//! # libimg264
//!
//!
//! This library provides datatypes and i/o functionality for two small binary image formats:
//! uncompressed 24-bit windows bitmaps (BMP), and the flat "264" grayscale image container,
//! together with the linear normalization (contrast stretching) used to post-process them.
//!
//! It aims to provide a minimal, low-level API to build upon. Both headers are plain
//! fixed-size records exposed in the [`crate::image::raw`] module; the responsibility of
//! creating "valid" headers is placed on the users of this crate.
//!
//! ### File formats
//!
//! All multi-byte values are little-endian and no format has any struct padding.
//!
//! - **BMP**: a 54 byte header (14 byte file header followed by a `BITMAPINFOHEADER`), then
//!   24-bit `[b, g, r]` pixels starting at the recorded data offset, each row padded to a
//!   multiple of 4 bytes. Only uncompressed, single plane, 24-bit bitmaps are supported.
//! - **264 image**: a 16 byte header (magic `264!`, width, height, comment length), the
//!   comment (no terminator), one filler byte, then `width * height` gray samples without row
//!   padding.
//!
//! ### Limitations
//!
//! Bitmaps are nominally stored bottom-up. This library keeps rows in the order they are
//! stored, on read and on write, so a bitmap converted to a 264 image and back keeps its
//! byte order, but a 264 image converted from a bitmap is upside down compared to what
//! an image viewer would show for the bitmap.
//!
//! ### Usage
//!
//! #### Normalizing a bitmap into a 264 image
//!
//! ```rust
//! use libimg264::Image;
//!
//! fn main() -> Result<(), libimg264::Error> {
//!     let mut img = Image::new(3, 1, "Original BMP file: ramp.bmp", vec![10, 20, 30])?;
//!     img.normalize();
//!     assert_eq!(img.pixels(), [0, 127, 255]);
//!
//!     let mut out = Vec::new();
//!     img.write_to(&mut out)?;
//!     let img = Image::from_reader(&out[..])?;
//!     assert_eq!(img.pixels(), [0, 127, 255]);
//!     Ok(())
//! }
//! ```
//!
//! #### Reading and writing header records directly
//!
//! ```rust
//! use libimg264::{
//!     codec::{read_record, write_record},
//!     image::raw::header::BmpHeader,
//! };
//!
//! fn main() -> Result<(), libimg264::Error> {
//!     let header = BmpHeader::for_gray(5, 2)?;
//!     let mut bytes = Vec::new();
//!     write_record(&mut bytes, &header)?;
//!     assert_eq!(bytes.len(), BmpHeader::SIZE);
//!
//!     let back: BmpHeader = read_record(&mut &bytes[..])?;
//!     assert!(back.is_supported());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

mod error;
/// Module containing the [`Image`] type and the codecs of both file formats
pub mod image;
mod serde;

/// Generic fixed-layout record reading and writing, used for both headers
pub mod codec {
    pub use crate::serde::{
        read_record, write_record, FieldSpec, Fields, Layout, Record, Value, Width,
    };
}

pub use crate::image::bitmap::{decode_bgr24, stride, write_bgr24_rows, write_gray8_rows};
pub use crate::image::comment::{
    bmp_provenance, strip_token, BMP_COMMENT_PREFIX, UNNORMALIZED_SUFFIX,
};
pub use crate::image::normalize::{linear_normalize, Extent};
pub use crate::image::Format;
pub use crate::image::Image;
pub use error::Error;
