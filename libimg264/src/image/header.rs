use bon::Builder;
use std::fmt::{self, Display};

use crate::{
    serde::{FieldSpec, Fields, Layout, Record, Value, Width},
    Error,
};

use super::bitmap::stride;

/// Magic number of a windows bitmap file (`BM`)
pub const BMP_MAGIC: u16 = 0x4d42;
/// Magic number of a 264 image container file (`264!`)
pub const CONTAINER_MAGIC: u32 = 0x2134_3632;
/// Horizontal and vertical resolution written to bitmaps, in pixels per meter
pub const DEFAULT_RESOLUTION: i32 = 3780;

/// The only bit depth this crate decodes and encodes
pub(crate) const BGR24_BITS: u16 = 24;
const FILE_HEADER_SIZE: u32 = 14;

/// Combined bitmap file header and `BITMAPINFOHEADER`
///
/// ## Note
///
/// As with the other types exposed by the [`super::raw`] module, the validity of this type must be
/// guaranteed by the user. Use [`BmpHeader::validate`] to check that a header describes a bitmap
/// this crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[non_exhaustive]
pub struct BmpHeader {
    /// Magic identifier, must be [`BMP_MAGIC`]
    #[builder(default = BMP_MAGIC)]
    pub kind: u16,
    /// File size in bytes
    #[builder(default)]
    pub file_size: u32,
    /// Not used
    #[builder(default)]
    pub reserved1: u16,
    /// Not used
    #[builder(default)]
    pub reserved2: u16,
    /// Offset to the pixel data in bytes
    #[builder(default = BmpHeader::SIZE_U32)]
    pub pixel_offset: u32,
    /// Size of the info header in bytes
    #[builder(default = BmpHeader::SIZE_U32 - FILE_HEADER_SIZE)]
    pub header_size: u32,
    /// Width of the image
    pub width: i32,
    /// Height of the image
    pub height: i32,
    /// Number of color planes, must be 1
    #[builder(default = 1)]
    pub planes: u16,
    /// Bits per pixel, must be 24
    #[builder(default = BGR24_BITS)]
    pub bits_per_pixel: u16,
    /// Compression type, must be 0 (none)
    #[builder(default)]
    pub compression: u32,
    /// Size of the pixel data in bytes
    #[builder(default)]
    pub image_size: u32,
    /// Pixels per meter
    #[builder(default = DEFAULT_RESOLUTION)]
    pub x_resolution: i32,
    /// Pixels per meter
    #[builder(default = DEFAULT_RESOLUTION)]
    pub y_resolution: i32,
    /// Number of colors
    #[builder(default)]
    pub palette_colors: u32,
    /// Important colors (0: all of them)
    #[builder(default)]
    pub important_colors: u32,
}

impl BmpHeader {
    /// Size of the header record on disk
    pub const SIZE: usize = <Self as Record>::LAYOUT.size();
    #[allow(clippy::cast_possible_truncation)]
    const SIZE_U32: u32 = Self::SIZE as u32;

    /// Builds the header for a 24-bit bitmap holding a `width` x `height` gray image
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the image is empty or too large for the format.
    pub fn for_gray(width: u32, height: u32) -> Result<Self, Error> {
        let invalid = || Error::InvalidDimensions {
            width: i64::from(width),
            height: i64::from(height),
        };
        let image_size = usize::try_from(height)
            .ok()
            .and_then(|h| stride(BGR24_BITS, width).checked_mul(h))
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(invalid)?;
        let file_size = image_size
            .checked_add(Self::SIZE_U32)
            .ok_or_else(invalid)?;
        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(invalid());
        };
        if w == 0 || h == 0 {
            return Err(invalid());
        }
        Ok(Self::builder()
            .file_size(file_size)
            .width(w)
            .height(h)
            .image_size(image_size)
            .palette_colors(1 << BGR24_BITS)
            .build())
    }

    /// Checks that this header describes an uncompressed, single plane, 24-bit bitmap
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] naming the first field that fails the check.
    pub fn validate(&self) -> Result<(), Error> {
        let (field, found) = if self.kind != BMP_MAGIC {
            ("magic", u32::from(self.kind))
        } else if self.bits_per_pixel != BGR24_BITS {
            ("bits per pixel", u32::from(self.bits_per_pixel))
        } else if self.planes != 1 {
            ("planes", u32::from(self.planes))
        } else if self.compression != 0 {
            ("compression", self.compression)
        } else {
            return Ok(());
        };
        Err(Error::UnsupportedFormat { field, found })
    }

    /// Returns `true` if [`Self::validate`] passes
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.validate().is_ok()
    }

    /// Returns width and height, which must both be positive
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] otherwise. Top-down bitmaps (negative height) are
    /// rejected here.
    pub fn dimensions(&self) -> Result<(u32, u32), Error> {
        positive_dimensions(self.width, self.height)
    }
}

impl Record for BmpHeader {
    const LAYOUT: Layout = Layout {
        name: "bitmap header",
        version: 1,
        fields: &[
            FieldSpec::le("type", Width::U16),
            FieldSpec::le("size", Width::U32),
            FieldSpec::le("reserved1", Width::U16),
            FieldSpec::le("reserved2", Width::U16),
            FieldSpec::le("offset", Width::U32),
            FieldSpec::le("header_size", Width::U32),
            FieldSpec::le("width", Width::I32),
            FieldSpec::le("height", Width::I32),
            FieldSpec::le("planes", Width::U16),
            FieldSpec::le("bits", Width::U16),
            FieldSpec::le("compression", Width::U32),
            FieldSpec::le("imagesize", Width::U32),
            FieldSpec::le("xresolution", Width::I32),
            FieldSpec::le("yresolution", Width::I32),
            FieldSpec::le("ncolors", Width::U32),
            FieldSpec::le("importantcolors", Width::U32),
        ],
    };

    fn from_fields(f: &mut Fields<'_>) -> Option<Self> {
        Some(Self {
            kind: f.u16()?,
            file_size: f.u32()?,
            reserved1: f.u16()?,
            reserved2: f.u16()?,
            pixel_offset: f.u32()?,
            header_size: f.u32()?,
            width: f.i32()?,
            height: f.i32()?,
            planes: f.u16()?,
            bits_per_pixel: f.u16()?,
            compression: f.u32()?,
            image_size: f.u32()?,
            x_resolution: f.i32()?,
            y_resolution: f.i32()?,
            palette_colors: f.u32()?,
            important_colors: f.u32()?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::U16(self.kind),
            Value::U32(self.file_size),
            Value::U16(self.reserved1),
            Value::U16(self.reserved2),
            Value::U32(self.pixel_offset),
            Value::U32(self.header_size),
            Value::I32(self.width),
            Value::I32(self.height),
            Value::U16(self.planes),
            Value::U16(self.bits_per_pixel),
            Value::U32(self.compression),
            Value::U32(self.image_size),
            Value::I32(self.x_resolution),
            Value::I32(self.y_resolution),
            Value::U32(self.palette_colors),
            Value::U32(self.important_colors),
        ]
    }
}

impl Display for BmpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "file type (should be {BMP_MAGIC:x}): {:x}", self.kind)?;
        writeln!(f, "file size: {}", self.file_size)?;
        writeln!(f, "offset to image data: {}", self.pixel_offset)?;
        writeln!(f, "header size: {}", self.header_size)?;
        writeln!(f, "width: {}", self.width)?;
        writeln!(f, "height: {}", self.height)?;
        writeln!(f, "planes: {}", self.planes)?;
        write!(f, "bits: {}", self.bits_per_pixel)
    }
}

/// Header of a 264 image container file
///
/// The header is followed by `comment_len` bytes of comment, one filler byte and
/// `width * height` gray samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[non_exhaustive]
pub struct ContainerHeader {
    /// Magic identifier, must be [`CONTAINER_MAGIC`]
    #[builder(default = CONTAINER_MAGIC)]
    pub magic: u32,
    /// Width of the image
    pub width: i32,
    /// Height of the image
    pub height: i32,
    /// Length of the comment in bytes, without any terminator
    #[builder(default)]
    pub comment_len: u32,
}

impl ContainerHeader {
    /// Size of the header record on disk
    pub const SIZE: usize = <Self as Record>::LAYOUT.size();

    /// Checks the magic number
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMagic`] if the magic number is not [`CONTAINER_MAGIC`].
    pub fn validate(&self) -> Result<(), Error> {
        if self.magic == CONTAINER_MAGIC {
            Ok(())
        } else {
            Err(Error::InvalidMagic {
                expected: CONTAINER_MAGIC,
                found: self.magic,
            })
        }
    }

    /// Returns width and height, which must both be positive
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] otherwise.
    pub fn dimensions(&self) -> Result<(u32, u32), Error> {
        positive_dimensions(self.width, self.height)
    }
}

impl Record for ContainerHeader {
    const LAYOUT: Layout = Layout {
        name: "image header",
        version: 1,
        fields: &[
            FieldSpec::le("magic_number", Width::U32),
            FieldSpec::le("width", Width::I32),
            FieldSpec::le("height", Width::I32),
            FieldSpec::le("comment_len", Width::U32),
        ],
    };

    fn from_fields(f: &mut Fields<'_>) -> Option<Self> {
        Some(Self {
            magic: f.u32()?,
            width: f.i32()?,
            height: f.i32()?,
            comment_len: f.u32()?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::U32(self.magic),
            Value::I32(self.width),
            Value::I32(self.height),
            Value::U32(self.comment_len),
        ]
    }
}

impl Display for ContainerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "file type (should be {CONTAINER_MAGIC:x}): {:x}",
            self.magic
        )?;
        writeln!(f, "width: {}", self.width)?;
        writeln!(f, "height: {}", self.height)?;
        write!(f, "comment length: {}", self.comment_len)
    }
}

fn positive_dimensions(width: i32, height: i32) -> Result<(u32, u32), Error> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(Error::InvalidDimensions {
            width: i64::from(width),
            height: i64::from(height),
        }),
    }
}
