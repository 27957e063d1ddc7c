#![allow(clippy::module_name_repetitions)]

pub(crate) mod bitmap;
pub(crate) mod comment;
pub(crate) mod header;
pub(crate) mod normalize;

/// Module containing raw header types
///
/// Types in this module are considered "unchecked", the responsibility
/// of upholding validity is on the user
pub mod raw {
    /// Contains the two on-disk header records
    pub mod header {
        pub use crate::image::header::{
            BmpHeader, ContainerHeader, BMP_MAGIC, CONTAINER_MAGIC, DEFAULT_RESOLUTION,
        };
    }
}

use crate::{
    serde::{
        read_record,
        utils::{ensure_exhausted, read_up_to},
        write_record,
    },
    Error,
};
use bitmap::{
    alloc_pixels, decode_bgr24, pixel_count, stride, write_bgr24_rows, write_gray8_rows,
};
use comment::{bmp_provenance, strip_token, UNNORMALIZED_SUFFIX};
use header::{BmpHeader, ContainerHeader, BGR24_BITS, CONTAINER_MAGIC};
use normalize::{linear_normalize, Extent};
use std::{
    borrow::Cow,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
    str::FromStr,
};
use strum::EnumString;
use tracing::{debug, error, info};

/// An 8-bit grayscale image with a free-text comment
///
/// Rows are kept in the order they are stored on disk. Bitmaps are nominally stored
/// bottom-up, but neither [`Image::from_bmp_reader`] nor [`Image::write_bmp_to`] reorders rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    comment: Vec<u8>,
    pixels: Vec<u8>,
}

/// The file formats an [`Image`] can be read from and written to
#[derive(Debug, Eq, PartialEq, Copy, Clone, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Format {
    /// Uncompressed 24-bit windows bitmap
    #[strum(serialize = "bmp")]
    Bmp,
    /// The flat 264 image container
    #[strum(serialize = "img", serialize = "ece")]
    Container,
}

impl Format {
    /// Guesses the format from the extension of `path`
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_str(ext).ok())
    }

    /// Guesses the format from the magic number at the start of `r`, then rewinds `r`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the stream cannot be read or rewound.
    pub fn detect(r: &mut (impl Read + Seek)) -> Result<Option<Self>, Error> {
        let start = read_up_to(r, 4)?;
        r.rewind()?;
        let format = if start.starts_with(&header::BMP_MAGIC.to_le_bytes()) {
            Some(Self::Bmp)
        } else if start == CONTAINER_MAGIC.to_le_bytes() {
            Some(Self::Container)
        } else {
            None
        };
        debug!("Detected format {format:?}");
        Ok(format)
    }
}

fn open_file(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|source| Error::FileOpen {
        path: path.to_owned(),
        source,
    })
}

fn create_file(path: &Path) -> Result<File, Error> {
    File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|source| Error::FileOpen {
            path: path.to_owned(),
            source,
        })
}

fn flush(mut w: impl Write) -> Result<(), Error> {
    w.flush().map_err(|source| Error::IncompleteWrite {
        section: "file",
        source,
    })
}

impl Image {
    /// Creates a new [`Image`]
    ///
    /// # Errors
    /// This function errors if width or height is zero, or if they don't match
    /// the length of `pixels`
    pub fn new(
        width: u32,
        height: u32,
        comment: impl Into<Vec<u8>>,
        pixels: Vec<u8>,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width: i64::from(width),
                height: i64::from(height),
            });
        }
        if pixel_count(width, height)? != pixels.len() {
            return Err(Error::MismatchWidthHeight {
                width_height: (width, height),
                pixel_length: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            comment: comment.into(),
            pixels,
        })
    }

    /// Returns the image width
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the comment bytes, exactly as they are stored
    #[must_use]
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    /// Returns the comment as text, invalid UTF-8 sequences replaced
    #[must_use]
    pub fn comment_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.comment)
    }

    /// Replaces the comment
    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) {
        self.comment = comment.into();
    }

    /// Returns the gray samples, row-major
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the gray samples mutably. The length cannot change.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Returns the row `y`, if it exists
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let width = self.width as usize;
        let start = (y as usize).checked_mul(width)?;
        self.pixels.get(start..start.checked_add(width)?)
    }

    /// Stretches the samples to the full 0-255 range, see [`linear_normalize`]
    pub fn normalize(&mut self) -> Extent {
        let extent = linear_normalize(&mut self.pixels);
        if extent.is_flat() {
            info!("Image is flat ({}), samples left unchanged", extent.min);
        } else {
            debug!("Stretched samples from {}..={}", extent.min, extent.max);
        }
        extent
    }

    fn signed_dimensions(&self) -> Result<(i32, i32), Error> {
        match (i32::try_from(self.width), i32::try_from(self.height)) {
            (Ok(w), Ok(h)) => Ok((w, h)),
            _ => Err(Error::InvalidDimensions {
                width: i64::from(self.width),
                height: i64::from(self.height),
            }),
        }
    }

    /// Tries to read a 24-bit bitmap from a buffer, converting it to gray
    ///
    /// `source` is the path the bitmap came from; its file name is recorded in the comment.
    ///
    /// # Errors
    ///
    /// This function will error if the underlying buffer is invalid data for any reason:
    /// - the header is truncated ([`Error::TruncatedHeader`])
    /// - the bitmap is not an uncompressed, single plane, 24-bit bitmap
    ///   ([`Error::UnsupportedFormat`])
    /// - width or height are not positive ([`Error::InvalidDimensions`])
    /// - the pixel data cannot be reached or is too short ([`Error::SeekFailure`],
    ///   [`Error::TruncatedPixelData`])
    /// - bytes follow the pixel data ([`Error::TrailingBytes`])
    pub fn from_bmp_reader(
        mut r: impl Read + Seek,
        source: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        let header: BmpHeader = read_record(&mut r)?;
        debug!("Bitmap header:\n{header}");
        header.validate()?;
        let (width, height) = header.dimensions()?;
        let comment = bmp_provenance(source.as_ref());

        let offset = u64::from(header.pixel_offset);
        r.seek(SeekFrom::Start(offset))
            .map_err(|source| Error::SeekFailure { offset, source })?;

        let expected = stride(BGR24_BITS, width)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::InvalidDimensions {
                width: i64::from(width),
                height: i64::from(height),
            })?;
        let raw = read_up_to(&mut r, expected)?;
        debug!("read {} of {expected} bytes of pixel data", raw.len());
        let pixels = decode_bgr24(&raw, width, height)?;
        drop(raw);

        ensure_exhausted(&mut r)?;
        Ok(Self {
            width,
            height,
            comment,
            pixels,
        })
    }

    /// Tries to read a 24-bit bitmap from a provided file path
    ///
    /// # Errors
    ///
    /// This function will error if the file cannot be opened or if the file contains invalid data.
    /// See [`Self::from_bmp_reader`] for potential errors
    pub fn from_bmp_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = open_file(path)?;
        let shown = path.display();
        Self::from_bmp_reader(BufReader::new(file), path)
            .inspect(|img| info!("Loaded {}x{} bitmap from {shown}", img.width, img.height))
            .inspect_err(|e| error!("Failed to load bitmap '{shown}': {e}"))
    }

    /// Tries to read a 264 image from a buffer
    ///
    /// # Errors
    ///
    /// This function will error if the underlying buffer is invalid data for any reason:
    /// - the header is truncated ([`Error::TruncatedHeader`])
    /// - the magic number is wrong ([`Error::InvalidMagic`])
    /// - width or height are not positive ([`Error::InvalidDimensions`])
    /// - the comment or pixel data are too short ([`Error::TruncatedComment`],
    ///   [`Error::TruncatedPixelData`])
    /// - bytes follow the pixel data ([`Error::TrailingBytes`])
    pub fn from_reader(mut r: impl Read) -> Result<Self, Error> {
        let header: ContainerHeader = read_record(&mut r)?;
        debug!("Image header:\n{header}");
        header.validate()?;
        let (width, height) = header.dimensions()?;

        let comment_len = header.comment_len as usize;
        let comment = read_up_to(&mut r, comment_len)?;
        if comment.len() < comment_len {
            return Err(Error::TruncatedComment {
                expected: comment_len,
                actual: comment.len(),
            });
        }

        let expected = pixel_count(width, height)?;
        // the filler byte between comment and pixels is not checked
        if read_up_to(&mut r, 1)?.is_empty() {
            return Err(Error::TruncatedPixelData {
                expected,
                actual: 0,
            });
        }
        let mut pixels = alloc_pixels(expected)?;
        let read = r.by_ref().take(expected as u64).read_to_end(&mut pixels)?;
        if read < expected {
            return Err(Error::TruncatedPixelData {
                expected,
                actual: read,
            });
        }

        ensure_exhausted(&mut r)?;
        Ok(Self {
            width,
            height,
            comment,
            pixels,
        })
    }

    /// Tries to read a 264 image from a provided file path
    ///
    /// # Errors
    ///
    /// This function will error if the file cannot be opened or if the file contains invalid data.
    /// See [`Self::from_reader`] for potential errors
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = open_file(path)?;
        let shown = path.display();
        Self::from_reader(BufReader::new(file))
            .inspect(|img| info!("Loaded {}x{} image from {shown}", img.width, img.height))
            .inspect_err(|e| error!("Failed to load image '{shown}': {e}"))
    }

    /// Reads a bitmap or a 264 image, depending on the magic number at the start of the file
    ///
    /// Files with an unknown magic number are read as 264 images, which then fails with
    /// [`Error::InvalidMagic`].
    ///
    /// # Errors
    ///
    /// See [`Self::from_bmp_reader`] and [`Self::from_reader`]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut r = BufReader::new(open_file(path)?);
        let result = match Format::detect(&mut r)? {
            Some(Format::Bmp) => Self::from_bmp_reader(r, path),
            Some(Format::Container) | None => Self::from_reader(r),
        };
        let shown = path.display();
        result
            .inspect(|img| info!("Loaded {}x{} image from {shown}", img.width, img.height))
            .inspect_err(|e| error!("Failed to load '{shown}': {e}"))
    }

    /// Serializes [`Self`] as a 264 image
    ///
    /// The stored comment is the in-memory comment passed through [`strip_token`] with
    /// [`UNNORMALIZED_SUFFIX`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompleteWrite`] if any section cannot be written
    pub fn write_to(&self, w: &mut impl Write) -> Result<(), Error> {
        let (width, height) = self.signed_dimensions()?;
        let comment = strip_token(&self.comment, UNNORMALIZED_SUFFIX);
        let comment_len = u32::try_from(comment.len()).map_err(|_| Error::IncompleteWrite {
            section: "comment",
            source: io::Error::new(io::ErrorKind::InvalidInput, "comment is too long"),
        })?;
        let header = ContainerHeader::builder()
            .width(width)
            .height(height)
            .comment_len(comment_len)
            .build();
        debug!("Writing image header:\n{header}");
        write_record(w, &header)?;
        w.write_all(&comment)
            .map_err(|source| Error::IncompleteWrite {
                section: "comment",
                source,
            })?;
        w.write_all(&[0]).map_err(|source| Error::IncompleteWrite {
            section: "filler byte",
            source,
        })?;
        write_gray8_rows(w, &self.pixels, self.width)
    }

    /// Attempts to serialize and save [`Self`] as a 264 image at the provided path
    ///
    /// # Errors
    ///
    /// This will error if unable to open and/or write to the provided filename
    pub fn into_file(self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let mut w = BufWriter::new(create_file(path)?);
        self.write_to(&mut w)
            .and_then(|()| flush(w))
            .inspect(|()| info!("Finished writing {}", path.display()))
            .inspect_err(|e| error!("Failed to write '{}': {e}", path.display()))
    }

    /// Serializes [`Self`] as an uncompressed 24-bit bitmap, every sample copied to blue, green
    /// and red. The comment is not stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompleteWrite`] if any section cannot be written
    pub fn write_bmp_to(&self, w: &mut impl Write) -> Result<(), Error> {
        let header = BmpHeader::for_gray(self.width, self.height)?;
        debug!("Writing bitmap header:\n{header}");
        write_record(w, &header)?;
        write_bgr24_rows(w, &self.pixels, self.width)
    }

    /// Attempts to serialize and save [`Self`] as a bitmap at the provided path
    ///
    /// # Errors
    ///
    /// This will error if unable to open and/or write to the provided filename
    pub fn into_bmp_file(self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let mut w = BufWriter::new(create_file(path)?);
        self.write_bmp_to(&mut w)
            .and_then(|()| flush(w))
            .inspect(|()| info!("Finished writing {}", path.display()))
            .inspect_err(|e| error!("Failed to write '{}': {e}", path.display()))
    }

    /// Saves [`Self`] at the provided path in the given [`Format`]
    ///
    /// # Errors
    ///
    /// See [`Self::into_file`] and [`Self::into_bmp_file`]
    pub fn save(self, path: impl AsRef<Path>, format: Format) -> Result<(), Error> {
        match format {
            Format::Bmp => self.into_bmp_file(path),
            Format::Container => self.into_file(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn bmp_bytes(width: i32, height: i32, rows: &[&[u8]]) -> Vec<u8> {
        let header = BmpHeader::builder().width(width).height(height).build();
        let mut out = Vec::new();
        write_record(&mut out, &header).unwrap();
        for row in rows {
            out.extend_from_slice(row);
        }
        out
    }

    #[test]
    fn new_checks_the_buffer_length() {
        assert!(Image::new(3, 2, "", vec![0; 6]).is_ok());
        assert!(matches!(
            Image::new(3, 2, "", vec![0; 5]),
            Err(Error::MismatchWidthHeight {
                width_height: (3, 2),
                pixel_length: 5
            })
        ));
        assert!(matches!(
            Image::new(0, 2, "", vec![]),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn rows() {
        let img = Image::new(3, 2, "", vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(img.row(0), Some(&[1, 2, 3][..]));
        assert_eq!(img.row(1), Some(&[4, 5, 6][..]));
        assert_eq!(img.row(2), None);
    }

    #[test]
    fn reads_bitmap_rows_as_stored() {
        let bytes = bmp_bytes(1, 2, &[&[10, 20, 30, 0], &[255, 255, 255, 0]]);
        let img = Image::from_bmp_reader(Cursor::new(bytes), "/tmp/photo.bmp").unwrap();
        assert_eq!((img.width(), img.height()), (1, 2));
        assert_eq!(img.pixels(), [20, 255]);
        assert_eq!(img.comment(), b"Original BMP file: photo.bmp");
    }

    #[test]
    fn bitmap_pixel_data_follows_the_offset() {
        let header = BmpHeader::builder()
            .pixel_offset(58)
            .width(1)
            .height(1)
            .build();
        let mut bytes = Vec::new();
        write_record(&mut bytes, &header).unwrap();
        bytes.extend_from_slice(&[0xff; 4]);
        bytes.extend_from_slice(&[3, 3, 3, 0]);
        let img = Image::from_bmp_reader(Cursor::new(bytes), "x.bmp").unwrap();
        assert_eq!(img.pixels(), [3]);
    }

    #[test]
    fn bitmap_with_stray_bytes_is_rejected() {
        let mut bytes = bmp_bytes(1, 1, &[&[1, 1, 1, 0]]);
        bytes.push(0);
        assert!(matches!(
            Image::from_bmp_reader(Cursor::new(bytes), "x.bmp"),
            Err(Error::TrailingBytes)
        ));
    }

    #[test]
    fn short_bitmap_pixel_data() {
        let bytes = bmp_bytes(2, 2, &[&[0; 8], &[0; 5]]);
        assert!(matches!(
            Image::from_bmp_reader(Cursor::new(bytes), "x.bmp"),
            Err(Error::TruncatedPixelData {
                expected: 16,
                actual: 13
            })
        ));
    }

    #[test]
    fn unsupported_bitmap_is_rejected_before_pixels() {
        let mut header = BmpHeader::builder().width(1).height(1).build();
        header.bits_per_pixel = 8;
        let mut bytes = Vec::new();
        write_record(&mut bytes, &header).unwrap();
        assert!(matches!(
            Image::from_bmp_reader(Cursor::new(bytes), "x.bmp"),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn container_layout() {
        let img = Image::new(2, 1, "ab!", vec![7, 9]).unwrap();
        let mut out = Vec::new();
        img.write_to(&mut out).unwrap();
        let mut expected = CONTAINER_MAGIC.to_le_bytes().to_vec();
        expected.extend_from_slice(&2i32.to_le_bytes());
        expected.extend_from_slice(&1i32.to_le_bytes());
        // "ab!" loses its last character on save
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"ab");
        expected.push(0);
        expected.extend_from_slice(&[7, 9]);
        assert_eq!(out, expected);
    }

    #[test]
    fn container_round_trip() {
        let img = Image::new(3, 2, "lena-unnormalized!", vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut out = Vec::new();
        img.write_to(&mut out).unwrap();
        let back = Image::from_reader(&out[..]).unwrap();
        assert_eq!((back.width(), back.height()), (3, 2));
        assert_eq!(back.pixels(), [1, 2, 3, 4, 5, 6]);
        assert_eq!(back.comment(), b"lena");
    }

    #[test]
    fn container_comment_bytes_survive_reload() {
        let header = ContainerHeader::builder()
            .width(1)
            .height(1)
            .comment_len(4)
            .build();
        let mut bytes = Vec::new();
        write_record(&mut bytes, &header).unwrap();
        bytes.extend_from_slice(&[0x63, 0xe9, 0x61, 0x21, 0, 42]);

        let img = Image::from_reader(&bytes[..]).unwrap();
        assert_eq!(img.comment(), [0x63u8, 0xe9, 0x61, 0x21]);
        assert_eq!(img.comment_lossy(), "c\u{fffd}a!");

        let mut out = Vec::new();
        img.write_to(&mut out).unwrap();
        let comment = &out[ContainerHeader::SIZE..];
        assert_eq!(comment, [0x63u8, 0xe9, 0x61, 0, 42]);
        assert_eq!(out[12..16], 3u32.to_le_bytes());
    }

    #[test]
    fn container_filler_byte_is_not_checked() {
        let img = Image::new(1, 1, "", vec![42]).unwrap();
        let mut out = Vec::new();
        img.write_to(&mut out).unwrap();
        let filler = ContainerHeader::SIZE;
        out[filler] = 0xab;
        assert_eq!(Image::from_reader(&out[..]).unwrap().pixels(), [42]);
    }

    #[test]
    fn container_errors() {
        let img = Image::new(2, 2, "", vec![1, 2, 3, 4]).unwrap();
        let mut out = Vec::new();
        img.write_to(&mut out).unwrap();

        let mut wrong_magic = out.clone();
        wrong_magic[0] = 0;
        assert!(matches!(
            Image::from_reader(&wrong_magic[..]),
            Err(Error::InvalidMagic { .. })
        ));

        let short = &out[..out.len() - 1];
        assert!(matches!(
            Image::from_reader(short),
            Err(Error::TruncatedPixelData {
                expected: 4,
                actual: 3
            })
        ));

        let mut long = out.clone();
        long.push(0);
        assert!(matches!(
            Image::from_reader(&long[..]),
            Err(Error::TrailingBytes)
        ));

        let header_only = &out[..ContainerHeader::SIZE];
        assert!(matches!(
            Image::from_reader(header_only),
            Err(Error::TruncatedPixelData { actual: 0, .. })
        ));
    }

    #[test]
    fn truncated_container_comment() {
        let header = ContainerHeader::builder()
            .width(1)
            .height(1)
            .comment_len(10)
            .build();
        let mut bytes = Vec::new();
        write_record(&mut bytes, &header).unwrap();
        bytes.extend_from_slice(b"abc");
        assert!(matches!(
            Image::from_reader(&bytes[..]),
            Err(Error::TruncatedComment {
                expected: 10,
                actual: 3
            })
        ));
    }

    #[test]
    fn bitmap_output_layout() {
        let img = Image::new(1, 2, "ignored", vec![5, 6]).unwrap();
        let mut out = Vec::new();
        img.write_bmp_to(&mut out).unwrap();
        assert_eq!(out.len(), 54 + 8);
        assert_eq!(&out[54..], [5, 5, 5, 0, 6, 6, 6, 0]);
        let back = Image::from_bmp_reader(Cursor::new(out), "out.bmp").unwrap();
        assert_eq!(back.pixels(), [5, 6]);
    }

    #[test]
    fn detects_formats() {
        let img = Image::new(1, 1, "", vec![0]).unwrap();
        let mut container = Vec::new();
        img.write_to(&mut container).unwrap();
        let mut bmp = Vec::new();
        img.write_bmp_to(&mut bmp).unwrap();

        let mut r = Cursor::new(container);
        assert_eq!(Format::detect(&mut r).unwrap(), Some(Format::Container));
        assert_eq!(r.position(), 0);
        assert_eq!(
            Format::detect(&mut Cursor::new(bmp)).unwrap(),
            Some(Format::Bmp)
        );
        assert_eq!(Format::detect(&mut Cursor::new(b"GIF8")).unwrap(), None);
        assert_eq!(Format::detect(&mut Cursor::new(b"B")).unwrap(), None);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_extension(Path::new("a.BMP")), Some(Format::Bmp));
        assert_eq!(
            Format::from_extension(Path::new("dir/a.img")),
            Some(Format::Container)
        );
        assert_eq!(
            Format::from_extension(Path::new("a.ece")),
            Some(Format::Container)
        );
        assert_eq!(Format::from_extension(Path::new("a.png")), None);
        assert_eq!(Format::from_extension(Path::new("noext")), None);
    }

    #[test]
    fn normalize_in_place() {
        let mut img = Image::new(3, 1, "", vec![10, 20, 30]).unwrap();
        let extent = img.normalize();
        assert_eq!(extent, Extent { min: 10, max: 30 });
        assert_eq!(img.pixels(), [0, 127, 255]);
    }
}
