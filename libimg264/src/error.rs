use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
/// Possible `libimg264` errors
pub enum Error {
    /// Error returned if the file cannot be opened or created
    #[error("failed to open file '{}'", path.display())]
    FileOpen {
        /// the path that failed to open
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// Error returned if the stream ends before a full header could be read
    #[error("failed to read header: only {actual} of {expected} bytes available")]
    TruncatedHeader {
        /// size of the header record
        expected: usize,
        /// bytes actually read
        actual: usize,
    },
    /// Error returned if a header carries the wrong magic number
    #[error("invalid magic number: expected {expected:#x}, found {found:#x}")]
    InvalidMagic {
        /// the magic number of the format
        expected: u32,
        /// the magic number found in the header
        found: u32,
    },
    /// Error returned if a BMP header describes a variant this crate cannot decode
    #[error("unsupported bitmap: {field} is {found}")]
    UnsupportedFormat {
        /// name of the header field that failed validation
        field: &'static str,
        /// the offending value
        found: u32,
    },
    /// Error returned if width or height is not a positive number
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions {
        /// header width
        width: i64,
        /// header height
        height: i64,
    },
    /// Error returned if a buffer cannot be allocated
    #[error("failed to allocate {bytes} bytes")]
    AllocationFailure {
        /// requested size
        bytes: usize,
    },
    /// Error returned if the stream ends inside the comment
    #[error("failed to read comment: only {actual} of {expected} bytes available")]
    TruncatedComment {
        /// recorded comment length
        expected: usize,
        /// bytes actually read
        actual: usize,
    },
    /// Error returned if the stream ends inside the pixel data
    #[error("only read {actual} of {expected} bytes of image data")]
    TruncatedPixelData {
        /// bytes of pixel data the header requires
        expected: usize,
        /// bytes actually read
        actual: usize,
    },
    /// Error returned if bytes remain after the pixel data
    #[error("stray bytes after the end of the image data")]
    TrailingBytes,
    /// Error returned if a section could not be written completely
    #[error("failed to write {section}")]
    IncompleteWrite {
        /// which part of the file was being written
        section: &'static str,
        /// underlying i/o error
        source: io::Error,
    },
    /// Error returned if seeking to the pixel data fails
    #[error("failed to seek to offset {offset}")]
    SeekFailure {
        /// the target offset
        offset: u64,
        /// underlying i/o error
        source: io::Error,
    },
    /// Error returned if width/height do not match the length of the pixel buffer
    #[error("width/height do not match pixel data. width/height: {width_height:?}, pixel_length: {pixel_length}")]
    MismatchWidthHeight {
        /// image width/height
        width_height: (u32, u32),
        /// pixel buffer length
        pixel_length: usize,
    },
    /// Any other i/o error while reading
    #[error("i/o error")]
    Io(#[from] io::Error),
}
