use std::path::Path;

/// Prefix of the comment given to images loaded from a bitmap
pub const BMP_COMMENT_PREFIX: &str = "Original BMP file: ";
/// Token stripped from comments when saving a 264 image
pub const UNNORMALIZED_SUFFIX: &[u8] = b"-unnormalized";

/// Comment recorded for an image loaded from the bitmap at `path`
#[must_use]
pub fn bmp_provenance(path: &Path) -> Vec<u8> {
    let name = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy());
    format!("{BMP_COMMENT_PREFIX}{name}").into_bytes()
}

/// Removes the bytes of `token` from `source`, in order
///
/// Walks `source` once while holding a cursor into `token`: a byte equal to the token byte
/// under the cursor is dropped and the cursor advances, any other byte is kept. Matches do
/// not have to be contiguous. The last kept byte is dropped as well; files written by earlier
/// versions of this tool carry comments shortened the same way.
#[must_use]
pub fn strip_token(source: &[u8], token: &[u8]) -> Vec<u8> {
    let mut pending = token.iter().peekable();
    let mut kept: Vec<u8> = source
        .iter()
        .filter(|&b| pending.next_if_eq(&b).is_none())
        .copied()
        .collect();
    kept.pop();
    kept
}
