use std::path::Path;

use anyhow::{Context, Result};
use libimg264::{Extent, Format, Image};
use tracing::{debug, info, instrument};

/// Reads `input` (a 24-bit bitmap or a 264 image), stretches its intensities to the full
/// 0-255 range and writes the result to `output`.
///
/// The output is a bitmap if `output` ends in `.bmp`, a 264 image otherwise.
#[instrument]
pub fn normalize_file(input: &Path, output: &Path) -> Result<Extent> {
    let mut img = Image::open(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    debug!(
        "Read {}x{} image: {:?}",
        img.width(),
        img.height(),
        img.comment_lossy()
    );

    let extent = img.normalize();
    info!("Intensities ranged from {} to {}", extent.min, extent.max);

    let format = Format::from_extension(output).unwrap_or(Format::Container);
    info!("Writing {format:?} image to {}", output.display());
    img.save(output, format)
        .with_context(|| format!("error attempting to write '{}'", output.display()))?;
    Ok(extent)
}
