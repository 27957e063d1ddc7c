/// Demonstrates how to turn a 24-bit bitmap into a normalized 264 image
///
/// Usage: `cargo run --example bmp_to_img -- <in.bmp> <out.img>`
use anyhow::Context;
use libimg264::Image;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let input = args.next().context("missing input bitmap")?;
    let output = args.next().context("missing output file")?;

    let mut img = Image::from_bmp_file(&input)?;
    let extent = img.normalize();
    println!(
        "{}: {}x{}, intensities {}..={}",
        img.comment_lossy(),
        img.width(),
        img.height(),
        extent.min,
        extent.max
    );
    img.into_file(&output)?;
    Ok(())
}
