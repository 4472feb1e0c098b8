use image::{ImageEncoder, Rgba, RgbaImage, codecs::png::PngEncoder};
use std::sync::LazyLock;
use tracing::error;

/// 1x1 fully transparent PNG served whenever a tile cannot be fetched.
/// Encoded once on first use.
pub static FALLBACK_TILE: LazyLock<Vec<u8>> = LazyLock::new(|| match encode_transparent_png() {
    Ok(png) => png,
    Err(e) => {
        error!(error = %e, "Failed to encode fallback tile");
        Vec::new()
    }
});

fn encode_transparent_png() -> image::ImageResult<Vec<u8>> {
    let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
    let mut png_data = Vec::new();
    PngEncoder::new(&mut png_data).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_data)
}

pub fn fallback_tile() -> &'static [u8] {
    FALLBACK_TILE.as_slice()
}
