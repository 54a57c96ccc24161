use crate::AssetError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, Rgb, RgbImage};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const DEFAULT_MAX_SIZE: u32 = 300;
const JPEG_QUALITY: u8 = 90;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Shrinks `src` to fit within `max_size` x `max_size`, keeping the aspect
/// ratio, and writes it to `dest` in the format its extension names. Images
/// already small enough are re-encoded unscaled. SVG sources are copied.
///
/// Returns the written dimensions, `(0, 0)` for a copied SVG.
pub fn resize_image(src: &Path, dest: &Path, max_size: u32) -> Result<(u32, u32), AssetError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    if extension(src) == "svg" {
        fs::copy(src, dest)?;
        return Ok((0, 0));
    }

    let image = ImageReader::open(src)?.with_guessed_format()?.decode()?;
    let bound = max_size.max(1);
    let image = if image.width() > bound || image.height() > bound {
        image.resize(bound, bound, FilterType::Lanczos3)
    } else {
        image
    };

    match extension(dest).as_str() {
        "jpg" | "jpeg" => write_jpeg(&image, fs::File::create(dest)?)?,
        _ => image.save(dest)?,
    }
    Ok(image.dimensions())
}

fn write_jpeg<W: Write>(image: &DynamicImage, out: W) -> Result<(), AssetError> {
    let flat = flatten_onto_white(image);
    let mut out = BufWriter::new(out);
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&flat)?;
    out.flush()?;
    Ok(())
}

/// JPEG has no alpha channel; composite transparent pixels over white.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut flat = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |channel: u8| ((channel as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        flat.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    flat
}
