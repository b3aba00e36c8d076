use std::io::Cursor;

use anyhow::{Context, Result, anyhow, ensure};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use image::{ImageFormat, RgbImage};

/// Fraction of rows, from the top, over which [`mix_vertical`] transitions.
pub const DEFAULT_CUTOFF: f32 = 0.3;

/// Convert decoder output `[B, 3, H, W]` in `[0, 1]` to 8-bit RGB images.
pub fn tensor_to_images<B: Backend>(images: Tensor<B, 4>) -> Result<Vec<RgbImage>> {
    let [batch, channels, height, width] = images.dims();
    ensure!(channels == 3, "expected 3 image channels, got {channels}");

    let values = images
        .to_data()
        .convert::<f32>()
        .into_vec::<f32>()
        .map_err(|err| anyhow!("failed to read decoded images: {err:?}"))?;

    let plane = height * width;
    let mut decoded = Vec::with_capacity(batch);
    for item in values.chunks_exact(channels * plane) {
        let mut pixels = Vec::with_capacity(plane * channels);
        for offset in 0..plane {
            for channel in 0..channels {
                pixels.push(unit_to_u8(item[channel * plane + offset]));
            }
        }
        let image = RgbImage::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| anyhow!("decoded buffer does not match {width}x{height}"))?;
        decoded.push(image);
    }
    Ok(decoded)
}

fn unit_to_u8(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("failed to encode PNG")?;
    Ok(bytes)
}

/// PNG-encode and wrap in standard (padded) base64.
pub fn encode_png_base64(image: &RgbImage) -> Result<String> {
    Ok(STANDARD.encode(encode_png(image)?))
}

pub fn decode_png_base64(data: &str) -> Result<RgbImage> {
    let bytes = STANDARD
        .decode(data)
        .context("texture payload is not valid base64")?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .context("texture payload is not a PNG")?;
    Ok(image.to_rgb8())
}

/// Per-row weight of the top image: 1 at row 0, falling linearly to 0 at
/// `cutoff * (height - 1)` and staying 0 below.
pub fn vertical_gradient(height: usize, cutoff: f32) -> Vec<f32> {
    let cutoff = cutoff.clamp(0.0, 1.0);
    (0..height)
        .map(|row| {
            if cutoff <= 0.0 {
                return 0.0;
            }
            let linear = if height > 1 {
                1.0 - row as f32 / (height - 1) as f32
            } else {
                1.0
            };
            ((linear - (1.0 - cutoff)) / cutoff).clamp(0.0, 1.0)
        })
        .collect()
}

/// Composite `top * grad + bottom * (1 - grad)` row by row.
pub fn mix_vertical(top: &RgbImage, bottom: &RgbImage, cutoff: f32) -> Result<RgbImage> {
    ensure!(
        top.dimensions() == bottom.dimensions(),
        "cannot blend {:?} over {:?}",
        top.dimensions(),
        bottom.dimensions()
    );

    let (width, height) = top.dimensions();
    let gradient = vertical_gradient(height as usize, cutoff);
    let mut mixed = RgbImage::new(width, height);
    for (x, y, pixel) in mixed.enumerate_pixels_mut() {
        let weight = gradient[y as usize];
        let upper = top.get_pixel(x, y);
        let lower = bottom.get_pixel(x, y);
        for channel in 0..3 {
            let value =
                upper[channel] as f32 * weight + lower[channel] as f32 * (1.0 - weight);
            pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(mixed)
}
