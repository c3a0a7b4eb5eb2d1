//! Server-side recompression for the order image upload path.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
}

const QUALITY_START: u8 = 80;
const QUALITY_FLOOR: u8 = 35;
const QUALITY_STEP: u8 = 7;

/// Re-encodes `bytes` as a JPEG fitting within `max_w` x `max_h`, aiming for
/// `max_bytes`. Quality steps down from 80 until the output fits or the
/// floor is reached; the floor encoding is returned even if still over
/// budget, matching the upload path which sends its best effort regardless.
pub fn compress_to_target(
    bytes: &[u8],
    max_bytes: usize,
    max_w: u32,
    max_h: u32,
) -> Result<Vec<u8>, ImagingError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = resize_to_fit(decoded, max_w, max_h).to_rgb8();

    let mut quality = QUALITY_START;
    loop {
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder.encode_image(&rgb).map_err(ImagingError::Encode)?;

        if out.len() <= max_bytes || quality <= QUALITY_FLOOR {
            return Ok(out);
        }
        quality = quality.saturating_sub(QUALITY_STEP).max(QUALITY_FLOOR);
    }
}

/// Downscales preserving aspect ratio so both dimensions fit; never upscales.
fn resize_to_fit(img: DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    if img.width() <= max_w && img.height() <= max_h {
        return img;
    }
    img.resize(max_w, max_h, image::imageops::FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    // Deterministic pseudo-noise compresses poorly, which exercises the
    // quality ladder instead of finishing on the first encoding.
    fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let r = (x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17)) % 251) as u8;
            let g = (x.wrapping_mul(13).wrapping_add(y.wrapping_mul(7)) % 239) as u8;
            let b = (x.wrapping_mul(53).wrapping_add(y.wrapping_mul(29)) % 241) as u8;
            image::Rgb([r, g, b])
        });
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, 95);
        encoder.encode_image(&img).unwrap();
        out
    }

    #[test]
    fn comfortable_budget_is_met() {
        let source = noisy_jpeg(256, 256);
        let out = compress_to_target(&source, 500_000, 1600, 1600).unwrap();
        assert!(out.len() <= 500_000);
        assert!(!out.is_empty());
    }

    #[test]
    fn oversized_dimensions_are_scaled_down_preserving_aspect() {
        let source = noisy_jpeg(2400, 1200);
        let out = compress_to_target(&source, 5_000_000, 1600, 1600).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 1600);
        assert_eq!(decoded.height(), 800);
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let source = noisy_jpeg(100, 60);
        let out = compress_to_target(&source, 5_000_000, 1600, 1600).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 100);
        assert_eq!(decoded.height(), 60);
    }

    #[test]
    fn impossible_budget_still_returns_the_floor_encoding() {
        let source = noisy_jpeg(512, 512);
        let out = compress_to_target(&source, 1, 1600, 1600).unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let result = compress_to_target(&[0u8; 32], 100_000, 1600, 1600);
        assert!(matches!(result, Err(ImagingError::Decode(_))));
    }
}
