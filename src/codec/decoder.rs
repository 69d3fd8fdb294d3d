//! Upload decoding with size guards
//!
//! Turns raw upload bytes into a straight-alpha RGBA canvas. Dimensions are
//! read from the header first so oversized images are refused before any
//! pixel buffer is allocated.

use image::io::Reader as ImageReader;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::error::CodecError;

fn default_max_input_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_max_source_pixels() -> u64 {
    100_000_000
}

/// Limits applied to uploads before and during decode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeLimits {
    /// Maximum accepted input size in bytes (default: 50 MiB)
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,

    /// Maximum width × height (default: 100 megapixels)
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            max_source_pixels: default_max_source_pixels(),
        }
    }
}

/// Decode image bytes into an RGBA canvas.
///
/// Sources without an alpha channel come back fully opaque.
pub fn decode(data: &[u8], limits: &DecodeLimits) -> Result<RgbaImage, CodecError> {
    if data.is_empty() {
        return Err(CodecError::EmptyInput);
    }

    if data.len() > limits.max_input_bytes {
        return Err(CodecError::InputTooLarge {
            size: data.len(),
            max_size: limits.max_input_bytes,
        });
    }

    let (width, height) = reader(data)?
        .into_dimensions()
        .map_err(|e| CodecError::decode_failed(e.to_string()))?;

    if width as u64 * height as u64 > limits.max_source_pixels {
        return Err(CodecError::too_large(
            width,
            height,
            limits.max_source_pixels,
        ));
    }

    let image = reader(data)?
        .decode()
        .map_err(|e| CodecError::decode_failed(e.to_string()))?;

    tracing::debug!(
        width,
        height,
        color = ?image.color(),
        "Decoded upload"
    );

    Ok(image.into_rgba8())
}

fn reader(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, CodecError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CodecError::decode_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_empty_input() {
        let result = decode(&[], &DecodeLimits::default());
        assert!(matches!(result, Err(CodecError::EmptyInput)));
    }

    #[test]
    fn test_decode_invalid_data() {
        let result = decode(&[0, 1, 2, 3, 4, 5], &DecodeLimits::default());
        assert!(matches!(result, Err(CodecError::DecodeFailed { .. })));
    }

    #[test]
    fn test_decode_promotes_rgb_to_opaque_rgba() {
        let png = encode_png(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            3,
            2,
            Rgb([10, 20, 30]),
        )));

        let canvas = decode(&png, &DecodeLimits::default()).unwrap();

        assert_eq!(canvas.dimensions(), (3, 2));
        assert!(canvas.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_rejects_pixel_bomb() {
        let png = encode_png(DynamicImage::ImageRgb8(RgbImage::new(40, 40)));
        let limits = DecodeLimits {
            max_source_pixels: 1000,
            ..Default::default()
        };

        let result = decode(&png, &limits);
        assert!(matches!(
            result,
            Err(CodecError::ImageTooLarge { pixels: 1600, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_input() {
        let png = encode_png(DynamicImage::ImageRgb8(RgbImage::new(4, 4)));
        let limits = DecodeLimits {
            max_input_bytes: 8,
            ..Default::default()
        };

        let result = decode(&png, &limits);
        assert!(matches!(result, Err(CodecError::InputTooLarge { .. })));
    }
}
