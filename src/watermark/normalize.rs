//! Canvas size normalization and the shared Lanczos3 resampler.

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::RgbaImage;
use std::num::NonZeroU32;

/// Dimensions after capping the longest edge at `max_dimension`.
///
/// The longest edge becomes exactly `max_dimension`; the other edge is
/// rounded and kept at least 1px. Never enlarges. `max_dimension == 0`
/// disables the cap.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        return (width, height);
    }

    let scale = max_dimension as f64 / longest as f64;
    let shrink = |edge: u32| {
        if edge == longest {
            max_dimension
        } else {
            ((edge as f64 * scale).round() as u32).clamp(1, max_dimension)
        }
    };

    (shrink(width), shrink(height))
}

/// Cap the canvas' longest edge at `max_dimension`.
///
/// Canvases already within bounds are returned untouched, so normalizing
/// twice is the same as normalizing once.
pub fn normalize(canvas: RgbaImage, max_dimension: u32) -> Result<RgbaImage, String> {
    let (width, height) = canvas.dimensions();
    let (target_w, target_h) = target_dimensions(width, height, max_dimension);

    if (target_w, target_h) == (width, height) {
        return Ok(canvas);
    }

    tracing::debug!(
        from_width = width,
        from_height = height,
        to_width = target_w,
        to_height = target_h,
        max_dimension,
        "Normalizing canvas"
    );

    resize_rgba(canvas, target_w, target_h)
}

/// Lanczos3 resample of a straight-alpha RGBA buffer.
///
/// Translucent sources are premultiplied for the convolution and divided
/// back afterwards so transparent pixels do not bleed their colour.
pub fn resize_rgba(source: RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage, String> {
    let (src_w, src_h) = source.dimensions();
    if (src_w, src_h) == (target_w, target_h) {
        return Ok(source);
    }

    let src_width = NonZeroU32::new(src_w).ok_or("Source width is 0")?;
    let src_height = NonZeroU32::new(src_h).ok_or("Source height is 0")?;
    let dst_width = NonZeroU32::new(target_w).ok_or("Target width is 0")?;
    let dst_height = NonZeroU32::new(target_h).ok_or("Target height is 0")?;

    let opaque = source.pixels().all(|p| p[3] == 255);

    let mut src_image =
        Image::from_vec_u8(src_width, src_height, source.into_raw(), PixelType::U8x4)
            .map_err(|e| format!("Failed to create source image: {:?}", e))?;
    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mul_div = MulDiv::default();
    if !opaque {
        mul_div
            .multiply_alpha_inplace(&mut src_image.view_mut())
            .map_err(|e| format!("Failed to premultiply alpha: {:?}", e))?;
    }

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| format!("Resize operation failed: {:?}", e))?;

    if !opaque {
        mul_div
            .divide_alpha_inplace(&mut dst_image.view_mut())
            .map_err(|e| format!("Failed to unpremultiply alpha: {:?}", e))?;
    }

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| "Failed to create output image buffer".to_string())
}
