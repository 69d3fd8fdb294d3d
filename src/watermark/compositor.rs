//! Straight-alpha compositing onto the canvas.
//!
//! Every overlay (plate with text, logo) is blended with the Porter-Duff
//! "over" operator using the overlay's own alpha. Overlays may hang off any
//! canvas edge; only the overlapping region is touched.

use image::{Rgba, RgbaImage};

use super::geometry::PlacementPosition;

/// An overlay image positioned on the canvas.
#[derive(Clone)]
pub struct Layer<'a> {
    pub image: &'a RgbaImage,
    /// Top-left corner in canvas space. May be negative.
    pub position: PlacementPosition,
}

impl<'a> Layer<'a> {
    pub fn new(image: &'a RgbaImage, position: PlacementPosition) -> Self {
        Self { image, position }
    }
}

impl std::fmt::Debug for Layer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("position", &self.position)
            .finish()
    }
}

/// Blend a layer onto the target in place.
///
/// Returns the number of pixels written, 0 when the layer misses the canvas.
pub fn composite(target: &mut RgbaImage, layer: &Layer<'_>) -> u64 {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;

    let pos_x = layer.position.x as i64;
    let pos_y = layer.position.y as i64;

    // Visible region, clamped to target bounds
    let x_start = pos_x.max(0);
    let y_start = pos_y.max(0);
    let x_end = (pos_x + layer.image.width() as i64).min(target_width);
    let y_end = (pos_y + layer.image.height() as i64).min(target_height);

    if x_start >= x_end || y_start >= y_end {
        return 0;
    }

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wx = (tx - pos_x) as u32;
            let wy = (ty - pos_y) as u32;

            let fg = *layer.image.get_pixel(wx, wy);
            let bg = target.get_pixel_mut(tx as u32, ty as u32);
            *bg = blend_pixels(*bg, fg);
        }
    }

    ((x_end - x_start) * (y_end - y_start)) as u64
}

/// Porter-Duff "over" for straight-alpha pixels.
///
/// `out_a = fg_a + bg_a * (1 - fg_a)`, colour channels weighted by their
/// alpha and divided back out. Results are rounded and clamped to `[0, 255]`.
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match foreground[3] {
        0 => return background,
        255 => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        to_channel(result)
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        to_channel(out_alpha),
    ])
}

fn to_channel(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
