//! Gradient backing plate.
//!
//! The plate is a constant dark gray whose alpha ramps linearly from fully
//! transparent at its left edge to `max_alpha` at its right edge, so the
//! right-aligned attribution text gets a backing that fades into the photo.
//! Straight alpha; the colour channels never depend on the ramp.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Highest plate alpha allowed; keeps the plate translucent.
pub const MAX_PLATE_ALPHA: u8 = 180;

fn default_max_alpha() -> u8 {
    MAX_PLATE_ALPHA
}

fn default_gray() -> u8 {
    30
}

/// Plate appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateStyle {
    /// Alpha at the right edge (default: 180, at most 180)
    #[serde(default = "default_max_alpha")]
    pub max_alpha: u8,

    /// Gray level of the RGB channels (default: 30)
    #[serde(default = "default_gray")]
    pub gray: u8,
}

impl Default for PlateStyle {
    fn default() -> Self {
        Self {
            max_alpha: default_max_alpha(),
            gray: default_gray(),
        }
    }
}

/// Alpha for column `i` of a ramp `width` pixels wide.
///
/// `round(max_alpha * i / (width - 1))`, and 0 for ramps narrower than 2px.
pub fn ramp_alpha(i: u32, width: u32, max_alpha: u8) -> u8 {
    if width < 2 {
        return 0;
    }

    let i = i.min(width - 1) as u64;
    let span = (width - 1) as u64;
    // Round half up, in integers
    ((max_alpha as u64 * i * 2 + span) / (span * 2)) as u8
}

/// Build the backing plate for a planned plate box.
///
/// `max_alpha` is capped at [`MAX_PLATE_ALPHA`]. An empty box yields an
/// empty buffer.
pub fn build(plate_box: &Rect, style: &PlateStyle) -> RgbaImage {
    let max_alpha = style.max_alpha.min(MAX_PLATE_ALPHA);
    let width = plate_box.width;
    let gray = style.gray;

    let column: Vec<Rgba<u8>> = (0..width)
        .map(|i| Rgba([gray, gray, gray, ramp_alpha(i, width, max_alpha)]))
        .collect();

    RgbaImage::from_fn(width, plate_box.height, |x, _| column[x as usize])
}
