//! Layout planning for the attribution block.
//!
//! Everything here is derived from the canvas size so the watermark keeps
//! the same proportion on a 640px thumbnail and on a 2000px delivery image.
//! The fixed-pixel layout used by older deployments is the
//! [`FontScalePolicy::Fixed`] special case of the same planner.
//!
//! # Layout
//!
//! ```text
//!                      plate_box ──────────────┐
//!                      │          Jane Doe ©   │  ← author_box
//!                      │              Paris    │  ← location_box
//! canvas bottom ───────┴───────────────────────┘
//! ```
//!
//! Text is right-aligned against `canvas_width - padding_x`, stacked
//! bottom-up. The plate is flush with the right and bottom canvas edges.

use serde::{Deserialize, Serialize};

/// Dimensions of the canvas being watermarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Measured extent of one line of text at its planned font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextMetrics {
    pub width: u32,
    pub height: u32,
}

impl TextMetrics {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left position of a layer on the canvas. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn origin(&self) -> PlacementPosition {
        PlacementPosition::new(self.x as i32, self.y as i32)
    }

    /// Intersect an unclamped rectangle with the canvas.
    ///
    /// Parts outside the canvas are cut away; a rectangle that misses the
    /// canvas entirely collapses to zero size at the nearest edge.
    fn clamped(x: i64, y: i64, width: i64, height: i64, canvas: ImageDimensions) -> Self {
        let cw = canvas.width as i64;
        let ch = canvas.height as i64;

        let left = x.clamp(0, cw);
        let top = y.clamp(0, ch);
        let right = (x + width.max(0)).clamp(left, cw);
        let bottom = (y + height.max(0)).clamp(top, ch);

        Self::new(
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        )
    }
}

fn default_divisor() -> f32 {
    55.0
}

fn default_secondary_reduction() -> f32 {
    1.0 / 11.0
}

fn default_min_font_px() -> f32 {
    6.0
}

fn default_padding_fraction() -> f32 {
    0.008
}

fn default_spacing_fraction() -> f32 {
    0.002
}

fn default_primary_px() -> f32 {
    22.0
}

fn default_secondary_px() -> f32 {
    20.0
}

fn default_padding_px() -> u32 {
    8
}

fn default_spacing_px() -> u32 {
    2
}

fn default_widen_factor() -> f32 {
    1.25
}

fn default_plate_lift() -> f32 {
    2.5
}

/// How font size, padding and line spacing follow the canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FontScalePolicy {
    /// Everything is a fraction of the canvas (default).
    Relative {
        /// Primary font size is `canvas_height / divisor` (default: 55)
        #[serde(default = "default_divisor")]
        divisor: f32,
        /// Secondary size is primary minus this share of it (default: 1/11)
        #[serde(default = "default_secondary_reduction")]
        secondary_reduction: f32,
        /// Smallest font size used on non-empty canvases (default: 6px)
        #[serde(default = "default_min_font_px")]
        min_font_px: f32,
        /// Padding as a share of the matching canvas edge (default: 0.008)
        #[serde(default = "default_padding_fraction")]
        padding_fraction: f32,
        /// Line spacing as a share of canvas height (default: 0.002)
        #[serde(default = "default_spacing_fraction")]
        spacing_fraction: f32,
    },
    /// Constant pixel sizes regardless of the canvas.
    Fixed {
        #[serde(default = "default_primary_px")]
        primary_px: f32,
        #[serde(default = "default_secondary_px")]
        secondary_px: f32,
        #[serde(default = "default_padding_px")]
        padding_px: u32,
        #[serde(default = "default_spacing_px")]
        spacing_px: u32,
    },
}

impl Default for FontScalePolicy {
    fn default() -> Self {
        Self::Relative {
            divisor: default_divisor(),
            secondary_reduction: default_secondary_reduction(),
            min_font_px: default_min_font_px(),
            padding_fraction: default_padding_fraction(),
            spacing_fraction: default_spacing_fraction(),
        }
    }
}

impl FontScalePolicy {
    /// The fixed-pixel layout: 22px/20px text, 8px padding, 2px spacing.
    pub fn fixed() -> Self {
        Self::Fixed {
            primary_px: default_primary_px(),
            secondary_px: default_secondary_px(),
            padding_px: default_padding_px(),
            spacing_px: default_spacing_px(),
        }
    }

    /// Font sizes for the author (primary) and location (secondary) lines.
    pub fn font_sizes(&self, canvas: ImageDimensions) -> FontSizes {
        if canvas.is_empty() {
            return FontSizes::default();
        }

        match *self {
            Self::Relative {
                divisor,
                secondary_reduction,
                min_font_px,
                ..
            } => {
                let primary = (canvas.height as f32 / divisor.max(1.0)).max(min_font_px);
                let reduction = primary * secondary_reduction.clamp(0.0, 1.0);
                let secondary = (primary - reduction).max(min_font_px);
                FontSizes { primary, secondary }
            }
            Self::Fixed {
                primary_px,
                secondary_px,
                ..
            } => FontSizes {
                primary: primary_px,
                secondary: secondary_px,
            },
        }
    }

    /// Horizontal and vertical padding from the canvas edges.
    pub fn padding(&self, canvas: ImageDimensions) -> (u32, u32) {
        if canvas.is_empty() {
            return (0, 0);
        }

        match *self {
            Self::Relative {
                padding_fraction, ..
            } => (
                (canvas.width as f32 * padding_fraction).round() as u32,
                (canvas.height as f32 * padding_fraction).round() as u32,
            ),
            Self::Fixed { padding_px, .. } => (padding_px, padding_px),
        }
    }

    /// Vertical gap between the author and location lines.
    pub fn spacing(&self, canvas: ImageDimensions) -> u32 {
        if canvas.is_empty() {
            return 0;
        }

        match *self {
            Self::Relative {
                spacing_fraction, ..
            } => ((canvas.height as f32 * spacing_fraction).round() as u32).max(1),
            Self::Fixed { spacing_px, .. } => spacing_px,
        }
    }
}

/// Font sizes in pixels for one canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontSizes {
    pub primary: f32,
    pub secondary: f32,
}

/// Layout knobs beyond font scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPolicy {
    #[serde(default)]
    pub font_scale: FontScalePolicy,

    /// Plate width multiplier over the widest line, leaves room for glyph
    /// overhang (default: 1.25, must be ≥ 1.0)
    #[serde(default = "default_widen_factor")]
    pub widen_factor: f32,

    /// How many line-spacings the plate extends above the author line (default: 2.5)
    #[serde(default = "default_plate_lift")]
    pub plate_lift: f32,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            font_scale: FontScalePolicy::default(),
            widen_factor: default_widen_factor(),
            plate_lift: default_plate_lift(),
        }
    }
}

/// Where the two text lines and their backing plate go on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutPlan {
    pub author_box: Rect,
    pub location_box: Rect,
    pub plate_box: Rect,
}

impl LayoutPlan {
    /// Offset of a canvas-space box relative to the plate origin.
    pub fn plate_local(&self, rect: &Rect) -> PlacementPosition {
        PlacementPosition::new(
            rect.x as i32 - self.plate_box.x as i32,
            rect.y as i32 - self.plate_box.y as i32,
        )
    }
}

/// Plan the attribution block for a canvas.
///
/// Never fails. A zero-size canvas yields an all-empty plan; text wider
/// than the canvas is clipped at the left edge and the plate is capped at
/// the canvas width.
pub fn plan(
    canvas: ImageDimensions,
    author: TextMetrics,
    location: TextMetrics,
    policy: &LayoutPolicy,
) -> LayoutPlan {
    if canvas.is_empty() {
        return LayoutPlan::default();
    }

    let (pad_x, pad_y) = policy.font_scale.padding(canvas);
    let pad_x = pad_x as i64;
    let pad_y = pad_y as i64;
    let spacing = policy.font_scale.spacing(canvas) as i64;

    let cw = canvas.width as i64;
    let ch = canvas.height as i64;
    let right = (cw - pad_x).max(0);

    let (aw, ah) = (author.width as i64, author.height as i64);
    let (lw, lh) = (location.width as i64, location.height as i64);

    let location_top = ch - pad_y - lh;
    let author_top = location_top - spacing - ah;

    let author_box = Rect::clamped(right - aw, author_top, aw, ah, canvas);
    let location_box = Rect::clamped(right - lw, location_top, lw, lh, canvas);

    let widen = policy.widen_factor.max(1.0) as f64;
    let text_width = (aw.max(lw) as f64 * widen).ceil() as i64;
    let plate_width = (text_width + 2 * pad_x).min(cw);
    let lift = (spacing as f32 * policy.plate_lift.max(0.0)).round() as i64;
    let plate_top = author_top - lift;

    let plate_box = Rect::clamped(cw - plate_width, plate_top, plate_width, ch - plate_top, canvas);

    LayoutPlan {
        author_box,
        location_box,
        plate_box,
    }
}
