//! Attribution text rendering.
//!
//! The author and location lines are drawn straight onto the gradient plate
//! in plate-local coordinates, each with a soft black drop shadow under
//! white glyphs. The result is a single layer the size of the plate.
//!
//! # Example
//!
//! ```ignore
//! let specs = TextSpec::attribution("Jane Doe", "Paris");
//! let face = FontChain::builtin().resolve();
//! let lines = measure(&specs, sizes, face.as_ref());
//! let layer = render(plate, &lines, &plan, face.as_ref(), &TextStyle::default());
//! ```

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::font::{FontChain, GlyphFace};
use super::geometry::{FontSizes, LayoutPlan, PlacementPosition, Rect, TextMetrics};

fn default_font_path() -> Option<PathBuf> {
    Some(PathBuf::from("assets/fonts/Segoe UI Bold.ttf"))
}

fn default_system_family() -> Option<String> {
    Some("Segoe UI".to_string())
}

fn default_true() -> bool {
    true
}

fn default_shadow_offset() -> u32 {
    1
}

fn default_shadow_alpha() -> u8 {
    128
}

/// Fonts and shadow for the attribution text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font file tried first (default: assets/fonts/Segoe UI Bold.ttf)
    #[serde(default = "default_font_path")]
    pub font_path: Option<PathBuf>,

    /// Preferred family in the system font database (default: Segoe UI)
    #[serde(default = "default_system_family")]
    pub system_family: Option<String>,

    /// Consult the system font database at all (default: true)
    #[serde(default = "default_true")]
    pub use_system_fonts: bool,

    /// Shadow offset down and right, in pixels (default: 1)
    #[serde(default = "default_shadow_offset")]
    pub shadow_offset: u32,

    /// Shadow alpha (default: 128)
    #[serde(default = "default_shadow_alpha")]
    pub shadow_alpha: u8,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_path: default_font_path(),
            system_family: default_system_family(),
            use_system_fonts: default_true(),
            shadow_offset: default_shadow_offset(),
            shadow_alpha: default_shadow_alpha(),
        }
    }
}

impl TextStyle {
    /// Build the fallback chain this style describes.
    pub fn font_chain(&self) -> FontChain {
        FontChain::standard(
            self.font_path.as_deref(),
            self.system_family.as_deref(),
            self.use_system_fonts,
        )
    }

    fn shadow_color(&self) -> Rgba<u8> {
        Rgba([0, 0, 0, self.shadow_alpha])
    }
}

const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Which line a piece of text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    /// Author line, larger font, on top.
    Primary,
    /// Location line, smaller font, at the bottom.
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpec {
    pub content: String,
    pub role: TextRole,
}

impl TextSpec {
    pub fn new(content: impl Into<String>, role: TextRole) -> Self {
        Self {
            content: content.into(),
            role,
        }
    }

    /// The author line followed by the location line.
    pub fn attribution(author: &str, location: &str) -> [TextSpec; 2] {
        [
            Self::new(author_line(author), TextRole::Primary),
            Self::new(location, TextRole::Secondary),
        ]
    }
}

/// `"{author} ©"`. An empty author still gets the mark.
pub fn author_line(author: &str) -> String {
    format!("{} ©", author)
}

/// A [`TextSpec`] with its resolved font size and measured extent.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub spec: TextSpec,
    pub px: f32,
    pub metrics: TextMetrics,
}

impl TextLine {
    fn target_box(&self, plan: &LayoutPlan) -> Rect {
        match self.spec.role {
            TextRole::Primary => plan.author_box,
            TextRole::Secondary => plan.location_box,
        }
    }
}

/// Measure every [`TextSpec`] at the size its role gets on this canvas.
pub fn measure(specs: &[TextSpec], sizes: FontSizes, face: &dyn GlyphFace) -> Vec<TextLine> {
    specs
        .iter()
        .map(|spec| {
            let px = match spec.role {
                TextRole::Primary => sizes.primary,
                TextRole::Secondary => sizes.secondary,
            };
            TextLine {
                spec: spec.clone(),
                px,
                metrics: face.measure(&spec.content, px),
            }
        })
        .collect()
}

/// Metrics of the first line with `role`, zero when there is none.
pub fn metrics_for(lines: &[TextLine], role: TextRole) -> TextMetrics {
    lines
        .iter()
        .find(|line| line.spec.role == role)
        .map(|line| line.metrics)
        .unwrap_or_default()
}

/// Draw the lines onto the plate and return it as the text layer.
///
/// Each line is anchored by the bottom-right corner of its planned box, so a
/// line clamped at the canvas' left edge keeps its right alignment and loses
/// its leading glyphs instead. Anything outside the plate is clipped.
pub fn render(
    mut plate: RgbaImage,
    lines: &[TextLine],
    plan: &LayoutPlan,
    face: &dyn GlyphFace,
    style: &TextStyle,
) -> RgbaImage {
    if plate.is_empty() {
        return plate;
    }

    let offset = style.shadow_offset.min(i32::MAX as u32) as i32;

    for line in lines {
        if line.spec.content.is_empty() {
            continue;
        }

        let target = line.target_box(plan);
        let origin = PlacementPosition::new(
            plate_offset(target.right(), line.metrics.width, plan.plate_box.x),
            plate_offset(target.bottom(), line.metrics.height, plan.plate_box.y),
        );

        if style.shadow_alpha > 0 {
            let shadow = PlacementPosition::new(
                origin.x.saturating_add(offset),
                origin.y.saturating_add(offset),
            );
            face.draw(
                &line.spec.content,
                line.px,
                shadow,
                style.shadow_color(),
                &mut plate,
            );
        }

        face.draw(&line.spec.content, line.px, origin, TEXT_COLOR, &mut plate);
    }

    tracing::trace!(
        lines = lines.len(),
        face = face.name(),
        width = plate.width(),
        height = plate.height(),
        "Rendered text layer"
    );

    plate
}

/// `edge - extent - plate_origin`, clamped into `i32`.
fn plate_offset(edge: u32, extent: u32, plate_origin: u32) -> i32 {
    let offset = edge as i64 - extent as i64 - plate_origin as i64;
    offset.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
