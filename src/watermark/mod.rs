//! Attribution watermarking for uploaded photographs.
//!
//! An author line (`"{author} ©"`) and a location line are drawn in white
//! with a drop shadow onto a translucent gradient plate in the bottom-right
//! corner. An optional logo goes in the bottom-left corner. The canvas is
//! capped to a maximum dimension before and after, then encoded.
//!
//! # Stages
//!
//! - [`geometry`] plans the text boxes and plate from the canvas size
//! - [`plate`] synthesizes the gradient backing plate
//! - [`text_renderer`] draws both lines onto the plate using a [`font::FontChain`]
//! - [`compositor`] blends layers onto the canvas with straight-alpha "over"
//! - [`logo`] loads, scales and places the logo
//! - [`normalize`] caps the canvas size
//! - [`pipeline`] runs them in order and hands the canvas to the encoder
//!
//! # Configuration Example
//!
//! ```yaml
//! layout:
//!   font_scale:
//!     mode: relative
//!     divisor: 55
//! plate:
//!   max_alpha: 180
//! logo:
//!   path: assets/logo.png
//!   max_fraction: 0.15
//! ```

pub mod compositor;
pub mod font;
pub mod geometry;
pub mod logo;
pub mod normalize;
pub mod pipeline;
pub mod plate;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{blend_pixels, composite, Layer};
pub use font::{
    BitmapFace, BuiltinFontProvider, FileFontProvider, FontChain, FontLoadError, FontProvider,
    GlyphFace, OutlineFace, SystemFontProvider,
};
pub use geometry::{
    plan, FontScalePolicy, FontSizes, ImageDimensions, LayoutPlan, LayoutPolicy,
    PlacementPosition, Rect, TextMetrics,
};
pub use logo::{LogoAsset, LogoPlacement, LogoSettings, LogoStore};
pub use normalize::{normalize, resize_rgba, target_dimensions};
pub use pipeline::{LogoSource, Overlay, WatermarkPipeline, WatermarkRequest, WatermarkedImage};
pub use plate::{PlateStyle, MAX_PLATE_ALPHA};
pub use text_renderer::{author_line, TextLine, TextRole, TextSpec, TextStyle};
