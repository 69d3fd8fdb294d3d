//! Font fallback chain.
//!
//! Faces are resolved once through an ordered list of [`FontProvider`]s:
//! the configured font file, then a bold sans-serif from the system font
//! database, then a built-in 8x8 bitmap face. The bitmap face cannot fail,
//! so text rendering never fails because of fonts. Provider failures are
//! logged and skipped.

use ab_glyph::{point, Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use super::compositor::blend_pixels;
use super::geometry::{PlacementPosition, TextMetrics};

/// Why a provider could not supply a face.
#[derive(Debug, thiserror::Error)]
pub enum FontLoadError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("font data from {origin} is not a usable font")]
    Invalid { origin: String },

    #[error("no system font matches family '{family}'")]
    NotFound { family: String },
}

/// A face that can measure and rasterize a single line of text.
pub trait GlyphFace: Send + Sync {
    /// Short description for logs.
    fn name(&self) -> &str;

    /// Extent of `text` at `px` pixels.
    fn measure(&self, text: &str, px: f32) -> TextMetrics;

    /// Draw `text` with its box's top-left at `origin`, blending each covered
    /// pixel over `target` with `color`. Pixels outside `target` are clipped.
    fn draw(
        &self,
        text: &str,
        px: f32,
        origin: PlacementPosition,
        color: Rgba<u8>,
        target: &mut RgbaImage,
    );
}

/// A source of one face.
pub trait FontProvider: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self) -> Result<Arc<dyn GlyphFace>, FontLoadError>;
}

/// Scalable outline face backed by `ab_glyph`.
pub struct OutlineFace {
    font: FontArc,
    name: String,
}

impl OutlineFace {
    pub fn new(font: FontArc, name: impl Into<String>) -> Self {
        Self {
            font,
            name: name.into(),
        }
    }

    /// Walk the line, yielding each glyph id with its pen x offset.
    fn layout(&self, text: &str, scale: PxScale) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(scale);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor = 0.0f32;
        let mut prev: Option<GlyphId> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                cursor += scaled.kern(prev, id);
            }
            glyphs.push((id, cursor));
            cursor += scaled.h_advance(id);
            prev = Some(id);
        }

        (glyphs, cursor)
    }
}

impl GlyphFace for OutlineFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&self, text: &str, px: f32) -> TextMetrics {
        if px <= 0.0 {
            return TextMetrics::default();
        }

        let scale = PxScale::from(px);
        let (_, width) = self.layout(text, scale);
        let height = self.font.as_scaled(scale).height();

        TextMetrics::new(width.max(0.0).ceil() as u32, height.max(0.0).ceil() as u32)
    }

    fn draw(
        &self,
        text: &str,
        px: f32,
        origin: PlacementPosition,
        color: Rgba<u8>,
        target: &mut RgbaImage,
    ) {
        if px <= 0.0 || text.is_empty() {
            return;
        }

        let scale = PxScale::from(px);
        let baseline = origin.y as f32 + self.font.as_scaled(scale).ascent();
        let (glyphs, _) = self.layout(text, scale);
        let (width, height) = (target.width() as i32, target.height() as i32);

        for (id, offset) in glyphs {
            let glyph = id.with_scale_and_position(scale, point(origin.x as f32 + offset, baseline));

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();

            outlined.draw(|gx, gy, coverage| {
                let x = gx as i32 + bounds.min.x as i32;
                let y = gy as i32 + bounds.min.y as i32;

                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }

                let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32).round() as u8;
                let pixel = target.get_pixel_mut(x as u32, y as u32);
                *pixel = blend_pixels(*pixel, Rgba([color[0], color[1], color[2], alpha]));
            });
        }
    }
}

/// Built-in 8x8 bitmap face, scaled by whole pixels.
///
/// Covers ASCII and Latin-1 (including `©`); anything else draws as `?`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapFace;

const CELL: u32 = 8;

impl BitmapFace {
    fn scale(px: f32) -> u32 {
        ((px / CELL as f32).round() as u32).max(1)
    }

    fn glyph(c: char) -> [u8; 8] {
        BASIC_FONTS
            .get(c)
            .or_else(|| LATIN_FONTS.get(c))
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8])
    }
}

impl GlyphFace for BitmapFace {
    fn name(&self) -> &str {
        "builtin-8x8"
    }

    fn measure(&self, text: &str, px: f32) -> TextMetrics {
        if px <= 0.0 {
            return TextMetrics::default();
        }

        let scale = Self::scale(px);
        let cell = CELL.saturating_mul(scale);
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        TextMetrics::new(chars.saturating_mul(cell), cell)
    }

    fn draw(
        &self,
        text: &str,
        px: f32,
        origin: PlacementPosition,
        color: Rgba<u8>,
        target: &mut RgbaImage,
    ) {
        if px <= 0.0 {
            return;
        }

        let scale = Self::scale(px) as i64;
        let cell = CELL as i64 * scale;
        let (width, height) = (target.width() as i64, target.height() as i64);

        for (index, c) in text.chars().enumerate() {
            let glyph_x = origin.x as i64 + index as i64 * cell;
            if glyph_x >= width {
                break;
            }
            if glyph_x + cell <= 0 {
                continue;
            }

            for (row, &bits) in Self::glyph(c).iter().enumerate() {
                for col in 0..CELL as i64 {
                    // Least significant bit is the leftmost pixel
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }

                    let x0 = glyph_x + col * scale;
                    let y0 = origin.y as i64 + row as i64 * scale;

                    for y in y0.max(0)..(y0 + scale).min(height) {
                        for x in x0.max(0)..(x0 + scale).min(width) {
                            let pixel = target.get_pixel_mut(x as u32, y as u32);
                            *pixel = blend_pixels(*pixel, color);
                        }
                    }
                }
            }
        }
    }
}

/// Loads a TrueType/OpenType file from disk.
pub struct FileFontProvider {
    path: PathBuf,
    name: String,
}

impl FileFontProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FontProvider for FileFontProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Arc<dyn GlyphFace>, FontLoadError> {
        let data = std::fs::read(&self.path).map_err(|source| FontLoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        let font = FontArc::try_from_vec(data).map_err(|_| FontLoadError::Invalid {
            origin: self.path.display().to_string(),
        })?;

        Ok(Arc::new(OutlineFace::new(font, self.name.clone())))
    }
}

/// Bold sans-serif from the platform font database.
///
/// Prefers the named family, then any sans-serif the database maps to.
pub struct SystemFontProvider {
    family: Option<String>,
    name: String,
}

impl SystemFontProvider {
    pub fn new(family: Option<String>) -> Self {
        let name = match &family {
            Some(family) => format!("system:{}", family),
            None => "system:sans-serif".to_string(),
        };
        Self { family, name }
    }
}

impl FontProvider for SystemFontProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Arc<dyn GlyphFace>, FontLoadError> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let mut families = Vec::with_capacity(2);
        if let Some(family) = &self.family {
            families.push(fontdb::Family::Name(family));
        }
        families.push(fontdb::Family::SansSerif);

        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::BOLD,
            ..Default::default()
        };

        let not_found = || FontLoadError::NotFound {
            family: self
                .family
                .clone()
                .unwrap_or_else(|| "sans-serif".to_string()),
        };

        let id = db.query(&query).ok_or_else(not_found)?;

        let font = db
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index)
            })
            .ok_or_else(not_found)?
            .map_err(|_| FontLoadError::Invalid {
                origin: self.name.clone(),
            })?;

        Ok(Arc::new(OutlineFace::new(FontArc::new(font), self.name.clone())))
    }
}

/// Always supplies [`BitmapFace`].
#[derive(Debug, Default)]
pub struct BuiltinFontProvider;

impl FontProvider for BuiltinFontProvider {
    fn name(&self) -> &str {
        "builtin"
    }

    fn load(&self) -> Result<Arc<dyn GlyphFace>, FontLoadError> {
        Ok(Arc::new(BitmapFace))
    }
}

/// Ordered providers with a resolve-once cache.
pub struct FontChain {
    providers: Vec<Box<dyn FontProvider>>,
    resolved: OnceLock<Arc<dyn GlyphFace>>,
}

impl FontChain {
    pub fn new(providers: Vec<Box<dyn FontProvider>>) -> Self {
        Self {
            providers,
            resolved: OnceLock::new(),
        }
    }

    /// Configured file, optionally the system database, then the bitmap face.
    pub fn standard(
        font_path: Option<&Path>,
        system_family: Option<&str>,
        use_system_fonts: bool,
    ) -> Self {
        let mut providers: Vec<Box<dyn FontProvider>> = Vec::with_capacity(3);

        if let Some(path) = font_path {
            providers.push(Box::new(FileFontProvider::new(path)));
        }
        if use_system_fonts {
            providers.push(Box::new(SystemFontProvider::new(
                system_family.map(str::to_string),
            )));
        }
        providers.push(Box::new(BuiltinFontProvider));

        Self::new(providers)
    }

    /// Only the bitmap face. Deterministic across machines.
    pub fn builtin() -> Self {
        Self::new(vec![Box::new(BuiltinFontProvider)])
    }

    /// The first face any provider supplies, resolved once.
    pub fn resolve(&self) -> Arc<dyn GlyphFace> {
        self.resolved
            .get_or_init(|| {
                for provider in &self.providers {
                    match provider.load() {
                        Ok(face) => {
                            tracing::debug!(provider = provider.name(), "Font resolved");
                            return face;
                        }
                        Err(e) => {
                            tracing::warn!(
                                provider = provider.name(),
                                error = %e,
                                "Font provider failed, trying next"
                            );
                        }
                    }
                }

                tracing::warn!("No font provider succeeded, using built-in bitmap face");
                Arc::new(BitmapFace)
            })
            .clone()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl std::fmt::Debug for FontChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontChain")
            .field("providers", &self.provider_names())
            .field("resolved", &self.resolved.get().map(|face| face.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingProvider {
        calls: Arc<AtomicUsize>,
    }

    impl FontProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn load(&self) -> Result<Arc<dyn GlyphFace>, FontLoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FontLoadError::Invalid {
                origin: "test".to_string(),
            })
        }
    }

    #[test]
    fn test_bitmap_measure_scales_with_size() {
        assert_eq!(BitmapFace.measure("abc", 8.0), TextMetrics::new(24, 8));
        assert_eq!(BitmapFace.measure("abc", 24.0), TextMetrics::new(72, 24));
        // Never below one pixel per cell bit
        assert_eq!(BitmapFace.measure("a", 2.0), TextMetrics::new(8, 8));
        assert_eq!(BitmapFace.measure("", 24.0), TextMetrics::new(0, 24));
    }

    #[test]
    fn test_bitmap_measure_saturates_on_huge_lines() {
        let line = "x".repeat(6_000_000);
        assert_eq!(BitmapFace.measure(&line, 800.0), TextMetrics::new(u32::MAX, 800));
    }

    #[test]
    fn test_bitmap_measure_counts_chars_not_bytes() {
        assert_eq!(BitmapFace.measure("Jane Doe ©", 8.0).width, 10 * 8);
    }

    #[test]
    fn test_bitmap_draw_paints_glyph() {
        let mut target = RgbaImage::new(16, 16);
        BitmapFace.draw(
            "H",
            16.0,
            PlacementPosition::new(0, 0),
            Rgba([255, 255, 255, 255]),
            &mut target,
        );

        let painted = target.pixels().filter(|p| p[3] == 255).count();
        assert!(painted > 0);
        assert!(target.pixels().all(|p| p[3] == 0 || p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_bitmap_draw_clips_off_target() {
        let mut target = RgbaImage::new(10, 10);
        BitmapFace.draw(
            "WWWWWWWWWW",
            24.0,
            PlacementPosition::new(-30, -5),
            Rgba([255, 255, 255, 255]),
            &mut target,
        );
        // Far outside in the other direction
        BitmapFace.draw(
            "W",
            24.0,
            PlacementPosition::new(500, 500),
            Rgba([255, 255, 255, 255]),
            &mut target,
        );
    }

    #[test]
    fn test_unknown_chars_fall_back_to_question_mark() {
        assert_eq!(BitmapFace::glyph('\u{4e16}'), BitmapFace::glyph('?'));
        assert_ne!(BitmapFace::glyph('©'), BitmapFace::glyph('?'));
    }

    #[test]
    fn test_missing_font_file_is_io_error() {
        let provider = FileFontProvider::new("/nonexistent/font.ttf");
        assert!(matches!(provider.load(), Err(FontLoadError::Io { .. })));
    }

    #[test]
    fn test_garbage_font_file_is_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a font").unwrap();

        let provider = FileFontProvider::new(file.path());
        assert!(matches!(provider.load(), Err(FontLoadError::Invalid { .. })));
    }

    #[test]
    fn test_chain_falls_through_to_builtin() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FontChain::new(vec![
            Box::new(FailingProvider {
                calls: calls.clone(),
            }),
            Box::new(FileFontProvider::new("/nonexistent/font.ttf")),
            Box::new(BuiltinFontProvider),
        ]);

        assert_eq!(chain.resolve().name(), "builtin-8x8");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chain_resolves_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FontChain::new(vec![Box::new(FailingProvider {
            calls: calls.clone(),
        })]);

        let first = chain.resolve();
        let second = chain.resolve();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_chain_still_resolves() {
        let chain = FontChain::new(Vec::new());
        assert_eq!(chain.resolve().name(), "builtin-8x8");
    }

    #[test]
    fn test_standard_chain_order() {
        let chain = FontChain::standard(Some(Path::new("fonts/bold.ttf")), Some("Segoe UI"), true);
        assert_eq!(
            chain.provider_names(),
            vec!["file:fonts/bold.ttf", "system:Segoe UI", "builtin"]
        );

        let chain = FontChain::standard(None, None, false);
        assert_eq!(chain.provider_names(), vec!["builtin"]);
    }
}
