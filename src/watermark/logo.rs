//! Logo loading, scaling and placement.
//!
//! Logos are read from disk once and kept decoded in a TTL cache shared by
//! all requests. A logo that is missing or unreadable never fails a
//! request: the logo stage simply does nothing.

use image::RgbaImage;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::compositor::{composite as blend, Layer};
use super::geometry::{ImageDimensions, PlacementPosition, Rect};
use super::normalize::resize_rgba;
use crate::metrics::PipelineMetrics;

fn default_logo_path() -> Option<PathBuf> {
    Some(PathBuf::from("assets/logo.png"))
}

fn default_max_fraction() -> f32 {
    0.15
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_max_cache_entries() -> u64 {
    16
}

/// Logo configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoSettings {
    /// Logo file used when a request does not name one (default: assets/logo.png)
    #[serde(default = "default_logo_path")]
    pub path: Option<PathBuf>,

    /// Largest share of each canvas edge the logo may take (default: 0.15)
    #[serde(default = "default_max_fraction")]
    pub max_fraction: f32,

    /// Absolute cap on the logo's width and height in pixels
    #[serde(default)]
    pub max_size_px: Option<u32>,

    /// How long a decoded logo stays cached (default: 3600s)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of distinct logos cached (default: 16)
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: u64,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self {
            path: default_logo_path(),
            max_fraction: default_max_fraction(),
            max_size_px: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            max_cache_entries: default_max_cache_entries(),
        }
    }
}

/// A decoded logo, shared read-only between requests.
#[derive(Clone)]
pub struct LogoAsset {
    pub image: Arc<RgbaImage>,
}

impl std::fmt::Debug for LogoAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoAsset")
            .field("dimensions", &self.image.dimensions())
            .finish()
    }
}

impl LogoAsset {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

/// Load-once cache of decoded logos keyed by path.
#[derive(Clone)]
pub struct LogoStore {
    cache: Cache<PathBuf, LogoAsset>,
}

impl LogoStore {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_settings(settings: &LogoSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.cache_ttl_secs),
            settings.max_cache_entries,
        )
    }

    /// The decoded logo at `path`, or `None` when there is nothing usable.
    ///
    /// Missing files are logged at debug, undecodable ones at warn. Neither
    /// is cached, so a logo dropped in place later is picked up.
    pub fn load(&self, path: &Path) -> Option<LogoAsset> {
        let metrics = PipelineMetrics::global();

        if let Some(cached) = self.cache.get(path) {
            metrics.record_logo_cache("hit");
            return Some(cached);
        }

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Logo not found, skipping");
                metrics.record_logo_cache("missing");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read logo, skipping");
                metrics.record_logo_cache("invalid");
                return None;
            }
        };

        let image = match image::load_from_memory(&data) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to decode logo, skipping");
                metrics.record_logo_cache("invalid");
                return None;
            }
        };

        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Logo loaded"
        );
        metrics.record_logo_cache("miss");

        let asset = LogoAsset::new(image);
        self.cache.insert(path.to_path_buf(), asset.clone());
        Some(asset)
    }

    pub fn cache_size(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl std::fmt::Debug for LogoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

/// Where and how large the logo lands on a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoPlacement {
    pub scale: f64,
    pub rect: Rect,
}

/// Scale and anchor a `logo` on `canvas`.
///
/// `scale = min(1, max_w / logo_w, max_h / logo_h)` where the bounds are
/// `floor(edge * max_fraction)`, further capped by `max_size_px`. The logo
/// sits in the bottom-left corner. `None` when either side would vanish.
pub fn placement(
    canvas: ImageDimensions,
    logo: ImageDimensions,
    max_fraction: f32,
    max_size_px: Option<u32>,
) -> Option<LogoPlacement> {
    if canvas.is_empty() || logo.is_empty() {
        return None;
    }

    let fraction = max_fraction.clamp(0.0, 1.0) as f64;
    let cap = max_size_px.unwrap_or(u32::MAX);
    let max_w = ((canvas.width as f64 * fraction).floor() as u32).min(cap);
    let max_h = ((canvas.height as f64 * fraction).floor() as u32).min(cap);

    let scale = (max_w as f64 / logo.width as f64)
        .min(max_h as f64 / logo.height as f64)
        .min(1.0);

    let width = ((logo.width as f64 * scale).round() as u32).min(max_w);
    let height = ((logo.height as f64 * scale).round() as u32).min(max_h);

    if width == 0 || height == 0 {
        return None;
    }

    Some(LogoPlacement {
        scale,
        rect: Rect::new(0, canvas.height - height, width, height),
    })
}

/// Scale the logo for this canvas and blend it into the bottom-left corner.
///
/// Returns where it landed, `None` when the canvas is too small for any of it.
pub fn composite(
    canvas: &mut RgbaImage,
    logo: &LogoAsset,
    max_fraction: f32,
    max_size_px: Option<u32>,
) -> Result<Option<Rect>, String> {
    let canvas_dims = ImageDimensions::new(canvas.width(), canvas.height());
    let logo_dims = ImageDimensions::new(logo.image.width(), logo.image.height());

    let Some(placed) = placement(canvas_dims, logo_dims, max_fraction, max_size_px) else {
        tracing::debug!(
            canvas_width = canvas_dims.width,
            canvas_height = canvas_dims.height,
            "Canvas too small for logo, skipping"
        );
        return Ok(None);
    };

    let rect = placed.rect;
    let origin = PlacementPosition::new(rect.x as i32, rect.y as i32);

    if (rect.width, rect.height) == logo.image.dimensions() {
        blend(canvas, &Layer::new(&logo.image, origin));
    } else {
        let scaled = resize_rgba((*logo.image).clone(), rect.width, rect.height)?;
        blend(canvas, &Layer::new(&scaled, origin));
    }

    tracing::debug!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        scale = placed.scale,
        "Logo composited"
    );

    Ok(Some(rect))
}
