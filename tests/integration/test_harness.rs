// Shared fixtures for the integration tests

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use photomark::codec::{OutputFormat, WebPEncoder};
use photomark::config::Config;
use photomark::watermark::FontChain;
use photomark::WatermarkPipeline;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration that never reaches for assets or fonts on the host.
pub fn hermetic_config() -> Config {
    let mut config = Config::default();
    config.logo.path = None;
    config.text.font_path = None;
    config.text.use_system_fonts = false;
    config.output.format = OutputFormat::WebP;
    config
}

/// Pipeline over the built-in bitmap face with real WebP output.
pub fn webp_pipeline(config: &Config) -> WatermarkPipeline {
    WatermarkPipeline::new(config)
        .with_font_chain(FontChain::builtin())
        .with_encoder(Arc::new(WebPEncoder))
}

/// Opaque canvas with a diagonal gradient so resampling has something to chew on.
pub fn gradient_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8, 255])
    })
}

pub fn png_bytes(image: RgbaImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

pub fn write_png(dir: &Path, name: &str, image: RgbaImage) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(image)).unwrap();
    path
}

pub fn is_webp(data: &[u8]) -> bool {
    data.len() > 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

pub fn is_avif(data: &[u8]) -> bool {
    data.len() > 12 && &data[4..8] == b"ftyp" && &data[8..12] == b"avif"
}
