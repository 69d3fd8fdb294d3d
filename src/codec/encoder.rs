//! Image encoder abstraction
//!
//! Provides a trait-based encoder system that allows:
//! - Swapping delivery codecs without touching the pipeline
//! - Consistent quality/effort settings across formats
//! - Test doubles that fail on demand

use imgref::Img;
use rgb::FromSlice;

use super::error::CodecError;
use super::format::OutputFormat;

/// Quality settings for image encoding
#[derive(Debug, Clone, Copy)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
    /// Effort/speed trade-off (0-10, where 10 is slowest/best compression)
    pub effort: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: 80,
            effort: 6,
        }
    }
}

impl EncoderQuality {
    /// Create quality settings with specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            ..Self::default()
        }
    }

    /// Set the encoding effort (speed vs compression trade-off)
    pub fn with_effort(mut self, effort: u8) -> Self {
        self.effort = effort.clamp(0, 10);
        self
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// The output format
    pub format: OutputFormat,
    /// Content-Type header value
    pub content_type: &'static str,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: OutputFormat) -> Self {
        let content_type = format.content_type();
        Self {
            data,
            format,
            content_type,
        }
    }
}

/// Trait for image encoders
///
/// Implementations encode straight-alpha RGBA8 pixel data. The trait is
/// object-safe so the pipeline can hold any encoder behind an `Arc`.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode raw RGBA image data to the target format
    ///
    /// # Arguments
    /// * `data` - Raw pixel data in RGBA format (4 bytes per pixel)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `quality` - Quality settings
    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, CodecError>;
}

/// Reject buffers the codecs cannot represent.
fn check_layout(
    format: OutputFormat,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<(), CodecError> {
    if width == 0 || height == 0 {
        return Err(CodecError::encode_failed(
            format.as_str(),
            format!("empty canvas {}x{}", width, height),
        ));
    }

    let expected = width as usize * height as usize * 4;
    if data.len() != expected {
        return Err(CodecError::encode_failed(
            format.as_str(),
            format!(
                "expected {} bytes of RGBA data for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            ),
        ));
    }

    Ok(())
}

/// AVIF encoder backed by `ravif`
#[derive(Debug, Default)]
pub struct AvifEncoder;

impl AvifEncoder {
    /// Map effort (0 = fastest, 10 = slowest) onto rav1e speed (10 = fastest, 1 = slowest).
    fn speed_for(effort: u8) -> u8 {
        (10 - effort.min(10)).clamp(1, 10)
    }
}

impl ImageEncoder for AvifEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Avif
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, CodecError> {
        check_layout(OutputFormat::Avif, data, width, height)?;

        let pixels = Img::new(data.as_rgba(), width as usize, height as usize);

        let encoded = ravif::Encoder::new()
            .with_quality(quality.quality as f32)
            .with_alpha_quality(quality.quality as f32)
            .with_speed(Self::speed_for(quality.effort))
            .encode_rgba(pixels)
            .map_err(|e| CodecError::encode_failed("avif", e.to_string()))?;

        Ok(EncodedImage::new(encoded.avif_file, OutputFormat::Avif))
    }
}

/// Lossy WebP encoder backed by libwebp
#[derive(Debug, Default)]
pub struct WebPEncoder;

impl WebPEncoder {
    /// Map effort (0 = fastest, 10 = slowest) onto libwebp's method (0 = fastest, 6 = slowest).
    fn method_for(effort: u8) -> i32 {
        (effort.min(10) as i32 * 6 + 5) / 10
    }
}

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, CodecError> {
        check_layout(OutputFormat::WebP, data, width, height)?;

        let mut config = webp::WebPConfig::new()
            .map_err(|_| CodecError::encode_failed("webp", "invalid encoder configuration"))?;
        config.lossless = 0;
        config.alpha_compression = 1;
        config.quality = quality.quality as f32;
        config.method = Self::method_for(quality.effort);

        let encoder = webp::Encoder::from_rgba(data, width, height);
        let memory = encoder
            .encode_advanced(&config)
            .map_err(|e| CodecError::encode_failed("webp", format!("{:?}", e)))?;

        Ok(EncodedImage::new(memory.to_vec(), OutputFormat::WebP))
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Avif => Box::new(AvifEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
        }
    }
}
