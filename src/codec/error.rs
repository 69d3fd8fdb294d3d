//! Codec error types
//!
//! Structured decode/encode failures with HTTP status mapping for the
//! boundary layer.

use std::fmt;

/// Errors raised while turning bytes into a canvas or a canvas into bytes
#[derive(Debug, Clone)]
pub enum CodecError {
    // === Decoding Errors ===
    /// No bytes were supplied
    EmptyInput,
    /// Input is larger than the configured byte limit
    InputTooLarge { size: usize, max_size: usize },
    /// Failed to decode image data
    DecodeFailed { message: String },
    /// Image dimensions exceed safety limits (decode bomb protection)
    ImageTooLarge {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    // === Encoding Errors ===
    /// Output format name is not one we deliver
    UnsupportedFormat { format: String },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::EmptyInput => write!(f, "Empty image input"),
            CodecError::InputTooLarge { size, max_size } => {
                write!(
                    f,
                    "Input size {} bytes exceeds maximum {} bytes",
                    size, max_size
                )
            }
            CodecError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            CodecError::ImageTooLarge {
                width,
                height,
                pixels,
                max_pixels,
            } => {
                write!(
                    f,
                    "Image dimensions {}x{} ({} pixels) exceed limit of {} pixels",
                    width, height, pixels, max_pixels
                )
            }
            CodecError::UnsupportedFormat { format } => {
                write!(f, "Unsupported output format: {}", format)
            }
            CodecError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl CodecError {
    pub fn decode_failed(message: impl Into<String>) -> Self {
        CodecError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn too_large(width: u32, height: u32, max_pixels: u64) -> Self {
        CodecError::ImageTooLarge {
            width,
            height,
            pixels: width as u64 * height as u64,
            max_pixels,
        }
    }
}
