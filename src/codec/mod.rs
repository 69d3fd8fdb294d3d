//! Image codec boundary
//!
//! Everything that touches encoded bytes lives here:
//! - Decoding uploads into RGBA canvases (with size guards)
//! - Encoding finished canvases to AVIF or WebP
//! - Naming the delivered file
//!
//! The watermark pipeline only ever sees decoded pixels and an
//! [`ImageEncoder`] trait object.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;

pub use decoder::{decode, DecodeLimits};
pub use encoder::{
    AvifEncoder, EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder, WebPEncoder,
};
pub use error::CodecError;
pub use format::{output_filename, OutputFormat};
