// Photomark watermarking library
// Author/location watermark compositing with AVIF/WebP delivery

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod service;
pub mod watermark;

pub use error::{FailureCause, ProcessingFailed, Stage};
pub use service::{Upload, WatermarkService};
pub use watermark::{WatermarkPipeline, WatermarkRequest, WatermarkedImage};
