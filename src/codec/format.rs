//! Delivery formats and download naming

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::CodecError;

/// Prefix prepended to the suggested download name
const MARKED_PREFIX: &str = "marked_";

/// Stem used when the upload carried no usable name
const FALLBACK_STEM: &str = "output";

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Avif,
    WebP,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::WebP => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Avif => "image/avif",
            Self::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for OutputFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "avif" => Ok(OutputFormat::Avif),
            "webp" => Ok(OutputFormat::WebP),
            _ => Err(CodecError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Suggest a download name for a watermarked upload.
///
/// Keeps everything before the first `.` of the original name, drops any
/// directory part, and swaps in the delivery extension:
/// `holiday.photo.jpg` → `marked_holiday.avif`.
pub fn output_filename(original: Option<&str>, format: OutputFormat) -> String {
    let stem = original
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name))
        .and_then(|name| name.split('.').next())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(FALLBACK_STEM);

    format!("{}{}.{}", MARKED_PREFIX, stem, format.extension())
}
