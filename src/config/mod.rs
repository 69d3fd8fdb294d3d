// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::codec::{DecodeLimits, EncoderQuality, OutputFormat};
use crate::watermark::geometry::{FontScalePolicy, LayoutPolicy};
use crate::watermark::logo::LogoSettings;
use crate::watermark::plate::{PlateStyle, MAX_PLATE_ALPHA};
use crate::watermark::text_renderer::TextStyle;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub layout: LayoutPolicy,
    #[serde(default)]
    pub plate: PlateStyle,
    #[serde(default)]
    pub text: TextStyle,
    #[serde(default)]
    pub logo: LogoSettings,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub limits: DecodeLimits,
}

fn default_max_dimension() -> u32 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_quality() -> u8 {
    80
}

fn default_effort() -> u8 {
    6
}

/// Canvas size handling around the watermark stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Longest allowed canvas edge in pixels (default: 2000)
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// Shrink oversized canvases before watermarking (default: true)
    #[serde(default = "default_true")]
    pub normalize_before: bool,

    /// Shrink again after compositing (default: true)
    #[serde(default = "default_true")]
    pub normalize_after: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            normalize_before: default_true(),
            normalize_after: default_true(),
        }
    }
}

/// Delivery encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// avif or webp (default: avif)
    #[serde(default)]
    pub format: OutputFormat,

    /// Encoder quality, 1-100 (default: 80)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Encoder effort, 0-10 (default: 6)
    #[serde(default = "default_effort")]
    pub effort: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: default_quality(),
            effort: default_effort(),
        }
    }
}

impl OutputConfig {
    pub fn encoder_quality(&self) -> EncoderQuality {
        EncoderQuality::with_quality(self.quality).with_effort(self.effort)
    }
}

/// CPU worker pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Worker threads, 0 = one per available core (default: 0)
    #[serde(default)]
    pub threads: usize,

    /// Give up on a request after this many milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl WorkerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document is a valid, all-defaults config
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.pipeline.max_dimension == 0 {
            return Err("pipeline.max_dimension must be greater than 0".to_string());
        }

        if self.plate.max_alpha > MAX_PLATE_ALPHA {
            return Err(format!(
                "plate.max_alpha {} exceeds {}; the plate must stay translucent",
                self.plate.max_alpha, MAX_PLATE_ALPHA
            ));
        }

        if !(self.layout.widen_factor >= 1.0) {
            return Err(format!(
                "layout.widen_factor must be >= 1.0, got {}",
                self.layout.widen_factor
            ));
        }

        if !(self.layout.plate_lift >= 0.0) {
            return Err(format!(
                "layout.plate_lift must be >= 0, got {}",
                self.layout.plate_lift
            ));
        }

        match self.layout.font_scale {
            FontScalePolicy::Relative {
                divisor,
                secondary_reduction,
                min_font_px,
                padding_fraction,
                spacing_fraction,
            } => {
                if !(divisor > 0.0) {
                    return Err(format!(
                        "layout.font_scale.divisor must be positive, got {}",
                        divisor
                    ));
                }
                check_fraction("layout.font_scale.secondary_reduction", secondary_reduction)?;
                check_fraction("layout.font_scale.padding_fraction", padding_fraction)?;
                check_fraction("layout.font_scale.spacing_fraction", spacing_fraction)?;
                if !(min_font_px > 0.0) {
                    return Err(format!(
                        "layout.font_scale.min_font_px must be positive, got {}",
                        min_font_px
                    ));
                }
            }
            FontScalePolicy::Fixed {
                primary_px,
                secondary_px,
                ..
            } => {
                if !(primary_px > 0.0 && secondary_px > 0.0) {
                    return Err(format!(
                        "layout.font_scale sizes must be positive, got {}/{}",
                        primary_px, secondary_px
                    ));
                }
            }
        }

        check_fraction("logo.max_fraction", self.logo.max_fraction)?;

        if self.logo.max_size_px == Some(0) {
            return Err("logo.max_size_px must be greater than 0 when set".to_string());
        }

        if !(1..=100).contains(&self.output.quality) {
            return Err(format!(
                "output.quality must be between 1 and 100, got {}",
                self.output.quality
            ));
        }

        if self.output.effort > 10 {
            return Err(format!(
                "output.effort must be between 0 and 10, got {}",
                self.output.effort
            ));
        }

        if self.workers.timeout_ms == Some(0) {
            return Err("workers.timeout_ms must be greater than 0 when set".to_string());
        }

        if self.limits.max_input_bytes == 0 || self.limits.max_source_pixels == 0 {
            return Err("limits must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Fractions live strictly between 0 and 1.
fn check_fraction(name: &str, value: f32) -> Result<(), String> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(format!("{} must be between 0 and 1 (exclusive), got {}", name, value))
    }
}
