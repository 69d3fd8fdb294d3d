//! Watermark pipeline orchestration.
//!
//! One run owns its canvas and walks it through every stage in order:
//!
//! ```text
//! Decoded → Normalized → Planned → PlateBuilt → TextComposited → LogoComposited → Encoded
//! ```
//!
//! The logo stage may do nothing. Any failure ends the run with a single
//! [`ProcessingFailed`] naming the last stage that completed; there is no
//! partial output.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::compositor::{composite, Layer};
use super::font::FontChain;
use super::geometry::{plan, ImageDimensions, LayoutPlan, LayoutPolicy};
use super::logo::{self, LogoSettings, LogoStore};
use super::normalize::normalize;
use super::plate::{self, PlateStyle};
use super::text_renderer::{self, metrics_for, TextRole, TextSpec, TextStyle};
use crate::codec::{
    output_filename, CodecError, EncoderFactory, EncoderQuality, ImageEncoder, OutputFormat,
};
use crate::config::{Config, PipelineConfig};
use crate::error::{FailureCause, ProcessingFailed, Stage};
use crate::metrics::PipelineMetrics;

/// Which logo a request wants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogoSource {
    /// The logo named in the configuration, if any.
    #[default]
    Configured,
    /// A specific logo file.
    Path(PathBuf),
    /// Skip the logo stage.
    Disabled,
}

/// Everything one run needs besides the pipeline's own settings.
#[derive(Debug, Clone)]
pub struct WatermarkRequest {
    /// Decoded straight-alpha canvas.
    pub canvas: RgbaImage,
    pub author: String,
    pub location: String,
    pub logo: LogoSource,
    /// Original upload name, used to suggest the output file name.
    pub upload_name: Option<String>,
}

impl WatermarkRequest {
    pub fn new(canvas: RgbaImage, author: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            canvas,
            author: author.into(),
            location: location.into(),
            logo: LogoSource::default(),
            upload_name: None,
        }
    }

    pub fn with_logo(mut self, logo: LogoSource) -> Self {
        self.logo = logo;
        self
    }

    pub fn with_upload_name(mut self, name: impl Into<String>) -> Self {
        self.upload_name = Some(name.into());
        self
    }
}

/// Encoded result of a successful run.
#[derive(Debug, Clone)]
pub struct WatermarkedImage {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// The attribution overlay for one canvas: where it goes and what it looks like.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub plan: LayoutPlan,
    /// Plate with the text already drawn on it, sized to `plan.plate_box`.
    pub layer: RgbaImage,
}

/// Watermark pipeline with its shared, read-only collaborators.
///
/// Cheap to share behind an `Arc`; every run works on its own canvas.
pub struct WatermarkPipeline {
    settings: PipelineConfig,
    layout: LayoutPolicy,
    plate: PlateStyle,
    text: TextStyle,
    logo: LogoSettings,
    quality: EncoderQuality,
    fonts: Arc<FontChain>,
    logos: LogoStore,
    encoder: Arc<dyn ImageEncoder>,
}

impl WatermarkPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.pipeline.clone(),
            layout: config.layout,
            plate: config.plate,
            text: config.text.clone(),
            logo: config.logo.clone(),
            quality: config.output.encoder_quality(),
            fonts: Arc::new(config.text.font_chain()),
            logos: LogoStore::from_settings(&config.logo),
            encoder: Arc::from(EncoderFactory::create(config.output.format)),
        }
    }

    /// Replace the encoder, e.g. with a test double.
    pub fn with_encoder(mut self, encoder: Arc<dyn ImageEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_font_chain(mut self, fonts: FontChain) -> Self {
        self.fonts = Arc::new(fonts);
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.encoder.format()
    }

    pub fn logo_store(&self) -> &LogoStore {
        &self.logos
    }

    /// Run every stage and encode the result.
    pub fn process(&self, request: WatermarkRequest) -> Result<WatermarkedImage, ProcessingFailed> {
        let metrics = PipelineMetrics::global();
        let span = tracing::info_span!(
            "watermark",
            width = request.canvas.width(),
            height = request.canvas.height(),
            format = self.encoder.format().as_str(),
        );
        let _guard = span.enter();
        let started = Instant::now();

        let result = self.run(request);

        match &result {
            Ok(image) => {
                metrics.record_run("success");
                tracing::info!(
                    width = image.width,
                    height = image.height,
                    bytes = image.data.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Watermark applied"
                );
            }
            Err(e) => {
                metrics.record_run("failure");
                tracing::error!(stage = %e.stage, error = %e, "Watermark failed");
            }
        }

        result
    }

    fn run(&self, request: WatermarkRequest) -> Result<WatermarkedImage, ProcessingFailed> {
        let logo = self.logo_path(&request.logo);
        let canvas = self.compose(
            request.canvas,
            &request.author,
            &request.location,
            logo.as_deref(),
        )?;

        let metrics = PipelineMetrics::global();
        let timer = metrics.start_stage_timer(Stage::Encoded);
        let (width, height) = canvas.dimensions();
        let encoded = self
            .encoder
            .encode(canvas.as_raw(), width, height, self.quality)
            .map_err(|e| ProcessingFailed::encode(Stage::LogoComposited, e))?;
        timer.observe_duration();
        tracing::debug!(stage = %Stage::Encoded, bytes = encoded.data.len(), "Stage complete");

        Ok(WatermarkedImage {
            filename: output_filename(request.upload_name.as_deref(), encoded.format),
            content_type: encoded.content_type,
            data: encoded.data,
            width,
            height,
        })
    }

    /// Every stage except encoding; returns the finished canvas.
    ///
    /// A canvas with no pixels is refused as empty input before any stage runs.
    pub fn compose(
        &self,
        canvas: RgbaImage,
        author: &str,
        location: &str,
        logo_path: Option<&Path>,
    ) -> Result<RgbaImage, ProcessingFailed> {
        if canvas.width() == 0 || canvas.height() == 0 {
            return Err(ProcessingFailed::decode(CodecError::EmptyInput));
        }

        let metrics = PipelineMetrics::global();
        let max_dimension = self.settings.max_dimension;

        let timer = metrics.start_stage_timer(Stage::Normalized);
        let mut canvas = if self.settings.normalize_before {
            normalize(canvas, max_dimension)
                .map_err(|e| ProcessingFailed::new(Stage::Decoded, FailureCause::Resize(e)))?
        } else {
            canvas
        };
        timer.observe_duration();
        stage_complete(Stage::Normalized);

        let overlay = self.overlay(
            ImageDimensions::new(canvas.width(), canvas.height()),
            author,
            location,
        );

        let timer = metrics.start_stage_timer(Stage::TextComposited);
        composite(
            &mut canvas,
            &Layer::new(&overlay.layer, overlay.plan.plate_box.origin()),
        );
        timer.observe_duration();
        stage_complete(Stage::TextComposited);

        let timer = metrics.start_stage_timer(Stage::LogoComposited);
        if let Some(asset) = logo_path.and_then(|path| self.logos.load(path)) {
            logo::composite(
                &mut canvas,
                &asset,
                self.logo.max_fraction,
                self.logo.max_size_px,
            )
            .map_err(|e| ProcessingFailed::new(Stage::TextComposited, FailureCause::Resize(e)))?;
        }
        timer.observe_duration();
        stage_complete(Stage::LogoComposited);

        if self.settings.normalize_after {
            canvas = normalize(canvas, max_dimension).map_err(|e| {
                ProcessingFailed::new(Stage::LogoComposited, FailureCause::Resize(e))
            })?;
        }

        Ok(canvas)
    }

    /// Plan the layout and build the attribution overlay for a canvas size.
    ///
    /// Pure with respect to its inputs: the same canvas size and text always
    /// produce the same plan and the same pixels.
    pub fn overlay(&self, canvas: ImageDimensions, author: &str, location: &str) -> Overlay {
        let metrics = PipelineMetrics::global();
        let face = self.fonts.resolve();

        let timer = metrics.start_stage_timer(Stage::Planned);
        let sizes = self.layout.font_scale.font_sizes(canvas);
        let specs = TextSpec::attribution(author, location);
        let lines = text_renderer::measure(&specs, sizes, face.as_ref());
        let layout = plan(
            canvas,
            metrics_for(&lines, TextRole::Primary),
            metrics_for(&lines, TextRole::Secondary),
            &self.layout,
        );
        timer.observe_duration();
        tracing::debug!(
            stage = %Stage::Planned,
            primary_px = sizes.primary,
            secondary_px = sizes.secondary,
            plate = ?layout.plate_box,
            "Stage complete"
        );

        let timer = metrics.start_stage_timer(Stage::PlateBuilt);
        let base = plate::build(&layout.plate_box, &self.plate);
        timer.observe_duration();
        stage_complete(Stage::PlateBuilt);

        let layer = text_renderer::render(base, &lines, &layout, face.as_ref(), &self.text);

        Overlay {
            plan: layout,
            layer,
        }
    }

    fn logo_path(&self, source: &LogoSource) -> Option<PathBuf> {
        match source {
            LogoSource::Configured => self.logo.path.clone(),
            LogoSource::Path(path) => Some(path.clone()),
            LogoSource::Disabled => None,
        }
    }
}

impl std::fmt::Debug for WatermarkPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkPipeline")
            .field("settings", &self.settings)
            .field("format", &self.encoder.format())
            .field("fonts", &self.fonts)
            .field("logos", &self.logos)
            .finish()
    }
}

fn stage_complete(stage: Stage) {
    tracing::debug!(stage = %stage, "Stage complete");
}
