// End-to-end runs of the watermark pipeline with real encoders

use super::test_harness::{gradient_canvas, hermetic_config, is_avif, is_webp, webp_pipeline};
use image::Rgba;
use photomark::codec::{AvifEncoder, CodecError, OutputFormat};
use photomark::watermark::{FontChain, ImageDimensions, LogoSource, MAX_PLATE_ALPHA};
use photomark::metrics::PipelineMetrics;
use photomark::{FailureCause, Stage, WatermarkPipeline, WatermarkRequest};
use std::path::Path;
use std::sync::Arc;

#[test]
fn test_large_landscape_is_capped_and_encoded() {
    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);

    let request = WatermarkRequest::new(gradient_canvas(4000, 3000), "Jane Doe", "Paris")
        .with_upload_name("eiffel.tower.jpg");
    let image = pipeline.process(request).unwrap();

    assert_eq!((image.width, image.height), (2000, 1500));
    assert_eq!(image.content_type, "image/webp");
    assert_eq!(image.filename, "marked_eiffel.webp");
    assert!(is_webp(&image.data));
}

#[test]
fn test_avif_output_has_avif_brand() {
    let mut config = hermetic_config();
    config.output.format = OutputFormat::Avif;
    config.output.effort = 0;
    config.output.quality = 50;

    let pipeline = WatermarkPipeline::new(&config)
        .with_font_chain(FontChain::builtin())
        .with_encoder(Arc::new(AvifEncoder));

    let image = pipeline
        .process(WatermarkRequest::new(
            gradient_canvas(160, 120),
            "Jane Doe",
            "Paris",
        ))
        .unwrap();

    assert_eq!(image.content_type, "image/avif");
    assert_eq!(image.filename, "marked_output.avif");
    assert!(is_avif(&image.data));
}

#[test]
fn test_small_square_with_empty_author() {
    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);

    let image = pipeline
        .process(WatermarkRequest::new(gradient_canvas(500, 500), "", "Paris"))
        .unwrap();
    assert_eq!((image.width, image.height), (500, 500));
    assert!(is_webp(&image.data));

    // The author line still carries the copyright sign, so the plate never collapses
    let overlay = pipeline.overlay(ImageDimensions::new(500, 500), "", "Paris");
    assert!(!overlay.plan.plate_box.is_empty());
    assert!(overlay.plan.plate_box.right() <= 500);
    assert!(overlay.plan.plate_box.bottom() <= 500);
}

#[test]
fn test_watermark_lands_in_bottom_right() {
    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);
    let original = gradient_canvas(1200, 800);

    let marked = pipeline
        .compose(original.clone(), "Jane Doe", "Paris", None)
        .unwrap();
    let overlay = pipeline.overlay(ImageDimensions::new(1200, 800), "Jane Doe", "Paris");
    let plate = overlay.plan.plate_box;

    // Top-left quadrant untouched
    for y in 0..400 {
        for x in 0..600 {
            assert_eq!(marked.get_pixel(x, y), original.get_pixel(x, y));
        }
    }

    // Something changed inside the plate
    let changed = (plate.y..plate.bottom())
        .flat_map(|y| (plate.x..plate.right()).map(move |x| (x, y)))
        .any(|(x, y)| marked.get_pixel(x, y) != original.get_pixel(x, y));
    assert!(changed);

    assert!(plate.x > 600);
    assert!(plate.y > 400);
}

#[test]
fn test_plate_never_exceeds_alpha_cap() {
    let mut config = hermetic_config();
    config.plate.max_alpha = 255;
    let pipeline = webp_pipeline(&config);

    let overlay = pipeline.overlay(ImageDimensions::new(800, 600), "Jane Doe", "Paris");
    let Rgba([.., alpha]) = *overlay.layer.get_pixel(overlay.layer.width() - 1, 0);
    assert!(alpha <= MAX_PLATE_ALPHA);
}

#[test]
fn test_same_input_same_bytes() {
    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);

    let first = pipeline
        .compose(gradient_canvas(900, 600), "Jane Doe", "Paris", None)
        .unwrap();
    let second = pipeline
        .compose(gradient_canvas(900, 600), "Jane Doe", "Paris", None)
        .unwrap();

    assert_eq!(first.as_raw(), second.as_raw());
}

#[test]
fn test_missing_logo_matches_disabled_logo() {
    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);

    let without = pipeline
        .compose(gradient_canvas(640, 480), "Jane Doe", "Paris", None)
        .unwrap();
    let missing = pipeline
        .compose(
            gradient_canvas(640, 480),
            "Jane Doe",
            "Paris",
            Some(Path::new("/nonexistent/photomark/logo.png")),
        )
        .unwrap();

    assert_eq!(without.as_raw(), missing.as_raw());

    let disabled = pipeline
        .process(
            WatermarkRequest::new(gradient_canvas(640, 480), "Jane Doe", "Paris")
                .with_logo(LogoSource::Disabled),
        )
        .unwrap();
    let absent = pipeline
        .process(
            WatermarkRequest::new(gradient_canvas(640, 480), "Jane Doe", "Paris").with_logo(
                LogoSource::Path("/nonexistent/photomark/logo.png".into()),
            ),
        )
        .unwrap();
    assert_eq!(disabled.data, absent.data);
}

#[test]
fn test_portrait_is_capped_on_height() {
    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);

    let image = pipeline
        .process(WatermarkRequest::new(gradient_canvas(1200, 2400), "Jane", "Oslo"))
        .unwrap();

    assert_eq!((image.width, image.height), (1000, 2000));
}

#[test]
fn test_empty_canvas_is_refused() {
    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);

    let err = pipeline
        .process(WatermarkRequest::new(gradient_canvas(0, 0), "Jane", "Paris"))
        .unwrap_err();

    assert!(matches!(
        err.cause,
        FailureCause::Decode(CodecError::EmptyInput)
    ));
    assert_eq!(err.stage, Stage::Queued);
}

#[test]
fn test_metrics_dump_covers_stages_and_runs() {
    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);

    pipeline
        .process(WatermarkRequest::new(gradient_canvas(120, 80), "Jane", "Paris"))
        .unwrap();

    let dump = PipelineMetrics::render();
    assert!(dump.contains("photomark_pipeline_runs_total{outcome=\"success\"}"));
    assert!(dump.contains("photomark_stage_duration_seconds_bucket{stage=\"encoded\""));
    assert!(dump.contains("stage=\"plate_built\""));
}
