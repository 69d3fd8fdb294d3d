// Configuration files driving a full service run

use super::test_harness::{gradient_canvas, is_webp, png_bytes, write_png};
use image::Rgba;
use image::RgbaImage;
use photomark::config::Config;
use photomark::{Upload, WatermarkService};
use tempfile::TempDir;

#[tokio::test]
async fn test_service_from_config_file() {
    let dir = TempDir::new().unwrap();
    let logo = write_png(
        dir.path(),
        "logo.png",
        RgbaImage::from_pixel(64, 32, Rgba([255, 0, 0, 255])),
    );

    let yaml = format!(
        r#"
pipeline:
  max_dimension: 400
text:
  use_system_fonts: false
logo:
  path: {}
  max_fraction: 0.25
output:
  format: webp
  quality: 70
workers:
  threads: 2
  timeout_ms: 60000
"#,
        logo.display()
    );
    let config_path = dir.path().join("photomark.yaml");
    std::fs::write(&config_path, yaml).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.pipeline.max_dimension, 400);

    let service = WatermarkService::new(&config).unwrap();
    assert_eq!(service.threads(), 2);

    let upload = Upload::new(png_bytes(gradient_canvas(800, 600)), "Jane Doe", "Paris")
        .with_filename("holiday.png");
    let image = service.process(upload).await.unwrap();

    assert_eq!((image.width, image.height), (400, 300));
    assert_eq!(image.filename, "marked_holiday.webp");
    assert!(is_webp(&image.data));
    assert!(service.pipeline().logo_store().is_cached(&logo));
}

#[test]
fn test_env_placeholders_in_config_file() {
    std::env::set_var("PHOTOMARK_IT_MAX_DIMENSION", "1234");
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("photomark.yaml");
    std::fs::write(
        &config_path,
        "pipeline:\n  max_dimension: ${PHOTOMARK_IT_MAX_DIMENSION}\n",
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.pipeline.max_dimension, 1234);
}

#[test]
fn test_invalid_config_file_fails_validation() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("photomark.yaml");
    std::fs::write(&config_path, "plate:\n  max_alpha: 250\n").unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.contains("plate.max_alpha"));
}
