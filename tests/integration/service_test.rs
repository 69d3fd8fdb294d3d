// Concurrent uploads through the worker pool

use super::test_harness::{gradient_canvas, hermetic_config, is_webp, png_bytes, webp_pipeline};
use photomark::codec::{CodecError, DecodeLimits};
use photomark::config::WorkerConfig;
use photomark::{FailureCause, Upload, WatermarkService};

fn service(threads: usize, limits: DecodeLimits) -> WatermarkService {
    let config = hermetic_config();
    WatermarkService::with_pipeline(
        webp_pipeline(&config),
        &WorkerConfig {
            threads,
            timeout_ms: None,
        },
        limits,
    )
    .unwrap()
}

#[tokio::test]
async fn test_concurrent_uploads_are_independent() {
    let service = service(4, DecodeLimits::default());

    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            let service = service.clone();
            let bytes = png_bytes(gradient_canvas(200 + i * 10, 150));
            tokio::spawn(async move {
                service
                    .process(Upload::new(bytes, format!("Author {}", i), "Lisbon"))
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let image = handle.await.unwrap().unwrap();
        assert_eq!(image.width, 200 + i as u32 * 10);
        assert_eq!(image.height, 150);
        assert!(is_webp(&image.data));
    }
}

#[tokio::test]
async fn test_oversized_upload_is_refused() {
    let service = service(
        1,
        DecodeLimits {
            max_input_bytes: 64,
            ..DecodeLimits::default()
        },
    );

    let err = service
        .process(Upload::new(png_bytes(gradient_canvas(64, 64)), "Jane", "Paris"))
        .await
        .unwrap_err();

    assert!(matches!(
        err.cause,
        FailureCause::Decode(CodecError::InputTooLarge { .. })
    ));
}

#[tokio::test]
async fn test_too_many_pixels_is_refused() {
    let service = service(
        1,
        DecodeLimits {
            max_source_pixels: 1000,
            ..DecodeLimits::default()
        },
    );

    let err = service
        .process(Upload::new(png_bytes(gradient_canvas(100, 100)), "Jane", "Paris"))
        .await
        .unwrap_err();

    assert!(matches!(
        err.cause,
        FailureCause::Decode(CodecError::ImageTooLarge { .. })
    ));
}
