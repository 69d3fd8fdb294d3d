// Logo loading, caching and placement against real files

use super::test_harness::{gradient_canvas, hermetic_config, webp_pipeline, write_png};
use image::{Rgba, RgbaImage};
use photomark::watermark::{logo, ImageDimensions, LogoStore};
use rstest::rstest;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_logo_is_scaled_into_bottom_left() {
    let dir = TempDir::new().unwrap();
    let path = write_png(
        dir.path(),
        "logo.png",
        RgbaImage::from_pixel(400, 200, Rgba([0, 0, 255, 255])),
    );

    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);
    let marked = pipeline
        .compose(gradient_canvas(1000, 800), "Jane Doe", "Paris", Some(&path))
        .unwrap();

    // 15% of 1000 = 150 wide, so the logo shrinks to 150x75
    let is_logo = |x: u32, y: u32| {
        let Rgba([r, g, b, _]) = *marked.get_pixel(x, y);
        r < 16 && g < 16 && b > 240
    };
    assert!(is_logo(0, 799));
    assert!(is_logo(140, 730));
    assert!(!is_logo(160, 799));
    assert!(!is_logo(10, 700));
}

#[test]
fn test_pipeline_reuses_cached_logo() {
    let dir = TempDir::new().unwrap();
    let path = write_png(
        dir.path(),
        "logo.png",
        RgbaImage::from_pixel(40, 40, Rgba([0, 0, 255, 255])),
    );

    let config = hermetic_config();
    let pipeline = webp_pipeline(&config);

    let first = pipeline
        .compose(gradient_canvas(600, 400), "Jane", "Rome", Some(&path))
        .unwrap();
    assert!(pipeline.logo_store().is_cached(&path));

    // Later runs never touch the file again
    std::fs::remove_file(&path).unwrap();
    let second = pipeline
        .compose(gradient_canvas(600, 400), "Jane", "Rome", Some(&path))
        .unwrap();

    assert_eq!(first.as_raw(), second.as_raw());
}

#[test]
fn test_store_ttl_expires_entries() {
    let dir = TempDir::new().unwrap();
    let path = write_png(
        dir.path(),
        "logo.png",
        RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 255])),
    );

    let store = LogoStore::new(Duration::from_millis(50), 4);
    assert!(store.load(&path).is_some());
    assert!(store.is_cached(&path));

    std::thread::sleep(Duration::from_millis(150));
    assert!(!store.is_cached(&path));
}

#[rstest]
#[case(4000, 3000, 800, 400)]
#[case(500, 500, 1000, 100)]
#[case(100, 2000, 64, 64)]
#[case(30, 30, 7, 9)]
fn test_placement_fits_inside_fraction_box(
    #[case] cw: u32,
    #[case] ch: u32,
    #[case] lw: u32,
    #[case] lh: u32,
) {
    let canvas = ImageDimensions::new(cw, ch);
    let Some(placed) = logo::placement(canvas, ImageDimensions::new(lw, lh), 0.15, None) else {
        return;
    };

    assert!(placed.scale <= 1.0);
    assert!(placed.rect.width <= (cw as f64 * 0.15) as u32);
    assert!(placed.rect.height <= (ch as f64 * 0.15) as u32);
    assert_eq!(placed.rect.x, 0);
    assert_eq!(placed.rect.bottom(), ch);
}
