//! End-to-end checks through the public `GalleryService` API.

use image::{ImageFormat, RgbImage};
use photo_segment::config::{ServiceConfig, resolve_config};
use photo_segment::scan::{FolderEntry, GalleryScanner};
use photo_segment::service::{GalleryService, SegmentInput, ServiceError};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn service_for(root: &Path) -> GalleryService {
    let mut config = ServiceConfig::default();
    config.scan.root = Some(root.to_string_lossy().into_owned());
    GalleryService::new(&config)
}

fn solid_red_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([255, 0, 0]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

// =========================================================================
// Discovery
// =========================================================================

#[test]
fn skipped_and_imageless_folders_are_absent() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "Pictures/a.jpg", b"x");
    write(tmp.path(), "Pictures/sub/AppData/b.png", b"x");
    write(tmp.path(), "Documents/c.txt", b"x");

    let service = service_for(tmp.path());
    let snapshot = service.list_galleries(false);
    assert_eq!(
        snapshot.folders,
        vec![FolderEntry {
            path: "Pictures".into(),
            images: vec!["a.jpg".into()],
        }]
    );
}

#[test]
fn nested_galleries_reported_with_forward_slashes() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "Travel/Japan/tokyo.JPG", b"x");
    write(tmp.path(), "Travel/Italy/rome.webp", b"x");
    write(tmp.path(), "node_modules/pkg/logo.png", b"x");
    write(tmp.path(), ".hidden/secret.png", b"x");

    let service = service_for(tmp.path());
    let paths: Vec<String> = service
        .list_galleries(false)
        .folders
        .iter()
        .map(|f| f.path.clone())
        .collect();
    assert_eq!(paths, vec!["Travel/Italy", "Travel/Japan"]);
}

#[test]
fn scanner_from_stock_config_respects_depth() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a/shallow.png", b"x");
    write(tmp.path(), "x/b/c/d/e/f/g/h/at_limit.png", b"x");
    write(tmp.path(), "y/b/c/d/e/f/g/h/i/too_deep.png", b"x");

    let mut config = resolve_config(None).unwrap();
    config.scan.root = Some(tmp.path().to_string_lossy().into_owned());
    let folders = GalleryScanner::from_config(&config.scan).scan();
    let paths: Vec<&str> = folders.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a", "x/b/c/d/e/f/g/h"]);
}

// =========================================================================
// Segmentation
// =========================================================================

#[test]
fn solid_red_upload_round_trips_through_cache() {
    let tmp = TempDir::new().unwrap();
    let service = service_for(tmp.path());

    let id = service
        .segment_image(SegmentInput::Upload(&solid_red_png(10, 10)), 3, 512)
        .unwrap();
    let bytes = service.fetch_segment(id.as_str()).unwrap();

    let img = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (10, 10));
    assert!(img.pixels().all(|p| p.0 == [255, 0, 0]));
}

#[test]
fn gallery_image_segmented_in_place() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "Pictures/red.png", &solid_red_png(6, 4));
    let service = service_for(tmp.path());

    let id = service
        .segment_image(SegmentInput::Gallery("Pictures\\red.png"), 4, 0)
        .unwrap();
    assert!(service.fetch_segment(id.as_str()).is_ok());
}

#[test]
fn unknown_segment_id_not_found() {
    let tmp = TempDir::new().unwrap();
    let service = service_for(tmp.path());
    assert!(matches!(
        service.fetch_segment("0000000000000000"),
        Err(ServiceError::NotFound(_))
    ));
}

// =========================================================================
// Access control
// =========================================================================

#[test]
fn parent_escape_denied() {
    let tmp = TempDir::new().unwrap();
    let service = service_for(tmp.path());
    assert!(matches!(
        service.resolve_and_guard("../../etc/passwd"),
        Err(ServiceError::AccessDenied(_))
    ));
    assert!(matches!(
        service.resolve_image("..\\..\\etc\\passwd"),
        Err(ServiceError::AccessDenied(_))
    ));
}

#[cfg(unix)]
#[test]
fn symlink_out_of_root_denied() {
    let outside = TempDir::new().unwrap();
    write(outside.path(), "secret.png", &solid_red_png(2, 2));
    let tmp = TempDir::new().unwrap();
    std::os::unix::fs::symlink(outside.path(), tmp.path().join("link")).unwrap();

    let service = service_for(tmp.path());
    assert!(matches!(
        service.resolve_image("link/secret.png"),
        Err(ServiceError::AccessDenied(_))
    ));
    assert!(service.list_galleries(true).folders.is_empty());
}
