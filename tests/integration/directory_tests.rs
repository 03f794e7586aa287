//! Loading from slice files on disk.
//!
//! Tests verify:
//! - Descriptor files in both the bare and the wrapped layout
//! - Slice files are resolved as `<root>/<image_path>/<index>.png`
//! - Missing files are reported and the rest of the volume still loads

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use web_time::{SystemTime, UNIX_EPOCH};

use mpr_volume::volume_loader::{DirectorySource, VolumeLoader};
use mpr_volume::{Plane, Point, Reslicer, VolumeDescriptor, Viewer};

use super::test_utils::{encode_png, expected_slice};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory removed on drop.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        let path = std::env::temp_dir().join(format!(
            "mpr-volume-{}-{}-{}",
            std::process::id(),
            nanos,
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        // Fails rather than reusing a directory left by an earlier run.
        fs::create_dir(&path).unwrap();
        Self(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }

    /// Write every slice of `descriptor` except `skip`.
    fn write_slices(&self, descriptor: &VolumeDescriptor, skip: &[usize]) {
        fs::create_dir_all(self.0.join(&descriptor.image_path)).unwrap();
        for z in (0..descriptor.size_z).filter(|z| !skip.contains(z)) {
            let slice = expected_slice(z, descriptor.size_y, descriptor.size_x);
            fs::write(self.0.join(descriptor.slice_path(z)), encode_png(&slice)).unwrap();
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[test]
fn test_scratch_dirs_are_distinct() {
    let first = ScratchDir::new();
    let second = ScratchDir::new();
    assert_ne!(first.path(), second.path());
    assert!(first.path().is_dir() && second.path().is_dir());

    let removed = first.path().to_path_buf();
    drop(first);
    assert!(!removed.exists());
}

#[tokio::test]
async fn test_load_bare_descriptor_and_slices() {
    let dir = ScratchDir::new();
    let descriptor_path = dir.path().join("volume.json");
    fs::write(
        &descriptor_path,
        r#"{"size_x": 6, "size_y": 5, "size_z": 4, "image_path": "series/1",
            "spacing": {"x": 0.8, "y": 0.8, "z": 2.0}}"#,
    )
    .unwrap();

    let descriptor = VolumeLoader::load_descriptor(&descriptor_path).await.unwrap();
    assert_eq!((descriptor.size_x, descriptor.size_y, descriptor.size_z), (6, 5, 4));
    assert_eq!(descriptor.slice_path(3), PathBuf::from("series/1/3.png"));
    dir.write_slices(&descriptor, &[]);

    let mut viewer = Viewer::new();
    viewer.load(descriptor);
    let report = VolumeLoader::load_slices(&DirectorySource::new(dir.path()), &mut viewer)
        .await
        .unwrap();

    assert_eq!(report.stored, 4);
    assert!(viewer.is_complete());
    let store = viewer.volume().unwrap();
    assert_eq!(
        Reslicer::reslice(Plane::Axial, &Point::new(0, 0, 2), store, 5),
        expected_slice(2, 5, 6)
    );
}

#[tokio::test]
async fn test_load_wrapped_descriptor() {
    let dir = ScratchDir::new();
    let descriptor_path = dir.path().join("volume.json");
    fs::write(
        &descriptor_path,
        r#"{"data": {"size_x": 3, "size_y": 3, "size_z": 2, "image_path": "s",
            "windowing": {"level": 40, "width": 400}}}"#,
    )
    .unwrap();

    let descriptor = VolumeLoader::load_descriptor(&descriptor_path).await.unwrap();
    assert!(descriptor.spacing.is_none());

    let mut viewer = Viewer::new();
    viewer.load(descriptor);
    assert_eq!(viewer.windowing().level(), 40.0);
    assert_eq!(viewer.windowing().width(), 400.0);
}

#[tokio::test]
async fn test_missing_descriptor_file_fails() {
    let dir = ScratchDir::new();
    assert!(
        VolumeLoader::load_descriptor(dir.path().join("absent.json"))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_missing_slice_file_is_reported() {
    let dir = ScratchDir::new();
    let descriptor = VolumeDescriptor::new(4, 4, 5, "series/2");
    dir.write_slices(&descriptor, &[0, 3]);

    let mut viewer = Viewer::new();
    viewer.load(descriptor);
    let report = VolumeLoader::load_slices(&DirectorySource::new(dir.path()), &mut viewer)
        .await
        .unwrap();

    assert_eq!(report.stored, 3);
    assert_eq!(report.failed, vec![0, 3]);
    assert_eq!(viewer.volume().unwrap().first_missing(), Some(0));
    assert!(viewer.set_plane(Plane::Sagittal).is_err());
}
