//! Windowed rendering tests.
//!
//! Tests verify:
//! - Windowed pixels of each plane after a concurrent load
//! - Placement of reconstructed views from the voxel spacing
//! - Frames are skipped when the grid does not fit the pixel buffer

use mpr_volume::volume_loader::VolumeLoader;
use mpr_volume::window::shade_to_byte;
use mpr_volume::{
    CanvasBox, Geometry, Plane, Point, Spacing, VolumeDescriptor, VolumeError, Viewer,
    WindowTransform, Windowing,
};

use super::test_utils::{sample, MockSliceSource};

const SIZE_X: usize = 64;
const SIZE_Y: usize = 32;
const SIZE_Z: usize = 8;

/// Thick slices: 0.5mm in plane, 4mm between slices.
fn descriptor() -> VolumeDescriptor {
    VolumeDescriptor::new(SIZE_X, SIZE_Y, SIZE_Z, "ct/7")
        .with_spacing(Spacing::new(0.5, 0.5, 4.0))
}

async fn loaded_viewer() -> Viewer {
    let descriptor = descriptor();
    let source = MockSliceSource::for_volume(&descriptor);
    let mut viewer = Viewer::new();
    viewer.load(descriptor);
    let report = VolumeLoader::load_slices(&source, &mut viewer).await.unwrap();
    assert_eq!(report.stored, SIZE_Z);
    viewer
}

fn gray(windowing: &Windowing, value: i16) -> [u8; 4] {
    let shade = windowing.shade(value).map(shade_to_byte).unwrap_or(0);
    [shade, shade, shade, 255]
}

// =============================================================================
// Planes
// =============================================================================

#[tokio::test]
async fn test_render_axial_fills_canvas() {
    let mut viewer = loaded_viewer().await;
    viewer.set_point(Point::new(0, 0, 2));
    viewer.set_windowing(-3000.0, 200.0).unwrap();
    let windowing = viewer.windowing();

    let frame = viewer.render(CanvasBox::new(300.0, 200.0)).unwrap().unwrap();

    assert_eq!(frame.plane, Plane::Axial);
    assert_eq!(
        (frame.buffer.width(), frame.buffer.height()),
        (SIZE_X as u32, SIZE_Y as u32)
    );
    assert_eq!(
        frame.geometry,
        Geometry {
            width: 300,
            height: 200,
            top: 0,
            left: 0
        }
    );
    for (x, y) in [(0, 0), (10, 5), (63, 31)] {
        assert_eq!(
            frame.buffer.pixel(x, y),
            Some(gray(&windowing, sample(2, y as usize, x as usize)))
        );
    }
}

#[tokio::test]
async fn test_render_coronal_puts_deepest_slice_on_top() {
    let mut viewer = loaded_viewer().await;
    viewer.set_point(Point::new(0, 20, 0));
    // Window wide enough to separate every slice.
    viewer.set_windowing(-1000.0, 8000.0).unwrap();
    viewer.set_plane(Plane::Coronal).unwrap();
    let windowing = viewer.windowing();

    let frame = viewer.render(CanvasBox::new(400.0, 400.0)).unwrap().unwrap();

    assert_eq!(
        (frame.buffer.width(), frame.buffer.height()),
        (SIZE_X as u32, SIZE_Z as u32)
    );
    let row = SIZE_Y - 1 - 20;
    for i in 0..SIZE_Z as u32 {
        let z = SIZE_Z - 1 - i as usize;
        assert_eq!(frame.buffer.pixel(5, i), Some(gray(&windowing, sample(z, row, 5))));
    }

    // Extent (0.5 * 32) x (4 * 8) = 16 x 32: constrained by height.
    assert_eq!(
        frame.geometry,
        Geometry {
            width: 200,
            height: 400,
            top: 0,
            left: 100
        }
    );
}

#[tokio::test]
async fn test_render_sagittal_geometry() {
    let mut viewer = loaded_viewer().await;
    viewer.set_point(Point::new(40, 0, 0));
    viewer.set_plane(Plane::Sagittal).unwrap();

    let frame = viewer.render(CanvasBox::new(400.0, 400.0)).unwrap().unwrap();

    assert_eq!(
        (frame.buffer.width(), frame.buffer.height()),
        (SIZE_Y as u32, SIZE_Z as u32)
    );
    // Extent (0.5 * 64) x (4 * 8) = 32 x 32: fills the square box.
    assert_eq!(
        frame.geometry,
        Geometry {
            width: 400,
            height: 400,
            top: 0,
            left: 0
        }
    );
}

#[tokio::test]
async fn test_initial_window_is_a_hard_threshold() {
    let mut viewer = loaded_viewer().await;
    assert_eq!(viewer.windowing(), Windowing::INITIAL);
    let canvas = CanvasBox::new(400.0, 400.0);

    // Slice 0 lies entirely below -1000.5.
    viewer.set_point(Point::new(0, 0, 0));
    let frame = viewer.render(canvas).unwrap().unwrap();
    let bytes = frame.buffer.as_bytes();
    assert!(bytes.chunks_exact(4).all(|pixel| pixel == [0, 0, 0, 255]));

    // Slice 5 lies entirely above it and saturates.
    viewer.set_point(Point::new(0, 0, 5));
    let frame = viewer.render(canvas).unwrap().unwrap();
    let bytes = frame.buffer.as_bytes();
    assert!(bytes.chunks_exact(4).all(|pixel| pixel == [255, 255, 255, 255]));
}

#[tokio::test]
async fn test_descriptor_without_spacing_uses_unit_extent() {
    let descriptor = VolumeDescriptor::new(8, 4, 2, "ct/8");
    let source = MockSliceSource::for_volume(&descriptor);
    let mut viewer = Viewer::new();
    viewer.load(descriptor);
    VolumeLoader::load_slices(&source, &mut viewer).await.unwrap();
    viewer.set_plane(Plane::Coronal).unwrap();

    let frame = viewer.render(CanvasBox::new(600.0, 300.0)).unwrap().unwrap();

    assert_eq!(
        frame.geometry,
        Geometry {
            width: 300,
            height: 300,
            top: 0,
            left: 150
        }
    );
}

// =============================================================================
// Buffer Size
// =============================================================================

#[test]
fn test_oversized_grid_is_rejected() {
    let grid = super::test_utils::expected_slice(0, SIZE_Y, SIZE_X);

    let result = WindowTransform::apply(grid.view(), &Windowing::INITIAL, SIZE_X as u32, 8);

    assert_eq!(
        result,
        Err(VolumeError::BufferOverrun {
            samples: SIZE_X * SIZE_Y,
            capacity: SIZE_X * 8
        })
    );
}
