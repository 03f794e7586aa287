//! Aspect-correct placement of a resliced view inside its display box.
//!
//! Reconstructed planes mix in-plane spacing with slice thickness, so the
//! view is letterboxed to its physical extent. Axial views are shown as is.

use crate::descriptor::Spacing;
use crate::enums::Plane;
use crate::volume::VolumeShape;

/// Physical width and height of a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeExtent {
    pub volume_width: f64,
    pub volume_height: f64,
}

impl VolumeExtent {
    /// Degenerate 1:1 extent used while spacing or data is missing.
    pub const UNIT: VolumeExtent = VolumeExtent {
        volume_width: 1.0,
        volume_height: 1.0,
    };

    pub fn aspect_ratio(&self) -> f64 {
        self.volume_width / self.volume_height
    }
}

/// Device-pixel size of the box the view is placed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBox {
    pub width: f64,
    pub height: f64,
}

impl CanvasBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Size and offset of the view in device pixels, floored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub top: u32,
    pub left: u32,
}

impl Geometry {
    fn floored(width: f64, height: f64, top: f64, left: f64) -> Self {
        Self {
            width: width.floor() as u32,
            height: height.floor() as u32,
            top: top.floor() as u32,
            left: left.floor() as u32,
        }
    }
}

pub struct LayoutFitter;

impl LayoutFitter {
    /// Physical extent of `plane`: spacing times slice counts.
    ///
    /// * Coronal: `(spacing.y * rows, spacing.z * slices)`
    /// * Sagittal: `(spacing.x * columns, spacing.z * slices)`
    /// * Axial: `(spacing.x * columns, spacing.y * rows)`
    ///
    /// Falls back to [`VolumeExtent::UNIT`] when spacing is absent or has no
    /// slice thickness, or when no data is resident.
    pub fn volume_extent(
        spacing: Option<&Spacing>,
        plane: Plane,
        shape: Option<VolumeShape>,
    ) -> VolumeExtent {
        let (Some(spacing), Some(shape)) = (spacing.filter(|s| s.is_usable()), shape) else {
            return VolumeExtent::UNIT;
        };

        let rows = shape.rows as f64;
        let columns = shape.columns as f64;
        let slices = shape.slices as f64;

        let (volume_width, volume_height) = match plane {
            Plane::Coronal => (spacing.y * rows, spacing.z * slices),
            Plane::Sagittal => (spacing.x * columns, spacing.z * slices),
            Plane::Axial => (spacing.x * columns, spacing.y * rows),
        };
        VolumeExtent {
            volume_width,
            volume_height,
        }
    }

    /// Fit `extent` into `canvas` for `plane`.
    ///
    /// Axial views fill the box unchanged. Reconstructed views are
    /// constrained by height when the box is relatively wider than the
    /// extent (centred horizontally), otherwise by width (centred
    /// vertically).
    pub fn fit(canvas: CanvasBox, extent: VolumeExtent, plane: Plane) -> Geometry {
        if !plane.is_reconstructed() {
            return Geometry::floored(canvas.width, canvas.height, 0.0, 0.0);
        }

        let canvas_ratio = canvas.width / canvas.height;
        let spacing_ratio = extent.aspect_ratio();

        if canvas_ratio > spacing_ratio {
            let width = canvas.height * spacing_ratio;
            Geometry::floored(width, canvas.height, 0.0, (canvas.width - width) / 2.0)
        } else {
            let height = canvas.width / spacing_ratio;
            Geometry::floored(canvas.width, height, (canvas.height - height) / 2.0, 0.0)
        }
    }
}
