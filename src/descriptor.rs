//! Volume descriptor and cursor types.
//!
//! A descriptor is delivered once per volume and fixes the per-slice
//! dimensions, the number of slices and the physical voxel spacing. It is
//! immutable afterwards; a new volume means a new descriptor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::window::Windowing;

/// Physical distance between neighbouring voxels along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Spacing {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Spacing is only usable for layout when the slice thickness is known.
    pub fn is_usable(&self) -> bool {
        self.z.is_finite() && self.z != 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    #[serde(default)]
    pub spacing: Option<Spacing>,
    pub image_path: String,
    /// Initial window shipped with the volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windowing: Option<Windowing>,
}

impl VolumeDescriptor {
    pub fn new(size_x: usize, size_y: usize, size_z: usize, image_path: impl Into<String>) -> Self {
        Self {
            size_x,
            size_y,
            size_z,
            spacing: None,
            image_path: image_path.into(),
            windowing: None,
        }
    }

    pub fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = Some(spacing);
        self
    }

    pub fn with_windowing(mut self, windowing: Windowing) -> Self {
        self.windowing = Some(windowing);
        self
    }

    /// Number of samples in one axial slice.
    pub fn slice_len(&self) -> usize {
        self.size_x * self.size_y
    }

    /// Location of slice `index` relative to the image root,
    /// `<image_path>/<index>.png`.
    pub fn slice_path(&self, index: usize) -> PathBuf {
        PathBuf::from(&self.image_path).join(format!("{index}.png"))
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x < self.size_x && point.y < self.size_y && point.z < self.size_z
    }

    /// Clamp `point` into `[0,size_x) x [0,size_y) x [0,size_z)`.
    ///
    /// A descriptor with an empty axis clamps that coordinate to zero.
    pub fn clamp(&self, point: Point) -> Point {
        Point {
            x: point.x.min(self.size_x.saturating_sub(1)),
            y: point.y.min(self.size_y.saturating_sub(1)),
            z: point.z.min(self.size_z.saturating_sub(1)),
        }
    }

    /// Centre of the volume, used as the initial cursor.
    pub fn center(&self) -> Point {
        Point::new(self.size_x / 2, self.size_y / 2, self.size_z / 2)
    }
}

/// Integer cursor inside the volume.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Point {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}
