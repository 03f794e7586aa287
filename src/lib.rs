//! # MPR-volume library
//!
//! This crate turns a stack of pre-rendered axial slice images into an
//! orthogonal volume that can be inspected along all three medical axes:
//!  - Axial
//!  - Coronal
//!  - Sagittal
//!
//! Slice images are plain 8-bit RGBA rasters carrying one signed 16-bit
//! intensity per pixel: `sample + 32768` is split over the red (high byte)
//! and green (low byte) channels. The pipeline is:
//!
//!  1. [`decoder`] recovers the intensity grid of each slice image,
//!  2. [`volume`] stores the slices by index, always enumerated in ascending
//!     order regardless of arrival order,
//!  3. [`reslice`] cuts the volume along a plane through a cursor point,
//!  4. [`window`] maps intensities through a level/width window into an
//!     opaque grayscale RGBA buffer,
//!  5. [`layout`] places the view inside its display box, preserving the
//!     physical aspect ratio given by the voxel spacing.
//!
//! [`session::Viewer`] ties these together with the interaction state and
//! [`volume_loader`] fetches all slices concurrently.
//!
//! # Examples
//!
//! ## Rendering the coronal view of a stack on disk
//!
//! ```no_run
//! # use mpr_volume::{enums::Plane, layout::CanvasBox, session::Viewer};
//! # use mpr_volume::volume_loader::{DirectorySource, VolumeLoader};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = VolumeLoader::load_descriptor("scan/volume.json").await?;
//! let mut viewer = Viewer::new();
//! viewer.load(descriptor);
//! VolumeLoader::load_slices(&DirectorySource::new("scan"), &mut viewer).await?;
//!
//! viewer.set_plane(Plane::Coronal)?;
//! if let Some(frame) = viewer.render(CanvasBox::new(400.0, 400.0))? {
//!     if let Some(image) = frame.buffer.into_image() {
//!         image.save("coronal.png")?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decoder;
pub mod descriptor;
pub mod enums;
pub mod error;
pub mod layout;
pub mod reslice;
pub mod session;
pub mod volume;
pub mod volume_loader;
pub mod window;

pub use decoder::{ImageDecoder, RenderSurface};
pub use descriptor::{Point, Spacing, VolumeDescriptor};
pub use enums::Plane;
pub use error::VolumeError;
pub use layout::{CanvasBox, Geometry, LayoutFitter, VolumeExtent};
pub use reslice::{Grid, Reslicer};
pub use session::{Frame, SliceOutcome, Viewer, ViewerStatus};
pub use volume::{Slice, VolumeShape, VolumeStore};
pub use volume_loader::{
    DirectorySource, LoadReport, SliceCompletion, SliceSource, VolumeLoader, VolumeLoaderError,
};
pub use window::{PixelBuffer, WindowTransform, Windowing};
