//! Viewer session state.
//!
//! A [`Viewer`] owns the volume being inspected together with the
//! interaction state around it (cursor, plane, window). Slice completions
//! are applied through it; every loaded descriptor opens a new generation
//! with fresh storage, and completions addressed to an older generation are
//! dropped.

use image::RgbaImage;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::decoder::{ImageDecoder, RenderSurface};
use crate::descriptor::{Point, VolumeDescriptor};
use crate::enums::Plane;
use crate::error::VolumeError;
use crate::layout::{CanvasBox, Geometry, LayoutFitter};
use crate::reslice::Reslicer;
use crate::volume::{Slice, VolumeStore};
use crate::window::{PixelBuffer, WindowTransform, Windowing};

/// Edge length of the display box before a volume is loaded.
pub const DEFAULT_IMAGE_SIZE: u32 = 400;

/// What happened to a slice completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    Stored,
    /// Addressed to a superseded volume.
    Stale,
    /// No render surface to decode onto; the slice stays absent.
    Unavailable,
}

/// What the display should show for the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerStatus {
    /// No volume descriptor yet.
    Empty,
    /// Slice `index` of `size_z` has not arrived.
    Loading { index: usize, size_z: usize },
    Ready,
}

/// One rendered view.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub plane: Plane,
    pub buffer: PixelBuffer,
    pub geometry: Geometry,
}

struct LoadedVolume {
    descriptor: VolumeDescriptor,
    store: VolumeStore,
    started: Instant,
}

pub struct Viewer {
    volume: Option<LoadedVolume>,
    generation: u64,
    surface: Option<RenderSurface>,
    point: Point,
    plane: Plane,
    windowing: Windowing,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewer {
    pub fn new() -> Self {
        Self::with_surface(Some(RenderSurface::new(DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE)))
    }

    /// Viewer decoding onto `surface`; `None` leaves every slice unavailable.
    pub fn with_surface(surface: Option<RenderSurface>) -> Self {
        Self {
            volume: None,
            generation: 0,
            surface,
            point: Point::default(),
            plane: Plane::Axial,
            windowing: Windowing::INITIAL,
        }
    }

    /// Start a new volume and return its generation.
    ///
    /// Storage of the previous volume is dropped, the plane falls back to
    /// axial, the cursor is clamped into the new bounds and the descriptor's
    /// window (if any) is applied.
    pub fn load(&mut self, descriptor: VolumeDescriptor) -> u64 {
        self.generation += 1;
        self.point = descriptor.clamp(self.point);
        self.plane = Plane::Axial;
        if let Some(windowing) = descriptor.windowing {
            self.windowing = windowing;
        }

        info!(
            generation = self.generation,
            size_x = descriptor.size_x,
            size_y = descriptor.size_y,
            size_z = descriptor.size_z,
            image_path = %descriptor.image_path,
            "loading volume"
        );

        self.volume = Some(LoadedVolume {
            store: VolumeStore::for_descriptor(&descriptor),
            descriptor,
            started: Instant::now(),
        });
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn descriptor(&self) -> Option<&VolumeDescriptor> {
        self.volume.as_ref().map(|volume| &volume.descriptor)
    }

    pub fn volume(&self) -> Option<&VolumeStore> {
        self.volume.as_ref().map(|volume| &volume.store)
    }

    /// Decode a slice image for `generation` and store it at `index`.
    ///
    /// # Errors
    ///
    /// [`VolumeError::DimensionOverflow`] when the descriptor's slice size
    /// does not fit an image, otherwise [`VolumeStore::put`] rejections.
    pub fn accept_image(
        &mut self,
        generation: u64,
        index: usize,
        image: &RgbaImage,
    ) -> Result<SliceOutcome, VolumeError> {
        let Some(descriptor) = self.live_descriptor(generation, index) else {
            return Ok(SliceOutcome::Stale);
        };
        let (width, height) = (pixel_dim(descriptor.size_x)?, pixel_dim(descriptor.size_y)?);

        match ImageDecoder::decode(self.surface.as_mut(), image, width, height, false) {
            Some(slice) => self.accept(generation, index, slice),
            None => {
                debug!(index, "no render surface, slice left unavailable");
                Ok(SliceOutcome::Unavailable)
            }
        }
    }

    /// Store an already decoded slice for `generation`.
    ///
    /// # Errors
    ///
    /// Propagates [`VolumeStore::put`] rejections.
    pub fn accept(
        &mut self,
        generation: u64,
        index: usize,
        slice: Slice,
    ) -> Result<SliceOutcome, VolumeError> {
        if self.live_descriptor(generation, index).is_none() {
            return Ok(SliceOutcome::Stale);
        }
        let Some(volume) = self.volume.as_mut() else {
            return Ok(SliceOutcome::Stale);
        };

        volume.store.put(index, slice)?;
        let size_z = volume.descriptor.size_z;
        if volume.store.is_complete(size_z) {
            info!(
                size_z,
                elapsed_ms = volume.started.elapsed().as_millis() as u64,
                "volume complete"
            );
        }
        Ok(SliceOutcome::Stored)
    }

    fn live_descriptor(&self, generation: u64, index: usize) -> Option<&VolumeDescriptor> {
        if generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                index,
                "dropping slice of a superseded volume"
            );
            return None;
        }
        self.descriptor()
    }

    pub fn is_complete(&self) -> bool {
        self.volume
            .as_ref()
            .is_some_and(|volume| volume.store.is_complete(volume.descriptor.size_z))
    }

    /// Coronal and sagittal views are only offered once every slice is in.
    pub fn mpr_enabled(&self) -> bool {
        self.is_complete()
    }

    pub fn point(&self) -> Point {
        self.point
    }

    /// Move the cursor, clamped into the volume. Returns the applied point.
    pub fn set_point(&mut self, point: Point) -> Point {
        self.point = match self.descriptor() {
            Some(descriptor) => descriptor.clamp(point),
            None => point,
        };
        self.point
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    /// # Errors
    ///
    /// [`VolumeError::IncompleteVolume`] when a reconstructed plane is asked
    /// for before every slice is loaded.
    pub fn set_plane(&mut self, plane: Plane) -> Result<(), VolumeError> {
        if plane.is_reconstructed() && !self.is_complete() {
            let index = self
                .volume()
                .and_then(VolumeStore::first_missing)
                .unwrap_or_default();
            return Err(VolumeError::IncompleteVolume { index });
        }
        self.plane = plane;
        Ok(())
    }

    pub fn windowing(&self) -> Windowing {
        self.windowing
    }

    /// # Errors
    ///
    /// [`VolumeError::InvalidWindowWidth`] for `width <= 0`; the current
    /// window is kept.
    pub fn set_windowing(&mut self, level: f64, width: f64) -> Result<(), VolumeError> {
        self.windowing = Windowing::new(level, width)?;
        Ok(())
    }

    pub fn status(&self) -> ViewerStatus {
        let Some(volume) = self.volume.as_ref() else {
            return ViewerStatus::Empty;
        };
        let size_z = volume.descriptor.size_z;

        let missing = match self.plane {
            Plane::Axial => (!volume.store.contains(self.point.z)).then_some(self.point.z),
            Plane::Coronal | Plane::Sagittal => volume.store.first_missing(),
        };
        match missing {
            Some(index) => ViewerStatus::Loading { index, size_z },
            None => ViewerStatus::Ready,
        }
    }

    /// Render the current view, placed inside `canvas`.
    ///
    /// Returns `Ok(None)` while the view is not ready. The pixel buffer has
    /// the size of the resliced grid.
    ///
    /// # Errors
    ///
    /// Propagates [`WindowTransform::apply`] failures and
    /// [`VolumeError::DimensionOverflow`]; the caller skips the frame.
    pub fn render(&self, canvas: CanvasBox) -> Result<Option<Frame>, VolumeError> {
        if self.status() != ViewerStatus::Ready {
            return Ok(None);
        }
        let Some(volume) = self.volume.as_ref() else {
            return Ok(None);
        };
        let descriptor = &volume.descriptor;

        let grid = Reslicer::reslice(self.plane, &self.point, &volume.store, descriptor.size_y);
        let (rows, columns) = grid.dim();
        let buffer = WindowTransform::apply(
            grid.view(),
            &self.windowing,
            pixel_dim(columns)?,
            pixel_dim(rows)?,
        )?;

        let extent = LayoutFitter::volume_extent(
            descriptor.spacing.as_ref(),
            self.plane,
            volume.store.shape(),
        );
        let geometry = LayoutFitter::fit(canvas, extent, self.plane);

        Ok(Some(Frame {
            plane: self.plane,
            buffer,
            geometry,
        }))
    }
}

fn pixel_dim(size: usize) -> Result<u32, VolumeError> {
    u32::try_from(size).map_err(|_| VolumeError::DimensionOverflow(size))
}
