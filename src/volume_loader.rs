use crate::{
    descriptor::VolumeDescriptor,
    error::VolumeError,
    session::{SliceOutcome, Viewer},
};

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use image::RgbaImage;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No volume descriptor loaded")]
    NoDescriptor,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Descriptor error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Volume error: {0}")]
    Volume(#[from] VolumeError),
}

/// Transport delivering encoded slice images.
#[async_trait]
pub trait SliceSource: Send + Sync {
    /// Fetch the encoded image stored at `path`, relative to the source root.
    async fn fetch(&self, path: &Path) -> Result<Vec<u8>, VolumeLoaderError>;
}

/// Slices stored as files under a root directory,
/// `<root>/<image_path>/<index>.png`.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SliceSource for DirectorySource {
    async fn fetch(&self, path: &Path) -> Result<Vec<u8>, VolumeLoaderError> {
        Ok(tokio::fs::read(self.root.join(path)).await?)
    }
}

/// Outcome of one volume load.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Slices stored in the viewer
    pub stored: usize,
    /// Indices that failed to fetch, decode or store, ascending
    pub failed: Vec<usize>,
}

impl LoadReport {
    /// Count one applied completion, logging failures.
    pub fn record(&mut self, index: usize, outcome: Result<SliceOutcome, VolumeLoaderError>) {
        match outcome {
            Ok(SliceOutcome::Stored) => {
                debug!(index, "slice completed");
                self.stored += 1;
            }
            Ok(SliceOutcome::Stale) => debug!(index, "slice of a superseded volume dropped"),
            Ok(SliceOutcome::Unavailable) => {
                warn!(index, error = %VolumeError::MissingSurface, "slice left unavailable");
                self.failed.push(index);
            }
            Err(e) => {
                warn!(index, error = %e, "failed to load slice");
                self.failed.push(index);
            }
        }
    }
}

/// One settled slice fetch.
#[derive(Debug)]
pub struct SliceCompletion {
    /// Viewer generation the fetch was started for
    pub generation: u64,
    pub index: usize,
    pub image: Result<RgbaImage, VolumeLoaderError>,
}

impl SliceCompletion {
    /// Decode the image into `viewer`.
    ///
    /// # Errors
    ///
    /// The fetch or decode error of this slice, or a store rejection.
    pub fn apply(self, viewer: &mut Viewer) -> Result<SliceOutcome, VolumeLoaderError> {
        let image = self.image?;
        Ok(viewer.accept_image(self.generation, self.index, &image)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorDocument {
    Wrapped { data: VolumeDescriptor },
    Bare(VolumeDescriptor),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Parse a descriptor, either bare or wrapped in a `{"data": ...}`
    /// envelope.
    pub fn parse_descriptor(json: &[u8]) -> Result<VolumeDescriptor, VolumeLoaderError> {
        let descriptor = match serde_json::from_slice(json)? {
            DescriptorDocument::Wrapped { data } => data,
            DescriptorDocument::Bare(descriptor) => descriptor,
        };
        Ok(descriptor)
    }

    /// Read and parse a descriptor file.
    pub async fn load_descriptor(
        path: impl AsRef<Path>,
    ) -> Result<VolumeDescriptor, VolumeLoaderError> {
        let json = tokio::fs::read(path.as_ref()).await?;
        Self::parse_descriptor(&json)
    }

    /// Fetch every slice of `descriptor`, yielding each one as soon as it
    /// completes.
    ///
    /// All fetches are in flight at once and complete in no particular
    /// order. The stream does not borrow the viewer: callers apply each
    /// [`SliceCompletion`] between renders, so a stalled slice only keeps its
    /// own index absent. Completions carry `generation` and are ignored by a
    /// viewer that has moved on to another volume.
    pub fn stream_slices<'a, S: SliceSource + ?Sized>(
        source: &'a S,
        descriptor: VolumeDescriptor,
        generation: u64,
    ) -> impl Stream<Item = SliceCompletion> + Unpin + 'a {
        (0..descriptor.size_z)
            .map(|index| {
                let path = descriptor.slice_path(index);
                async move {
                    SliceCompletion {
                        generation,
                        index,
                        image: Self::fetch_image(source, &path).await,
                    }
                }
            })
            .collect::<FuturesUnordered<_>>()
    }

    /// Fetch every slice of the viewer's current volume and apply each one
    /// as it completes, returning once every fetch has settled.
    ///
    /// A slice that fails is logged and left absent; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeLoaderError::NoDescriptor`] if no volume was loaded
    /// into the viewer.
    pub async fn load_slices<S: SliceSource + ?Sized>(
        source: &S,
        viewer: &mut Viewer,
    ) -> Result<LoadReport, VolumeLoaderError> {
        let descriptor = viewer
            .descriptor()
            .cloned()
            .ok_or(VolumeLoaderError::NoDescriptor)?;

        let mut completions = Self::stream_slices(source, descriptor, viewer.generation());
        let mut report = LoadReport::default();
        while let Some(completion) = completions.next().await {
            let index = completion.index;
            report.record(index, completion.apply(viewer));
        }

        report.failed.sort_unstable();
        Ok(report)
    }

    async fn fetch_image<S: SliceSource + ?Sized>(
        source: &S,
        path: &Path,
    ) -> Result<RgbaImage, VolumeLoaderError> {
        let bytes = source.fetch(path).await?;
        let image = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes).map(|image| image.to_rgba8())
        })
        .await??;
        Ok(image)
    }
}
