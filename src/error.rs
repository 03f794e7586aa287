use thiserror::Error;

/// Errors raised by the in-memory volume pipeline.
///
/// All of them are local: a caller skips the frame or keeps showing the
/// loading state, nothing here is fatal for a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VolumeError {
    /// No render surface was available to decode onto.
    #[error("No render surface available")]
    MissingSurface,

    /// The source grid has more samples than the destination buffer holds.
    #[error("Buffer overrun: {samples} samples do not fit a buffer of {capacity} pixels")]
    BufferOverrun { samples: usize, capacity: usize },

    /// A reconstructed plane was requested before every slice was loaded.
    #[error("Volume incomplete: slice {index} is not loaded yet")]
    IncompleteVolume { index: usize },

    /// Window width must be strictly positive.
    #[error("Invalid window width: {0} (must be > 0)")]
    InvalidWindowWidth(f64),

    /// Slice index outside `[0, size_z)`.
    #[error("Slice index {index} out of range (size_z is {size_z})")]
    SliceOutOfRange { index: usize, size_z: usize },

    /// A dimension too large to address as an image side.
    #[error("Dimension {0} exceeds the image size range")]
    DimensionOverflow(usize),

    /// Slice does not have `size_y x size_x` samples.
    #[error("Slice shape mismatch: expected {expected:?}, got {actual:?}")]
    SliceShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}
