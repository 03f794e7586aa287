//! Linear intensity windowing into an opaque grayscale RGBA buffer.

use std::borrow::Cow;

use image::{ImageBuffer, RgbaImage};
use ndarray::ArrayView2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::VolumeError;

/// Window level (centre) and width (range) of the displayed intensities.
///
/// Read-only; width is always strictly positive. Create a new instance to
/// change the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WindowParams", into = "WindowParams")]
pub struct Windowing {
    level: f64,
    width: f64,
}

#[derive(Serialize, Deserialize)]
struct WindowParams {
    level: f64,
    width: f64,
}

impl TryFrom<WindowParams> for Windowing {
    type Error = VolumeError;

    fn try_from(params: WindowParams) -> Result<Self, Self::Error> {
        Windowing::new(params.level, params.width)
    }
}

impl From<Windowing> for WindowParams {
    fn from(windowing: Windowing) -> Self {
        Self {
            level: windowing.level,
            width: windowing.width,
        }
    }
}

impl Default for Windowing {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl Windowing {
    /// Window used before a volume supplies its own.
    pub const INITIAL: Windowing = Windowing {
        level: -1000.0,
        width: 1.0,
    };

    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidWindowWidth`] unless `width` is finite
    /// and `> 0`.
    pub fn new(level: f64, width: f64) -> Result<Self, VolumeError> {
        if !(width > 0.0 && width.is_finite()) {
            return Err(VolumeError::InvalidWindowWidth(width));
        }
        Ok(Self { level, width })
    }

    #[inline]
    pub fn level(&self) -> f64 {
        self.level
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Gain, `255 / width`.
    #[inline]
    pub fn alpha(&self) -> f64 {
        255.0 / self.width
    }

    /// Offset, `255 * (0.5 - level / width)`.
    #[inline]
    pub fn beta(&self) -> f64 {
        255.0 * (0.5 - self.level / self.width)
    }

    /// Samples at or below `level - width / 2` stay black.
    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.level - self.width / 2.0
    }

    /// Raw shade `alpha * v + beta` for a visible sample, `None` when `v` is
    /// at or below the lower bound. Not clamped.
    #[inline]
    pub fn shade(&self, value: i16) -> Option<f64> {
        let value = value as f64;
        (value > self.lower_bound()).then(|| self.alpha() * value + self.beta())
    }
}

/// Store a shade the way an 8-bit clamped canvas buffer does: saturate to
/// `[0, 255]`, round half to even.
#[inline]
pub fn shade_to_byte(shade: f64) -> u8 {
    if shade.is_nan() {
        return 0;
    }
    shade.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Row-major RGBA bytes of a `width x height` image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Opaque black buffer.
    pub fn opaque(width: u32, height: u32) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        data.par_chunks_exact_mut(4).for_each(|pixel| pixel[3] = u8::MAX);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels the buffer holds.
    pub fn capacity(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut pixel = [0u8; 4];
        pixel.copy_from_slice(&self.data[offset..offset + 4]);
        Some(pixel)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn into_image(self) -> Option<RgbaImage> {
        ImageBuffer::from_raw(self.width, self.height, self.data)
    }
}

pub struct WindowTransform;

impl WindowTransform {
    /// Window `grid` into a fresh `d_width x d_height` RGBA buffer.
    ///
    /// The grid is flattened row-major; sample `p` lands on pixel `p`. Pixels
    /// without a visible sample stay opaque black.
    ///
    /// # Errors
    ///
    /// [`VolumeError::BufferOverrun`] when the grid has more samples than
    /// the buffer has pixels. Nothing is written in that case.
    pub fn apply(
        grid: ArrayView2<'_, i16>,
        windowing: &Windowing,
        d_width: u32,
        d_height: u32,
    ) -> Result<PixelBuffer, VolumeError> {
        let mut buffer = PixelBuffer::opaque(d_width, d_height);
        let capacity = buffer.capacity();
        if grid.len() > capacity {
            warn!(
                samples = grid.len(),
                capacity, "grid does not fit the pixel buffer, skipping frame"
            );
            return Err(VolumeError::BufferOverrun {
                samples: grid.len(),
                capacity,
            });
        }

        let samples: Cow<'_, [i16]> = match grid.as_slice() {
            Some(samples) => Cow::Borrowed(samples),
            None => Cow::Owned(grid.iter().copied().collect()),
        };

        buffer
            .data
            .par_chunks_exact_mut(4)
            .zip(samples.par_iter())
            .for_each(|(pixel, &value)| {
                if let Some(shade) = windowing.shade(value) {
                    pixel[..3].fill(shade_to_byte(shade));
                }
            });

        Ok(buffer)
    }
}
