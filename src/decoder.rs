//! Recovery of signed 16-bit intensities from 8-bit RGBA slice images.
//!
//! Slices are shipped as ordinary PNGs: the unsigned 16-bit value
//! `sample + 32768` is stored big-endian in the red (high byte) and green
//! (low byte) channels. Blue and alpha carry nothing.

use image::{RgbaImage, imageops};

use crate::volume::Slice;

/// Offset re-centering the unsigned 16-bit range onto `i16`.
pub const SAMPLE_OFFSET: i32 = 32768;

/// Offscreen RGBA bitmap slices are drawn onto before their pixels are read
/// back.
///
/// Resizing the surface clears it, like an HTML canvas.
pub struct RenderSurface {
    canvas: RgbaImage,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
        }
    }

    /// Current (width, height) of the surface.
    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas = RgbaImage::new(width, height);
    }

    /// Clear the surface and draw `image` at the origin, cropped to the surface.
    fn redraw(&mut self, image: &RgbaImage) {
        self.canvas.fill(0);
        imageops::replace(&mut self.canvas, image, 0, 0);
    }

    /// Read a `width x height` RGBA region starting at the origin.
    ///
    /// Pixels outside the surface read as transparent black.
    fn read_pixels(&self, width: u32, height: u32) -> Vec<u8> {
        let (canvas_width, canvas_height) = self.canvas.dimensions();
        if (width, height) == (canvas_width, canvas_height) {
            return self.canvas.as_raw().clone();
        }

        let mut raw = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                if x < canvas_width && y < canvas_height {
                    raw.extend_from_slice(&self.canvas.get_pixel(x, y).0);
                } else {
                    raw.extend_from_slice(&[0, 0, 0, 0]);
                }
            }
        }
        raw
    }
}

pub struct ImageDecoder;

impl ImageDecoder {
    /// Decode one slice image into a `height x width` grid of samples.
    ///
    /// The image is rendered onto `surface` resized to
    /// `target_width x target_height`, then read back at the image's natural
    /// size. With `keep_original_size` the surface gets its prior dimensions
    /// back before returning.
    ///
    /// Returns `None` when no surface is available.
    pub fn decode(
        surface: Option<&mut RenderSurface>,
        image: &RgbaImage,
        target_width: u32,
        target_height: u32,
        keep_original_size: bool,
    ) -> Option<Slice> {
        let surface = surface?;
        let original_dimensions = surface.dimensions();

        surface.resize(target_width, target_height);
        surface.redraw(image);

        let (natural_width, natural_height) =
            Self::natural_dimensions(image, target_width, target_height);
        let raw = surface.read_pixels(natural_width, natural_height);
        let slice = Self::decode_rgba(&raw, natural_width as usize);

        if keep_original_size {
            let (width, height) = original_dimensions;
            surface.resize(width, height);
        }

        Some(slice)
    }

    /// Natural image size, falling back to the requested size when the image
    /// reports none.
    fn natural_dimensions(
        image: &RgbaImage,
        target_width: u32,
        target_height: u32,
    ) -> (u32, u32) {
        match image.dimensions() {
            (0, 0) => (target_width, target_height),
            (0, height) => (target_width, height),
            (width, 0) => (width, target_height),
            dimensions => dimensions,
        }
    }

    /// Decode a raw RGBA buffer, one row per `4 * width` bytes, top to bottom.
    ///
    /// Trailing bytes that do not make up a full row are ignored.
    pub fn decode_rgba(raw: &[u8], width: usize) -> Slice {
        if width == 0 {
            return Slice::zeros((0, 0));
        }
        let rows = raw.len() / (width * 4);
        let pixels: &[[u8; 4]] = bytemuck::cast_slice(&raw[..rows * width * 4]);

        Slice::from_shape_fn((rows, width), |(row, column)| {
            decode_pixel(pixels[row * width + column])
        })
    }
}

/// `(R << 8) + G - 32768`
#[inline]
pub fn decode_pixel([r, g, _, _]: [u8; 4]) -> i16 {
    (((r as i32) << 8) + g as i32 - SAMPLE_OFFSET) as i16
}

/// Inverse of [`decode_pixel`]: an opaque pixel carrying `sample`.
#[inline]
pub fn encode_sample(sample: i16) -> [u8; 4] {
    let [high, low] = ((sample as i32 + SAMPLE_OFFSET) as u16).to_be_bytes();
    [high, low, 0, 255]
}
