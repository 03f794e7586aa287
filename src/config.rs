//! Command-line configuration for the `mpr-volume` renderer.
//!
//! Every option can also be set through an environment variable with the
//! `MPR_` prefix:
//!
//! - `MPR_DESCRIPTOR` - Volume descriptor JSON file (required)
//! - `MPR_BASE` - Directory slice images are resolved against (default: .)
//! - `MPR_PLANE` - axial, coronal or sagittal (default: axial)
//! - `MPR_X`, `MPR_Y`, `MPR_Z` - Cursor; defaults to the volume centre
//! - `MPR_LEVEL`, `MPR_WIDTH` - Window override
//! - `MPR_CANVAS_WIDTH`, `MPR_CANVAS_HEIGHT` - Display box (default: 400x400)
//! - `MPR_OUTPUT` - PNG written with the rendered view (default: view.png)

use std::path::PathBuf;

use clap::Parser;

use crate::descriptor::{Point, VolumeDescriptor};
use crate::enums::Plane;
use crate::error::VolumeError;
use crate::layout::CanvasBox;
use crate::session::DEFAULT_IMAGE_SIZE;
use crate::window::Windowing;

/// Default directory slice paths are resolved against.
pub const DEFAULT_BASE: &str = ".";

/// Default output file.
pub const DEFAULT_OUTPUT: &str = "view.png";

/// Render one view of a stack of encoded slice images.
///
/// Loads every slice listed by the descriptor, reslices the volume along the
/// requested plane, applies the intensity window and writes the result as a
/// PNG.
#[derive(Parser, Debug, Clone)]
#[command(name = "mpr-volume")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Volume descriptor (JSON, bare or wrapped in `{"data": ...}`).
    #[arg(long, env = "MPR_DESCRIPTOR")]
    pub descriptor: PathBuf,

    /// Directory `<image_path>/<index>.png` is resolved against.
    #[arg(long, default_value = DEFAULT_BASE, env = "MPR_BASE")]
    pub base: PathBuf,

    /// Plane to render.
    #[arg(long, default_value_t = Plane::Axial, env = "MPR_PLANE")]
    pub plane: Plane,

    /// Cursor x (sagittal position).
    #[arg(long, env = "MPR_X")]
    pub x: Option<usize>,

    /// Cursor y (coronal position).
    #[arg(long, env = "MPR_Y")]
    pub y: Option<usize>,

    /// Cursor z (axial slice).
    #[arg(long, env = "MPR_Z")]
    pub z: Option<usize>,

    /// Window level; overrides the descriptor's window.
    #[arg(long, allow_negative_numbers = true, env = "MPR_LEVEL")]
    pub level: Option<f64>,

    /// Window width (> 0); overrides the descriptor's window.
    #[arg(long, env = "MPR_WIDTH")]
    pub width: Option<f64>,

    /// Width of the display box in device pixels.
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE, env = "MPR_CANVAS_WIDTH")]
    pub canvas_width: u32,

    /// Height of the display box in device pixels.
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE, env = "MPR_CANVAS_HEIGHT")]
    pub canvas_height: u32,

    /// PNG file the rendered view is written to.
    #[arg(short, long, default_value = DEFAULT_OUTPUT, env = "MPR_OUTPUT")]
    pub output: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Cursor for `descriptor`: given coordinates, the volume centre for the
    /// rest.
    pub fn point(&self, descriptor: &VolumeDescriptor) -> Point {
        let center = descriptor.center();
        Point::new(
            self.x.unwrap_or(center.x),
            self.y.unwrap_or(center.y),
            self.z.unwrap_or(center.z),
        )
    }

    /// `current` with the level and width given on the command line applied.
    ///
    /// # Errors
    ///
    /// [`VolumeError::InvalidWindowWidth`] for a width `<= 0`.
    pub fn windowing(&self, current: Windowing) -> Result<Windowing, VolumeError> {
        let level = self.level.unwrap_or(current.level());
        let width = self.width.unwrap_or(current.width());
        Windowing::new(level, width)
    }

    pub fn canvas(&self) -> CanvasBox {
        CanvasBox::new(self.canvas_width as f64, self.canvas_height as f64)
    }
}
