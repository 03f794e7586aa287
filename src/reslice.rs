//! Multi-planar reconstruction from the axial stack.
//!
//! Reconstructed planes put the deepest slice on the first output row, so
//! output row `i` is sourced from slice `size_z - 1 - i`.

use ndarray::{Array2, ArrayView1, Axis};

use crate::descriptor::Point;
use crate::enums::Plane;
use crate::volume::VolumeStore;

/// Row-major grid of samples for one plane.
pub type Grid = Array2<i16>;

pub struct Reslicer;

impl Reslicer {
    /// Reslice `volume` along `plane` through `point`.
    ///
    /// * Axial: the stored slice at `point.z`, unchanged (`size_y x size_x`).
    /// * Coronal: row `size_y - 1 - point.y` of every slice (`size_z x size_x`).
    /// * Sagittal: column `point.x` of every slice as a row (`size_z x size_y`).
    ///
    /// Only slices present in the store contribute, so callers should check
    /// completeness before asking for a reconstructed plane. A point outside
    /// the volume yields an empty grid.
    pub fn reslice(plane: Plane, point: &Point, volume: &VolumeStore, size_y: usize) -> Grid {
        match plane {
            Plane::Axial => volume.get(point.z).cloned().unwrap_or_else(empty_grid),
            Plane::Coronal => {
                let Some(row) = size_y.checked_sub(point.y + 1) else {
                    return empty_grid();
                };
                Self::stack_reversed(
                    volume
                        .values()
                        .filter(|slice| row < slice.nrows())
                        .map(|slice| slice.row(row)),
                )
            }
            Plane::Sagittal => Self::stack_reversed(
                volume
                    .values()
                    .filter(|slice| point.x < slice.ncols())
                    .map(|slice| slice.column(point.x)),
            ),
        }
    }

    /// Stack one line per slice, deepest slice first.
    fn stack_reversed<'a>(lines: impl DoubleEndedIterator<Item = ArrayView1<'a, i16>>) -> Grid {
        let lines: Vec<ArrayView1<'a, i16>> = lines.rev().collect();
        if lines.is_empty() {
            return empty_grid();
        }
        ndarray::stack(Axis(0), &lines).unwrap_or_else(|_| empty_grid())
    }
}

fn empty_grid() -> Grid {
    Grid::zeros((0, 0))
}
