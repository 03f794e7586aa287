use ndarray::Array2;
use tracing::debug;

use crate::descriptor::VolumeDescriptor;
use crate::error::VolumeError;

/// One axial slice: `size_y` rows of `size_x` signed samples.
pub type Slice = Array2<i16>;

/// Shape of the data actually resident in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeShape {
    /// Number of stored slices
    pub slices: usize,
    /// Rows per slice
    pub rows: usize,
    /// Samples per row
    pub columns: usize,
}

/// Axial slices of one volume, addressed by slice index.
///
/// Slots are pre-sized to `size_z`, so enumeration is always in ascending
/// index order no matter in which order slices arrive. The store only grows.
#[derive(Debug, Clone)]
pub struct VolumeStore {
    slots: Vec<Option<Slice>>,
    /// (rows, columns) every slice must have
    slice_dim: (usize, usize),
    filled: usize,
}

impl VolumeStore {
    pub fn new(size_z: usize, size_y: usize, size_x: usize) -> Self {
        Self {
            slots: vec![None; size_z],
            slice_dim: (size_y, size_x),
            filled: 0,
        }
    }

    pub fn for_descriptor(descriptor: &VolumeDescriptor) -> Self {
        Self::new(descriptor.size_z, descriptor.size_y, descriptor.size_x)
    }

    /// Declared dimensions (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        (self.slots.len(), self.slice_dim.0, self.slice_dim.1)
    }

    /// Store `slice` at `index`. Storing the same index again replaces the
    /// previous slice.
    ///
    /// # Errors
    ///
    /// Rejects indices outside `[0, size_z)` and slices whose shape is not
    /// `size_y x size_x`.
    pub fn put(&mut self, index: usize, slice: Slice) -> Result<(), VolumeError> {
        let size_z = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(VolumeError::SliceOutOfRange { index, size_z })?;

        if slice.dim() != self.slice_dim {
            return Err(VolumeError::SliceShape {
                expected: self.slice_dim,
                actual: slice.dim(),
            });
        }

        if slot.replace(slice).is_none() {
            self.filled += 1;
        }
        debug!(index, filled = self.filled, size_z, "stored slice");
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Slice> {
        self.slots.get(index)?.as_ref()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Number of distinct indices stored.
    pub fn size(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// True exactly when `size_z` distinct indices are stored.
    pub fn is_complete(&self, size_z: usize) -> bool {
        self.filled == size_z
    }

    /// Stored slices in ascending index order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &Slice> + '_ {
        self.slots.iter().flatten()
    }

    /// Stored slices with their index, ascending.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &Slice)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|slice| (index, slice)))
    }

    /// Lowest index that has not been stored yet.
    pub fn first_missing(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Shape of the resident data, `None` while nothing usable is stored.
    pub fn shape(&self) -> Option<VolumeShape> {
        let first = self.values().next()?;
        let (rows, columns) = first.dim();
        if rows == 0 || columns == 0 {
            return None;
        }
        Some(VolumeShape {
            slices: self.filled,
            rows,
            columns,
        })
    }
}
