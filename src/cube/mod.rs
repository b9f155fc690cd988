//! Cube views and owned cubes.
//!
//! `CubeView` is a borrowed 3D view into a contiguous row-major buffer with
//! shape `[nz, ny, nx]` (axis order z, y, x: plane, row, column). `Cube` is
//! the owned counterpart used for computed results such as candidate masks
//! and resampled data. Views are contiguous: element `(z, y, x)` lives at
//! index `(z * ny + y) * nx + x`.

use crate::util::{CubePeakError, CubePeakResult};

/// Borrowed contiguous 3D view with shape `[nz, ny, nx]`.
#[derive(Copy, Clone)]
pub struct CubeView<'a, T> {
    data: &'a [T],
    shape: [usize; 3],
}

impl<'a, T> CubeView<'a, T> {
    /// Creates a view over `data` with the given `[nz, ny, nx]` shape.
    pub fn from_slice(data: &'a [T], shape: [usize; 3]) -> CubePeakResult<Self> {
        let needed = required_len(shape)?;
        if data.len() < needed {
            return Err(CubePeakError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Returns the `[nz, ny, nx]` shape.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Returns the total number of cells.
    pub fn len(&self) -> usize {
        self.shape[0] * self.shape[1] * self.shape[2]
    }

    /// Returns true if the view has no cells. Never true for a constructed
    /// view, but keeps clippy and callers honest.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [T] {
        &self.data[..self.len()]
    }

    /// Returns the flat index of `(z, y, x)` without bounds checking the
    /// result against the shape.
    #[inline]
    pub(crate) fn flat_index(&self, z: usize, y: usize, x: usize) -> usize {
        (z * self.shape[1] + y) * self.shape[2] + x
    }

    /// Returns the element at `(z, y, x)` if it is within bounds.
    pub fn get(&self, z: usize, y: usize, x: usize) -> Option<&'a T> {
        if z >= self.shape[0] || y >= self.shape[1] || x >= self.shape[2] {
            return None;
        }
        self.data.get(self.flat_index(z, y, x))
    }

    /// Returns the contiguous `ny * nx` plane at depth `z`.
    pub fn plane(&self, z: usize) -> Option<&'a [T]> {
        if z >= self.shape[0] {
            return None;
        }
        let plane_len = self.shape[1] * self.shape[2];
        let start = z * plane_len;
        self.data.get(start..start + plane_len)
    }
}

/// Owned contiguous 3D array with shape `[nz, ny, nx]`.
#[derive(Clone, Debug)]
pub struct Cube<T = f32> {
    data: Vec<T>,
    shape: [usize; 3],
}

impl<T> Cube<T> {
    /// Wraps an owned buffer with the given shape.
    pub fn from_vec(data: Vec<T>, shape: [usize; 3]) -> CubePeakResult<Self> {
        let needed = required_len(shape)?;
        if data.len() != needed {
            return Err(CubePeakError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Returns the `[nz, ny, nx]` shape.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Returns the backing buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consumes the cube, returning the backing buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns a borrowed view of the cube.
    pub fn view(&self) -> CubeView<'_, T> {
        CubeView {
            data: &self.data,
            shape: self.shape,
        }
    }

    /// Returns the element at `(z, y, x)` if it is within bounds.
    pub fn get(&self, z: usize, y: usize, x: usize) -> Option<&T> {
        if z >= self.shape[0] || y >= self.shape[1] || x >= self.shape[2] {
            return None;
        }
        self.data.get((z * self.shape[1] + y) * self.shape[2] + x)
    }
}

impl<T: Clone + Default> Cube<T> {
    /// Creates a cube filled with `T::default()`.
    pub fn filled_default(shape: [usize; 3]) -> CubePeakResult<Self> {
        let needed = required_len(shape)?;
        Ok(Self {
            data: vec![T::default(); needed],
            shape,
        })
    }
}

fn required_len(shape: [usize; 3]) -> CubePeakResult<usize> {
    if shape.iter().any(|&extent| extent == 0) {
        return Err(CubePeakError::InvalidDimensions { shape });
    }
    shape[0]
        .checked_mul(shape[1])
        .and_then(|v| v.checked_mul(shape[2]))
        .ok_or(CubePeakError::InvalidDimensions { shape })
}
