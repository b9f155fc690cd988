//! Spectral and spatial resampling of data cubes.
//!
//! Two operations from the cube-preparation pipeline: frequency-axis
//! resampling (binning or Gaussian smoothing along axis 0) and
//! nearest-neighbor pixel replication of the spatial axes with an optional
//! Gaussian post-filter. Convolution boundary handling lives behind the
//! [`Convolve`] seam; [`EdgeRenormConvolver`] is the shipped default.

pub mod kernel;

pub use kernel::{gaussian_kernel_1d, gaussian_kernel_2d, Convolve, EdgeRenormConvolver};

use crate::cube::Cube;
use crate::trace::trace_event;
use crate::util::{CubePeakError, CubePeakResult};

/// Frequency-axis (axis 0) resampling mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum FreqResample {
    /// Leave the cube untouched.
    #[default]
    None,
    /// Sum consecutive groups of this many planes; remainder planes that do
    /// not fill a group are dropped.
    Bin(usize),
    /// Convolve each (y, x) column along axis 0 with a 1D Gaussian of this
    /// standard deviation.
    Smooth(f32),
}

/// Resamples the frequency axis according to `mode`.
///
/// `FreqResample::None` returns the input cube unchanged, same allocation.
pub fn resample_freq(
    cube: Cube<f32>,
    mode: FreqResample,
    convolver: &dyn Convolve,
) -> CubePeakResult<Cube<f32>> {
    match mode {
        FreqResample::None => Ok(cube),
        FreqResample::Bin(bin_size) => bin_freq(&cube, bin_size),
        FreqResample::Smooth(sigma) => smooth_freq(&cube, sigma, convolver),
    }
}

/// Sums consecutive groups of `bin_size` planes along axis 0.
///
/// The output has `nz / bin_size` planes; trailing planes that do not fill
/// a whole group are dropped. A bin size larger than the axis 0 extent would
/// leave zero planes, which a cube cannot represent, so it is rejected as a
/// configuration error.
pub fn bin_freq(cube: &Cube<f32>, bin_size: usize) -> CubePeakResult<Cube<f32>> {
    if bin_size == 0 {
        return Err(CubePeakError::InvalidConfig {
            reason: "bin size must be positive",
        });
    }
    let [nz, ny, nx] = cube.shape();
    let binned_nz = nz / bin_size;
    if binned_nz == 0 {
        return Err(CubePeakError::InvalidConfig {
            reason: "bin size exceeds the axis 0 extent",
        });
    }

    let plane_len = ny * nx;
    let data = cube.data();
    let mut out = vec![0.0f32; binned_nz * plane_len];
    for group in 0..binned_nz {
        let dst = &mut out[group * plane_len..(group + 1) * plane_len];
        for member in 0..bin_size {
            let src_start = (group * bin_size + member) * plane_len;
            let src = &data[src_start..src_start + plane_len];
            for (d, &s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
    }
    trace_event!("freq_binned", input_planes = nz, output_planes = binned_nz);
    Cube::from_vec(out, [binned_nz, ny, nx])
}

/// Smooths every (y, x) column along axis 0 with a 1D Gaussian kernel.
pub fn smooth_freq(
    cube: &Cube<f32>,
    sigma: f32,
    convolver: &dyn Convolve,
) -> CubePeakResult<Cube<f32>> {
    let kernel = gaussian_kernel_1d(sigma)?;
    let [nz, ny, nx] = cube.shape();
    let plane_len = ny * nx;
    let data = cube.data();

    let mut out = vec![0.0f32; data.len()];
    let mut column = vec![0.0f32; nz];
    for y in 0..ny {
        for x in 0..nx {
            let offset = y * nx + x;
            for z in 0..nz {
                column[z] = data[z * plane_len + offset];
            }
            let smoothed = convolver.convolve_1d(&column, &kernel);
            for (z, value) in smoothed.into_iter().enumerate() {
                out[z * plane_len + offset] = value;
            }
        }
    }
    Cube::from_vec(out, [nz, ny, nx])
}

/// Replicates each pixel of the last two axes into a `factor x factor` block.
///
/// Accepts rank-2 (`[ny, nx]`) or rank-3 (`[nz, ny, nx]`) input; rank 3
/// preserves axis 0. With `smooth`, each output 2D slice is post-filtered
/// with a Gaussian kernel of FWHM `factor` and side length `4 * factor + 1`.
/// Returns the replicated buffer together with its shape, which has the same
/// rank as the input.
pub fn replicate(
    data: &[f32],
    shape: &[usize],
    factor: usize,
    smooth: bool,
    convolver: &dyn Convolve,
) -> CubePeakResult<(Vec<f32>, Vec<usize>)> {
    let (nz, ny, nx, rank3) = match *shape {
        [ny, nx] => (1usize, ny, nx, false),
        [nz, ny, nx] => (nz, ny, nx, true),
        _ => {
            return Err(CubePeakError::UnsupportedRank { rank: shape.len() });
        }
    };
    if factor == 0 {
        return Err(CubePeakError::InvalidConfig {
            reason: "replication factor must be positive",
        });
    }
    if nz == 0 || ny == 0 || nx == 0 {
        return Err(CubePeakError::InvalidDimensions { shape: [nz, ny, nx] });
    }
    let needed = nz * ny * nx;
    if data.len() < needed {
        return Err(CubePeakError::BufferTooSmall {
            needed,
            got: data.len(),
        });
    }

    let out_ny = ny * factor;
    let out_nx = nx * factor;
    let out_plane = out_ny * out_nx;
    let mut out = vec![0.0f32; nz * out_plane];
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let value = data[(z * ny + y) * nx + x];
                for dy in 0..factor {
                    let row_start = z * out_plane + (y * factor + dy) * out_nx + x * factor;
                    out[row_start..row_start + factor].fill(value);
                }
            }
        }
    }

    if smooth {
        let ksize = 4 * factor + 1;
        let kernel = gaussian_kernel_2d(factor as f32, ksize)?;
        for z in 0..nz {
            let start = z * out_plane;
            let smoothed =
                convolver.convolve_2d(&out[start..start + out_plane], [out_ny, out_nx], &kernel, ksize);
            out[start..start + out_plane].copy_from_slice(&smoothed);
        }
    }

    let out_shape = if rank3 {
        vec![nz, out_ny, out_nx]
    } else {
        vec![out_ny, out_nx]
    };
    Ok((out, out_shape))
}

/// [`replicate`] for an owned cube, keeping the result a cube.
pub fn replicate_cube(
    cube: &Cube<f32>,
    factor: usize,
    smooth: bool,
    convolver: &dyn Convolve,
) -> CubePeakResult<Cube<f32>> {
    let shape = cube.shape();
    let (out, out_shape) = replicate(cube.data(), &shape, factor, smooth, convolver)?;
    Cube::from_vec(out, [out_shape[0], out_shape[1], out_shape[2]])
}
