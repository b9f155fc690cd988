//! Gaussian kernels and the convolution seam.

use crate::util::{CubePeakError, CubePeakResult};

/// FWHM of a Gaussian divided by its standard deviation, `2 * sqrt(2 ln 2)`.
const FWHM_PER_SIGMA: f32 = 2.354_820_1;

/// Builds a 1D Gaussian kernel normalized to unit sum.
///
/// The kernel radius is `ceil(4 * sigma)`, so the tails are truncated at
/// four standard deviations.
pub fn gaussian_kernel_1d(sigma: f32) -> CubePeakResult<Vec<f32>> {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(CubePeakError::InvalidConfig {
            reason: "gaussian sigma must be positive and finite",
        });
    }
    let radius = (4.0 * sigma).ceil() as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel = Vec::with_capacity((2 * radius + 1) as usize);
    for i in -radius..=radius {
        let distance_sq = (i * i) as f32;
        kernel.push((-distance_sq / denom).exp());
    }
    normalize(&mut kernel);
    Ok(kernel)
}

/// Builds a square 2D Gaussian kernel from a FWHM, normalized to unit sum.
///
/// `size` is the odd side length; the kernel is returned row-major.
pub fn gaussian_kernel_2d(fwhm: f32, size: usize) -> CubePeakResult<Vec<f32>> {
    if !(fwhm > 0.0) || !fwhm.is_finite() {
        return Err(CubePeakError::InvalidConfig {
            reason: "gaussian fwhm must be positive and finite",
        });
    }
    if size == 0 || size % 2 == 0 {
        return Err(CubePeakError::InvalidConfig {
            reason: "gaussian kernel size must be a positive odd integer",
        });
    }
    let sigma = fwhm / FWHM_PER_SIGMA;
    let denom = 2.0 * sigma * sigma;
    let center = (size / 2) as isize;
    let mut kernel = Vec::with_capacity(size * size);
    for y in 0..size {
        let dy = y as isize - center;
        for x in 0..size {
            let dx = x as isize - center;
            let distance_sq = (dx * dx + dy * dy) as f32;
            kernel.push((-distance_sq / denom).exp());
        }
    }
    normalize(&mut kernel);
    Ok(kernel)
}

fn normalize(kernel: &mut [f32]) {
    let total: f32 = kernel.iter().sum();
    for value in kernel.iter_mut() {
        *value /= total;
    }
}

/// Convolution service with implementor-defined boundary handling.
pub trait Convolve {
    /// Convolves `signal` with an odd-length `kernel`; same-size output.
    fn convolve_1d(&self, signal: &[f32], kernel: &[f32]) -> Vec<f32>;

    /// Convolves a row-major `[ny, nx]` image with a square kernel of odd
    /// side length `ksize`; same-size output.
    fn convolve_2d(&self, data: &[f32], shape: [usize; 2], kernel: &[f32], ksize: usize)
        -> Vec<f32>;
}

/// Default convolver: zero fill outside the signal, with the kernel
/// renormalized over its in-bounds mass so flat signals stay flat at edges.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeRenormConvolver;

impl Convolve for EdgeRenormConvolver {
    fn convolve_1d(&self, signal: &[f32], kernel: &[f32]) -> Vec<f32> {
        let n = signal.len() as isize;
        let radius = (kernel.len() / 2) as isize;
        (0..n)
            .map(|i| {
                let mut acc = 0.0f32;
                let mut mass = 0.0f32;
                for (k, &weight) in kernel.iter().enumerate() {
                    let j = i + k as isize - radius;
                    if j >= 0 && j < n {
                        acc += weight * signal[j as usize];
                        mass += weight;
                    }
                }
                if mass > 0.0 {
                    acc / mass
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn convolve_2d(
        &self,
        data: &[f32],
        shape: [usize; 2],
        kernel: &[f32],
        ksize: usize,
    ) -> Vec<f32> {
        let [ny, nx] = shape;
        let radius = (ksize / 2) as isize;
        let mut out = Vec::with_capacity(ny * nx);
        for y in 0..ny as isize {
            for x in 0..nx as isize {
                let mut acc = 0.0f32;
                let mut mass = 0.0f32;
                for ky in 0..ksize as isize {
                    let sy = y + ky - radius;
                    if sy < 0 || sy >= ny as isize {
                        continue;
                    }
                    for kx in 0..ksize as isize {
                        let sx = x + kx - radius;
                        if sx < 0 || sx >= nx as isize {
                            continue;
                        }
                        let weight = kernel[(ky * ksize as isize + kx) as usize];
                        acc += weight * data[(sy * nx as isize + sx) as usize];
                        mass += weight;
                    }
                }
                out.push(if mass > 0.0 { acc / mass } else { 0.0 });
            }
        }
        out
    }
}
