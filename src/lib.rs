//! Cubepeak finds local-maximum peaks in 3D scalar fields such as spectral
//! data cubes.
//!
//! This crate provides a moving-maximum candidate filter and a peak selector
//! with mask/border/threshold narrowing and top-K truncation, plus simple
//! frequency-axis and spatial resampling of cubes. Optional parallelism is
//! available via the `rayon` feature; world-coordinate transforms, centroid
//! fitting, and convolution boundary policy are collaborator traits.

pub mod cube;
pub mod detect;
pub mod resample;
mod trace;
pub mod util;

pub use cube::{Cube, CubeView};
pub use util::{CubePeakError, CubePeakResult};

pub use detect::{
    candidate_mask, find_peaks, max_filter, CentroidFit, DetectConfig, Footprint, Neighborhood,
    PeakFinder, PeakRecord, PeakTable, PixelToWorld, SkyCoord,
};
pub use resample::{
    bin_freq, gaussian_kernel_1d, gaussian_kernel_2d, replicate, replicate_cube, resample_freq,
    smooth_freq, Convolve, EdgeRenormConvolver, FreqResample,
};
