//! Moving-maximum filtering and candidate masks.
//!
//! The moving maximum uses "nearest" edge extension: neighbor coordinates
//! outside the cube clamp to the nearest in-bounds index, so edge cells
//! compete against real data rather than an artificial fill value.

use crate::cube::{Cube, CubeView};
use crate::detect::Neighborhood;
use crate::util::CubePeakResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Replaces NaN cells with the global minimum non-NaN value.
///
/// Returns `None` when no substitution is needed: either the field has no
/// NaN, or it has no non-NaN value to substitute (the degenerate all-NaN
/// field, which can never produce candidates because NaN compares unequal
/// to everything).
pub(crate) fn sanitize_nans(data: &[f32]) -> Option<Vec<f32>> {
    let mut min = f32::INFINITY;
    let mut any_nan = false;
    let mut any_value = false;
    for &v in data {
        if v.is_nan() {
            any_nan = true;
        } else {
            any_value = true;
            if v < min {
                min = v;
            }
        }
    }
    if !any_nan || !any_value {
        return None;
    }
    Some(
        data.iter()
            .map(|&v| if v.is_nan() { min } else { v })
            .collect(),
    )
}

#[inline]
fn clamp_index(i: isize, extent: usize) -> usize {
    i.clamp(0, extent as isize - 1) as usize
}

fn max_filter_plane(data: &[f32], shape: [usize; 3], offsets: &[[isize; 3]], z: usize, out: &mut [f32]) {
    let [nz, ny, nx] = shape;
    let mut idx = 0;
    for y in 0..ny {
        for x in 0..nx {
            let mut best = f32::NEG_INFINITY;
            for off in offsets {
                let zz = clamp_index(z as isize + off[0], nz);
                let yy = clamp_index(y as isize + off[1], ny);
                let xx = clamp_index(x as isize + off[2], nx);
                let value = data[(zz * ny + yy) * nx + xx];
                if value > best {
                    best = value;
                }
            }
            out[idx] = best;
            idx += 1;
        }
    }
}

/// Fills `out` with the neighborhood maximum of every cell.
///
/// The parallel path splits on z-planes and runs the same per-plane kernel
/// as the sequential path, so results are bit-identical.
pub(crate) fn max_filter_into(data: &[f32], shape: [usize; 3], offsets: &[[isize; 3]], out: &mut [f32]) {
    let plane_len = shape[1] * shape[2];
    #[cfg(feature = "rayon")]
    {
        out.par_chunks_mut(plane_len)
            .enumerate()
            .for_each(|(z, plane)| max_filter_plane(data, shape, offsets, z, plane));
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (z, plane) in out.chunks_mut(plane_len).enumerate() {
            max_filter_plane(data, shape, offsets, z, plane);
        }
    }
}

/// Computes the sanitized working copy and candidate mask in one pass.
///
/// The first element is `Some` only when NaN substitution produced a private
/// copy; callers fall back to the original slice otherwise.
pub(crate) fn candidate_mask_sanitized(
    field: CubeView<'_, f32>,
    offsets: &[[isize; 3]],
) -> (Option<Vec<f32>>, Cube<bool>) {
    let shape = field.shape();
    let data = field.as_slice();
    let sanitized = sanitize_nans(data);
    let working: &[f32] = sanitized.as_deref().unwrap_or(data);

    let mut local_max = vec![f32::NEG_INFINITY; working.len()];
    max_filter_into(working, shape, offsets, &mut local_max);

    let mask: Vec<bool> = working
        .iter()
        .zip(&local_max)
        .map(|(&v, &m)| v == m)
        .collect();
    let mask = Cube::from_vec(mask, shape).expect("mask shape matches field shape");
    (sanitized, mask)
}

/// Computes the moving-maximum filter of `field` over `neighborhood`.
///
/// NaN cells are substituted with the global minimum non-NaN value before
/// filtering, so NaN never propagates into the output.
pub fn max_filter(field: CubeView<'_, f32>, neighborhood: &Neighborhood) -> CubePeakResult<Cube<f32>> {
    let offsets = neighborhood.offsets()?;
    let shape = field.shape();
    let data = field.as_slice();
    let sanitized = sanitize_nans(data);
    let working: &[f32] = sanitized.as_deref().unwrap_or(data);

    let mut out = vec![f32::NEG_INFINITY; working.len()];
    max_filter_into(working, shape, &offsets, &mut out);
    Cube::from_vec(out, shape)
}

/// Flags every cell whose value equals its neighborhood maximum.
///
/// Plateaus of equal value all flag true; tie-breaking happens later during
/// selection. An all-NaN field yields an all-false mask.
pub fn candidate_mask(
    field: CubeView<'_, f32>,
    neighborhood: &Neighborhood,
) -> CubePeakResult<Cube<bool>> {
    let offsets = neighborhood.offsets()?;
    let (_, mask) = candidate_mask_sanitized(field, &offsets);
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::{clamp_index, sanitize_nans};

    #[test]
    fn sanitize_replaces_nan_with_global_minimum() {
        let data = [3.0f32, f32::NAN, -2.0, 7.0];
        let cleaned = sanitize_nans(&data).unwrap();
        assert_eq!(cleaned, vec![3.0, -2.0, -2.0, 7.0]);
    }

    #[test]
    fn sanitize_skips_clean_and_all_nan_fields() {
        assert!(sanitize_nans(&[1.0f32, 2.0]).is_none());
        assert!(sanitize_nans(&[f32::NAN, f32::NAN]).is_none());
    }

    #[test]
    fn clamp_index_maps_to_nearest_edge() {
        assert_eq!(clamp_index(-2, 5), 0);
        assert_eq!(clamp_index(3, 5), 3);
        assert_eq!(clamp_index(7, 5), 4);
    }
}
