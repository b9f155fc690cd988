//! Validity narrowing, extraction, and top-K truncation of candidates.

use std::cmp::Ordering;

use crate::cube::{Cube, CubeView};

/// Peak candidate in index space, before output assembly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RawPeak {
    pub(crate) z: usize,
    pub(crate) y: usize,
    pub(crate) x: usize,
    pub(crate) value: f32,
}

fn peak_cmp_desc(a: &RawPeak, b: &RawPeak) -> Ordering {
    b.value
        .total_cmp(&a.value)
        .then_with(|| a.z.cmp(&b.z))
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts peaks by descending value with deterministic tie-breaking.
///
/// Ties order by ascending (z, y, x), which is exactly the row-major scan
/// order the peaks were extracted in, so truncation keeps the earliest-seen
/// members of a plateau.
pub(crate) fn sort_peaks_desc(peaks: &mut [RawPeak]) {
    peaks.sort_by(peak_cmp_desc);
}

#[inline]
fn in_border(index: usize, extent: usize, width: usize) -> bool {
    index < width || index + width >= extent
}

/// Extracts surviving candidates and truncates to the top `npeaks` by value.
///
/// `values` must be the (NaN-sanitized) field buffer the candidates were
/// computed from. The exclusions are conjunctive, so their order does not
/// matter: external mask, per-axis border, strict threshold. Extraction walks
/// the cube in row-major (z, y, x) order; the output keeps that order unless
/// truncation kicked in, in which case it is sorted by descending value.
pub(crate) fn select_peaks(
    values: &[f32],
    candidates: &Cube<bool>,
    mask: Option<CubeView<'_, bool>>,
    threshold: f32,
    border_width: Option<usize>,
    npeaks: Option<usize>,
) -> Vec<RawPeak> {
    let [nz, ny, nx] = candidates.shape();
    let cand = candidates.data();
    let excluded = mask.map(|m| m.as_slice());

    let mut peaks = Vec::new();
    let mut idx = 0;
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                if cand[idx]
                    && !excluded.is_some_and(|m| m[idx])
                    && values[idx] > threshold
                    && !border_width.is_some_and(|b| {
                        in_border(z, nz, b) || in_border(y, ny, b) || in_border(x, nx, b)
                    })
                {
                    peaks.push(RawPeak {
                        z,
                        y,
                        x,
                        value: values[idx],
                    });
                }
                idx += 1;
            }
        }
    }

    if let Some(limit) = npeaks {
        if peaks.len() > limit {
            sort_peaks_desc(&mut peaks);
            peaks.truncate(limit);
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::{sort_peaks_desc, RawPeak};

    #[test]
    fn sort_orders_by_value_then_scan_order() {
        let mut peaks = vec![
            RawPeak { z: 1, y: 0, x: 0, value: 2.0 },
            RawPeak { z: 0, y: 0, x: 1, value: 5.0 },
            RawPeak { z: 0, y: 0, x: 0, value: 5.0 },
            RawPeak { z: 0, y: 1, x: 0, value: 3.0 },
        ];
        sort_peaks_desc(&mut peaks);
        let order: Vec<(usize, usize, usize)> = peaks.iter().map(|p| (p.z, p.y, p.x)).collect();
        assert_eq!(order, vec![(0, 0, 0), (0, 0, 1), (0, 1, 0), (1, 0, 0)]);
    }
}
