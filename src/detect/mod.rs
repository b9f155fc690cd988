//! Peak detection over 3D data cubes.
//!
//! Detection runs in two stages. A moving-maximum filter flags every cell
//! that equals the maximum over its neighborhood (see [`candidate_mask`]),
//! then selection narrows the candidates with an optional exclusion mask,
//! per-axis border exclusion, and a strict threshold, truncating to the
//! highest-valued `npeaks` when asked. [`PeakFinder`] wires the two stages
//! to optional world-coordinate and centroiding collaborators.

pub mod maxfilter;
pub(crate) mod select;
pub mod table;

pub use maxfilter::{candidate_mask, max_filter};
pub use table::{CentroidFit, PeakRecord, PeakTable, PixelToWorld, SkyCoord};

use crate::cube::CubeView;
use crate::trace::{trace_event, trace_span};
use crate::util::{CubePeakError, CubePeakResult};

/// Boolean structuring element defining the exact neighborhood offsets.
#[derive(Clone, Debug)]
pub struct Footprint {
    data: Vec<bool>,
    shape: [usize; 3],
}

impl Footprint {
    /// Wraps a row-major boolean array with the given `[nz, ny, nx]` shape.
    ///
    /// The shape may be even or odd per axis; the center cell is at
    /// `shape[i] / 2` (floor) on each axis. At least one cell must be
    /// selected.
    pub fn from_vec(data: Vec<bool>, shape: [usize; 3]) -> CubePeakResult<Self> {
        if shape.iter().any(|&extent| extent == 0) {
            return Err(CubePeakError::InvalidDimensions { shape });
        }
        let needed = shape[0]
            .checked_mul(shape[1])
            .and_then(|v| v.checked_mul(shape[2]))
            .ok_or(CubePeakError::InvalidDimensions { shape })?;
        if data.len() != needed {
            return Err(CubePeakError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if !data.iter().any(|&selected| selected) {
            return Err(CubePeakError::InvalidConfig {
                reason: "footprint selects no cells",
            });
        }
        Ok(Self { data, shape })
    }

    /// Returns the `[nz, ny, nx]` shape of the structuring element.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    fn offsets(&self) -> Vec<[isize; 3]> {
        let center = [
            (self.shape[0] / 2) as isize,
            (self.shape[1] / 2) as isize,
            (self.shape[2] / 2) as isize,
        ];
        let mut offsets = Vec::new();
        let mut idx = 0;
        for z in 0..self.shape[0] {
            for y in 0..self.shape[1] {
                for x in 0..self.shape[2] {
                    if self.data[idx] {
                        offsets.push([
                            z as isize - center[0],
                            y as isize - center[1],
                            x as isize - center[2],
                        ]);
                    }
                    idx += 1;
                }
            }
        }
        offsets
    }
}

/// Neighborhood over which local maximality is judged.
#[derive(Clone, Debug)]
pub enum Neighborhood {
    /// Cubic box with the same odd side length on every axis.
    Box {
        /// Side length; must be a positive odd integer.
        size: usize,
    },
    /// Explicit structuring element.
    Footprint(Footprint),
}

impl Default for Neighborhood {
    fn default() -> Self {
        Neighborhood::Box { size: 3 }
    }
}

impl Neighborhood {
    /// Resolves the neighborhood to a list of relative cell offsets.
    pub(crate) fn offsets(&self) -> CubePeakResult<Vec<[isize; 3]>> {
        match self {
            Neighborhood::Box { size } => {
                if *size == 0 || size % 2 == 0 {
                    return Err(CubePeakError::InvalidConfig {
                        reason: "box size must be a positive odd integer",
                    });
                }
                let half = (*size / 2) as isize;
                let mut offsets = Vec::with_capacity(size * size * size);
                for z in -half..=half {
                    for y in -half..=half {
                        for x in -half..=half {
                            offsets.push([z, y, x]);
                        }
                    }
                }
                Ok(offsets)
            }
            Neighborhood::Footprint(footprint) => Ok(footprint.offsets()),
        }
    }
}

/// Configuration for a detection call.
#[derive(Clone, Debug)]
pub struct DetectConfig {
    /// Strict lower bound on peak values; cells exactly equal are excluded.
    pub threshold: f32,
    /// Neighborhood for local maximality. Defaults to a 3-cell box.
    pub neighborhood: Neighborhood,
    /// Excludes cells within this many cells of either edge, on every axis.
    /// A width of half an axis extent or more empties that axis.
    pub border_width: Option<usize>,
    /// Keeps at most this many peaks, highest values first. `None` keeps
    /// all. Must be at least 1 when set.
    pub npeaks: Option<usize>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            neighborhood: Neighborhood::default(),
            border_width: None,
            npeaks: None,
        }
    }
}

/// Peak finder binding a configuration to optional collaborators.
///
/// Collaborators are invoked once per call on batched coordinate arrays;
/// their failures propagate to the caller unchanged.
pub struct PeakFinder<'a> {
    config: DetectConfig,
    wcs: Option<&'a dyn PixelToWorld>,
    centroider: Option<&'a dyn CentroidFit>,
    centroid_error: Option<CubeView<'a, f32>>,
}

impl<'a> PeakFinder<'a> {
    /// Validates the configuration and creates a finder.
    pub fn new(config: DetectConfig) -> CubePeakResult<Self> {
        if config.npeaks == Some(0) {
            return Err(CubePeakError::InvalidConfig {
                reason: "npeaks must be at least 1 when set",
            });
        }
        // Surface a bad neighborhood here rather than on first use.
        config.neighborhood.offsets()?;
        Ok(Self {
            config,
            wcs: None,
            centroider: None,
            centroid_error: None,
        })
    }

    /// Attaches a pixel-to-world transform; adds the `skycoord_peak` column.
    pub fn with_wcs(mut self, wcs: &'a dyn PixelToWorld) -> Self {
        self.wcs = Some(wcs);
        self
    }

    /// Attaches a centroider; adds the `x_centroid`/`y_centroid` columns.
    pub fn with_centroider(mut self, centroider: &'a dyn CentroidFit) -> Self {
        self.centroider = Some(centroider);
        self
    }

    /// Supplies a per-cell uncertainty cube forwarded to the centroider.
    pub fn with_centroid_error(mut self, error: CubeView<'a, f32>) -> Self {
        self.centroid_error = Some(error);
        self
    }

    /// Detects peaks in `field`, excluding cells flagged true in `mask`.
    pub fn find(
        &self,
        field: CubeView<'_, f32>,
        mask: Option<CubeView<'_, bool>>,
    ) -> CubePeakResult<PeakTable> {
        let shape = field.shape();
        let _span = trace_span!(
            "find_peaks",
            nz = shape[0],
            ny = shape[1],
            nx = shape[2],
            threshold = self.config.threshold as f64
        )
        .entered();

        if let Some(m) = mask {
            if m.shape() != shape {
                return Err(CubePeakError::ShapeMismatch {
                    expected: shape,
                    got: m.shape(),
                    context: "exclusion mask",
                });
            }
        }
        if let Some(e) = self.centroid_error {
            if e.shape() != shape {
                return Err(CubePeakError::ShapeMismatch {
                    expected: shape,
                    got: e.shape(),
                    context: "centroid error",
                });
            }
        }

        let offsets = self.config.neighborhood.offsets()?;
        let (sanitized, candidates) = maxfilter::candidate_mask_sanitized(field, &offsets);
        let working: &[f32] = sanitized.as_deref().unwrap_or_else(|| field.as_slice());

        let peaks = select::select_peaks(
            working,
            &candidates,
            mask,
            self.config.threshold,
            self.config.border_width,
            self.config.npeaks,
        );
        trace_event!("peaks_selected", count = peaks.len());

        let mut table = PeakTable::new(self.wcs.is_some(), self.centroider.is_some());
        for peak in &peaks {
            table.push(PeakRecord::new(peak.z, peak.y, peak.x, peak.value));
        }
        if table.is_empty() {
            return Ok(table);
        }

        if let Some(wcs) = self.wcs {
            let xs: Vec<f64> = peaks.iter().map(|p| p.x as f64).collect();
            let ys: Vec<f64> = peaks.iter().map(|p| p.y as f64).collect();
            let coords = wcs.pixel_to_world(&xs, &ys)?;
            check_batch_len(coords.len(), peaks.len(), "pixel_to_world")?;
            for (record, coord) in table.records_mut().iter_mut().zip(coords) {
                record.skycoord_peak = Some(coord);
            }
        }

        if let Some(centroider) = self.centroider {
            let zs: Vec<usize> = peaks.iter().map(|p| p.z).collect();
            let ys: Vec<usize> = peaks.iter().map(|p| p.y).collect();
            let xs: Vec<usize> = peaks.iter().map(|p| p.x).collect();
            // The centroider sees the same sanitized values selection used.
            let sanitized_view = CubeView::from_slice(working, shape)?;
            let (cx, cy) = centroider.fit(
                sanitized_view,
                &zs,
                &ys,
                &xs,
                &self.config.neighborhood,
                self.centroid_error,
            )?;
            check_batch_len(cx.len(), peaks.len(), "centroid x")?;
            check_batch_len(cy.len(), peaks.len(), "centroid y")?;
            for (record, (x, y)) in table
                .records_mut()
                .iter_mut()
                .zip(cx.iter().copied().zip(cy.iter().copied()))
            {
                record.x_centroid = Some(x);
                record.y_centroid = Some(y);
            }

            if let Some(wcs) = self.wcs {
                let coords = wcs.pixel_to_world(&cx, &cy)?;
                check_batch_len(coords.len(), peaks.len(), "centroid pixel_to_world")?;
                for (record, coord) in table.records_mut().iter_mut().zip(coords) {
                    record.skycoord_centroid = Some(coord);
                }
            }
        }

        Ok(table)
    }
}

fn check_batch_len(got: usize, expected: usize, context: &'static str) -> CubePeakResult<()> {
    if got != expected {
        return Err(CubePeakError::LengthMismatch {
            expected,
            got,
            context,
        });
    }
    Ok(())
}

/// Detects peaks above `threshold` with the default 3-cell box neighborhood.
pub fn find_peaks(field: CubeView<'_, f32>, threshold: f32) -> CubePeakResult<PeakTable> {
    PeakFinder::new(DetectConfig {
        threshold,
        ..DetectConfig::default()
    })?
    .find(field, None)
}

#[cfg(test)]
mod tests {
    use super::{Footprint, Neighborhood};
    use crate::util::CubePeakError;

    #[test]
    fn box_offsets_cover_the_cube() {
        let offsets = Neighborhood::Box { size: 3 }.offsets().unwrap();
        assert_eq!(offsets.len(), 27);
        assert!(offsets.contains(&[0, 0, 0]));
        assert!(offsets.contains(&[-1, 1, -1]));
    }

    #[test]
    fn box_size_must_be_odd_and_positive() {
        for size in [0usize, 2, 4] {
            let err = Neighborhood::Box { size }.offsets().err().unwrap();
            assert!(matches!(err, CubePeakError::InvalidConfig { .. }));
        }
        assert!(Neighborhood::Box { size: 1 }.offsets().is_ok());
    }

    #[test]
    fn footprint_offsets_are_relative_to_center() {
        // Cross in a single plane: center plus the four edge midpoints.
        let data = vec![
            false, true, false, //
            true, true, true, //
            false, true, false,
        ];
        let footprint = Footprint::from_vec(data, [1, 3, 3]).unwrap();
        let offsets = footprint.offsets();
        assert_eq!(offsets.len(), 5);
        assert!(offsets.contains(&[0, 0, 0]));
        assert!(offsets.contains(&[0, -1, 0]));
        assert!(offsets.contains(&[0, 0, 1]));
    }

    #[test]
    fn footprint_rejects_degenerate_shapes() {
        let err = Footprint::from_vec(vec![], [0, 3, 3]).err().unwrap();
        assert!(matches!(err, CubePeakError::InvalidDimensions { .. }));

        let err = Footprint::from_vec(vec![false; 27], [3, 3, 3]).err().unwrap();
        assert!(matches!(err, CubePeakError::InvalidConfig { .. }));

        let err = Footprint::from_vec(vec![true; 8], [3, 3, 3]).err().unwrap();
        assert!(matches!(err, CubePeakError::BufferTooSmall { .. }));

        let err = Footprint::from_vec(vec![], [usize::MAX, 3, 3]).err().unwrap();
        assert!(matches!(err, CubePeakError::InvalidDimensions { .. }));
    }

    #[test]
    fn even_footprint_center_floors() {
        let footprint = Footprint::from_vec(vec![true; 8], [2, 2, 2]).unwrap();
        let offsets = footprint.offsets();
        assert_eq!(offsets.len(), 8);
        assert!(offsets.contains(&[-1, -1, -1]));
        assert!(offsets.contains(&[0, 0, 0]));
        assert!(!offsets.contains(&[1, 1, 1]));
    }
}
