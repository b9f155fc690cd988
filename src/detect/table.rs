//! Output records and collaborator seams for peak detection.

use crate::cube::CubeView;
use crate::detect::Neighborhood;
use crate::util::CubePeakResult;

/// World coordinate as (longitude, latitude) in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyCoord {
    /// Longitude (e.g. right ascension) in degrees.
    pub lon: f64,
    /// Latitude (e.g. declination) in degrees.
    pub lat: f64,
}

/// Batched pixel-to-world mapping, typically backed by a WCS solution.
///
/// Implementations are invoked at most twice per detection call: once for
/// the integer peak coordinates and once for the fitted centroids.
pub trait PixelToWorld {
    /// Maps batches of pixel (x, y) coordinates to world coordinates.
    ///
    /// The output must have the same length as the inputs. Failures
    /// propagate to the detection caller unchanged.
    fn pixel_to_world(&self, x: &[f64], y: &[f64]) -> CubePeakResult<Vec<SkyCoord>>;
}

/// Batched sub-pixel centroid estimation around detected peaks.
pub trait CentroidFit {
    /// Fits (x, y) centroids for all peaks in one call.
    ///
    /// `field` is the NaN-sanitized field the peaks were detected in, and
    /// `z`/`y`/`x` are the parallel coordinate arrays of every peak.
    /// `neighborhood` is the detection neighborhood, which implementations
    /// typically reuse as the fitting window. `error` is an optional
    /// per-cell uncertainty cube with the field's shape.
    #[allow(clippy::too_many_arguments)]
    fn fit(
        &self,
        field: CubeView<'_, f32>,
        z: &[usize],
        y: &[usize],
        x: &[usize],
        neighborhood: &Neighborhood,
        error: Option<CubeView<'_, f32>>,
    ) -> CubePeakResult<(Vec<f64>, Vec<f64>)>;
}

/// One detected peak.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakRecord {
    /// Index along axis 0 (spectral plane).
    pub z_peak: usize,
    /// Index along axis 1 (row).
    pub y_peak: usize,
    /// Index along axis 2 (column).
    pub x_peak: usize,
    /// Field value at the peak, from the NaN-sanitized working copy.
    pub peak_value: f32,
    /// World coordinate of the peak, when a transform is configured.
    pub skycoord_peak: Option<SkyCoord>,
    /// Sub-pixel x centroid, when a centroider is configured.
    pub x_centroid: Option<f64>,
    /// Sub-pixel y centroid, when a centroider is configured.
    pub y_centroid: Option<f64>,
    /// World coordinate of the centroid, when both collaborators are set.
    pub skycoord_centroid: Option<SkyCoord>,
}

impl PeakRecord {
    pub(crate) fn new(z: usize, y: usize, x: usize, value: f32) -> Self {
        Self {
            z_peak: z,
            y_peak: y,
            x_peak: x,
            peak_value: value,
            skycoord_peak: None,
            x_centroid: None,
            y_centroid: None,
            skycoord_centroid: None,
        }
    }
}

/// Ordered collection of detected peaks with a stable column contract.
///
/// The set of optional columns is fixed by the finder configuration, not by
/// the rows, so a zero-row table still reports the columns it would have
/// carried.
#[derive(Clone, Debug)]
pub struct PeakTable {
    records: Vec<PeakRecord>,
    has_skycoord: bool,
    has_centroid: bool,
}

impl PeakTable {
    pub(crate) fn new(has_skycoord: bool, has_centroid: bool) -> Self {
        Self {
            records: Vec::new(),
            has_skycoord,
            has_centroid,
        }
    }

    pub(crate) fn push(&mut self, record: PeakRecord) {
        self.records.push(record);
    }

    pub(crate) fn records_mut(&mut self) -> &mut [PeakRecord] {
        &mut self.records
    }

    /// Returns the detected peaks in output order.
    pub fn records(&self) -> &[PeakRecord] {
        &self.records
    }

    /// Returns the number of detected peaks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no peak survived selection.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the peaks in output order.
    pub fn iter(&self) -> std::slice::Iter<'_, PeakRecord> {
        self.records.iter()
    }

    /// Column names in insertion order.
    ///
    /// Always starts with `z_peak, y_peak, x_peak, peak_value`; optional
    /// columns follow in the order they are attached during detection.
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names = vec!["z_peak", "y_peak", "x_peak", "peak_value"];
        if self.has_skycoord {
            names.push("skycoord_peak");
        }
        if self.has_centroid {
            names.push("x_centroid");
            names.push("y_centroid");
            if self.has_skycoord {
                names.push("skycoord_centroid");
            }
        }
        names
    }
}

impl<'a> IntoIterator for &'a PeakTable {
    type Item = &'a PeakRecord;
    type IntoIter = std::slice::Iter<'a, PeakRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
