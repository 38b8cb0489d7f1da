use crate::models::{
    FeatureRow,
    SpectrumPoint,
};
use crate::utils::correlation::normalize_in_place;

/// Accumulates the intensities of a spectrum into 1-Da bins.
///
/// The bin of a point is `round(mz)`; points that land outside
/// `[0, n_bins)` are dropped.
///
/// # Example
///
/// ```
/// use hieralign::models::SpectrumPoint;
/// use hieralign::scoring::bin_spectrum;
///
/// let points = [
///     SpectrumPoint { mz: 1.2, intensity: 2.0 },
///     SpectrumPoint { mz: 0.9, intensity: 3.0 },
///     SpectrumPoint { mz: 3.6, intensity: 1.0 },
///     SpectrumPoint { mz: 10.0, intensity: 100.0 },
/// ];
/// assert_eq!(bin_spectrum(&points, 5), vec![0.0, 5.0, 0.0, 0.0, 1.0]);
/// ```
pub fn bin_spectrum(points: &[SpectrumPoint], n_bins: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; n_bins];
    for point in points {
        let bin = point.mz.round();
        if bin < 0.0 || !bin.is_finite() {
            continue;
        }
        let bin = bin as usize;
        if bin < n_bins {
            out[bin] += point.intensity;
        }
    }
    out
}

/// A feature row reduced to what the scorer needs.
///
/// The binned spectrum is stored scaled to unit length so that
/// the cosine of two rows is a single dot product.
#[derive(Debug, Clone)]
pub struct ScoringRow {
    /// Global row index (position in the concatenation of all input lists).
    pub index: usize,
    /// Sample column the row belongs to.
    pub sample: usize,
    pub mz: f64,
    pub rt: f64,
    pub(crate) unit_spectrum: Vec<f32>,
}

impl ScoringRow {
    pub fn new(index: usize, sample: usize, row: &FeatureRow, n_bins: usize) -> Self {
        let mut unit_spectrum = bin_spectrum(&row.spectrum, n_bins);
        normalize_in_place(&mut unit_spectrum);
        Self {
            index,
            sample,
            mz: row.mz,
            rt: row.rt,
            unit_spectrum,
        }
    }

    pub fn unit_spectrum(&self) -> &[f32] {
        &self.unit_spectrum
    }
}

/// The comparison vector of a cluster: the mean binned spectrum of its
/// members, plus their mean m/z and RT.
///
/// Always rebuilt from the full membership, never updated incrementally,
/// so the result does not depend on the order rows joined the cluster.
#[derive(Debug, Clone)]
pub struct ClusterProfile {
    pub mz: f64,
    pub rt: f64,
    pub size: usize,
    unit_spectrum: Vec<f32>,
}

impl ClusterProfile {
    pub fn from_members<'a>(
        members: impl IntoIterator<Item = &'a FeatureRow>,
        n_bins: usize,
    ) -> Self {
        let mut sum = vec![0.0f64; n_bins];
        let mut mz = 0.0;
        let mut rt = 0.0;
        let mut size = 0usize;
        for member in members {
            for (acc, x) in sum.iter_mut().zip(bin_spectrum(&member.spectrum, n_bins)) {
                *acc += x as f64;
            }
            mz += member.mz;
            rt += member.rt;
            size += 1;
        }

        if size == 0 {
            return Self {
                mz: f64::NAN,
                rt: f64::NAN,
                size,
                unit_spectrum: vec![0.0; n_bins],
            };
        }

        let denom = size as f64;
        let mut unit_spectrum: Vec<f32> = sum.into_iter().map(|x| (x / denom) as f32).collect();
        normalize_in_place(&mut unit_spectrum);
        Self {
            mz: mz / denom,
            rt: rt / denom,
            size,
            unit_spectrum,
        }
    }

    pub fn unit_spectrum(&self) -> &[f32] {
        &self.unit_spectrum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::correlation::norm;

    #[test]
    fn test_binning_drops_out_of_range() {
        let points = [
            SpectrumPoint {
                mz: -3.0,
                intensity: 1.0,
            },
            SpectrumPoint {
                mz: f64::NAN,
                intensity: 1.0,
            },
            SpectrumPoint {
                mz: 799.4,
                intensity: 7.0,
            },
            SpectrumPoint {
                mz: 799.6,
                intensity: 7.0,
            },
        ];
        let binned = bin_spectrum(&points, 800);
        assert_eq!(binned.len(), 800);
        assert_eq!(binned[799], 7.0);
        assert_eq!(binned.iter().sum::<f32>(), 7.0);
    }

    #[test]
    fn test_scoring_row_is_unit_length() {
        let row = FeatureRow::new(1, 100.0, 5.0).with_spectrum([(50.0, 3.0), (60.0, 4.0)]);
        let srow = ScoringRow::new(0, 0, &row, 100);
        assert!((norm(srow.unit_spectrum()) - 1.0).abs() < 1e-6);
        assert!((srow.unit_spectrum()[50] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_profile_is_order_independent() {
        let a = FeatureRow::new(1, 100.0, 5.0).with_spectrum([(50.0, 3.0), (61.0, 1.0)]);
        let b = FeatureRow::new(2, 100.2, 5.2).with_spectrum([(50.0, 1.0), (70.0, 9.0)]);
        let c = FeatureRow::new(3, 100.1, 5.1).with_spectrum([(70.0, 2.0)]);

        let p1 = ClusterProfile::from_members([&a, &b, &c], 100);
        let p2 = ClusterProfile::from_members([&c, &a, &b], 100);
        assert_eq!(p1.unit_spectrum(), p2.unit_spectrum());
        assert_eq!(p1.size, 3);
        assert!((p1.rt - 5.1).abs() < 1e-12);
        assert!((p1.mz - 100.1).abs() < 1e-12);
    }
}
