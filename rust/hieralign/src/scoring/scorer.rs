use crate::models::{
    AlignmentParameters,
    DistanceSentinels,
    FeatureList,
};
use crate::utils::correlation::unit_dot;

use super::binning::{
    ClusterProfile,
    ScoringRow,
};

/// Scores pairs of feature rows from different samples.
///
/// The score mixes the spectral (chemical) similarity and the retention time
/// similarity of two rows; the distance is the score's shortfall from the
/// best achievable score. Pairs that cannot be aligned get one of the fixed
/// [`DistanceSentinels`] instead of a computed distance.
#[derive(Debug, Clone)]
pub struct RowSimilarityScorer {
    mz_tolerance: f64,
    rt_tolerance: f64,
    mz_weight: f64,
    rt_weight: f64,
    min_score: f64,
    max_mz_bins: usize,
    sentinels: DistanceSentinels,
}

impl RowSimilarityScorer {
    pub fn new(params: &AlignmentParameters) -> Self {
        Self {
            mz_tolerance: params.mz_tolerance,
            rt_tolerance: params.rt_tolerance,
            mz_weight: params.mz_weight,
            rt_weight: params.rt_weight,
            min_score: params.min_score,
            max_mz_bins: params.max_mz_bins,
            sentinels: params.sentinels,
        }
    }

    pub fn max_mz_bins(&self) -> usize {
        self.max_mz_bins
    }

    pub fn sentinels(&self) -> &DistanceSentinels {
        &self.sentinels
    }

    pub fn max_score(&self) -> f64 {
        self.mz_weight + self.rt_weight
    }

    /// Full width of the RT window.
    pub fn rt_max_diff(&self) -> f64 {
        2.0 * self.rt_tolerance
    }

    /// Full width of the m/z window.
    pub fn mz_max_diff(&self) -> f64 {
        2.0 * self.mz_tolerance
    }

    /// Flattens the rows of all lists into scoring rows, in list order.
    ///
    /// The position of a row in the output is its global index, and the
    /// position of its list is its sample column.
    pub fn prepare_rows(&self, lists: &[FeatureList]) -> Vec<ScoringRow> {
        let mut out = Vec::with_capacity(lists.iter().map(|l| l.len()).sum());
        for (sample, list) in lists.iter().enumerate() {
            for row in list.rows.iter() {
                out.push(ScoringRow::new(out.len(), sample, row, self.max_mz_bins));
            }
        }
        out
    }

    pub fn rt_similarity(&self, rt_a: f64, rt_b: f64) -> f64 {
        1.0 - (rt_a - rt_b).abs() / self.rt_max_diff()
    }

    fn combine(&self, chemical_similarity: f64, rt_similarity: f64) -> f64 {
        chemical_similarity * self.mz_weight + rt_similarity * self.rt_weight
    }

    /// Similarity score of two rows, in `[lower bound, mz_weight + rt_weight]`.
    pub fn score(&self, a: &ScoringRow, b: &ScoringRow) -> f64 {
        let chemical = unit_dot(&a.unit_spectrum, &b.unit_spectrum);
        self.combine(chemical, self.rt_similarity(a.rt, b.rt))
    }

    /// Scores a row against the mean profile of a cluster.
    pub fn score_against_profile(&self, row: &ScoringRow, profile: &ClusterProfile) -> f64 {
        let chemical = unit_dot(&row.unit_spectrum, profile.unit_spectrum());
        self.combine(chemical, self.rt_similarity(row.rt, profile.rt))
    }

    /// Distance between two rows.
    ///
    /// Cheap rejections are checked before the spectra are compared:
    /// same sample, then the m/z and RT windows, then the minimum score.
    pub fn distance(&self, a: &ScoringRow, b: &ScoringRow) -> f64 {
        if a.index == b.index {
            return 0.0;
        }
        if a.sample == b.sample {
            return self.sentinels.same_sample;
        }
        // Written as "not within" so NaN coordinates are rejected too.
        let within_rt = (a.rt - b.rt).abs() < self.rt_max_diff() / 2.0;
        let within_mz = (a.mz - b.mz).abs() < self.mz_max_diff() / 2.0;
        if !(within_rt && within_mz) {
            return self.sentinels.out_of_tolerance;
        }

        let score = self.score(a, b);
        if score.is_nan() || score <= self.min_score.max(0.0) {
            return self.sentinels.below_min_score;
        }
        // Scores can overshoot the maximum by rounding, distances stay >= 0.
        (self.max_score() - score).max(0.0)
    }
}
