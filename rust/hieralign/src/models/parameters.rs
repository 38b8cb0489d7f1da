use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    AlignmentError,
    Result,
};

/// Default number of 1-Da bins used to vectorize spectra.
pub const DEFAULT_MAX_MZ_BINS: usize = 800;

/// 1 GiB worth of `f64` values per matrix chunk.
pub const DEFAULT_MATRIX_CHUNK_LEN: usize = (1 << 30) / std::mem::size_of::<f64>();

/// Number of matrix rows scored per parallel block.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// How the distance between a freshly merged cluster and the rest is derived
/// from the distances of its two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Linkage {
    /// Single linkage.
    #[serde(rename = "min")]
    Min,
    /// Complete linkage.
    #[serde(rename = "max")]
    Max,
    /// Size-weighted average linkage.
    #[default]
    #[serde(rename = "avg")]
    Avg,
}

/// Fixed distances assigned to pairs that never reach the scoring step.
///
/// They must all be larger than the distance tolerance, otherwise pairs that
/// are impossible to align could end up in the same cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceSentinels {
    /// Two rows from the same sample.
    pub same_sample: f64,
    /// Rows further apart than the m/z or RT tolerance.
    pub out_of_tolerance: f64,
    /// Rows whose score does not exceed the minimum score.
    pub below_min_score: f64,
}

impl Default for DistanceSentinels {
    fn default() -> Self {
        Self {
            same_sample: 1000.0,
            out_of_tolerance: 100.0,
            below_min_score: 10.0,
        }
    }
}

impl DistanceSentinels {
    fn smallest(&self) -> f64 {
        self.same_sample
            .min(self.out_of_tolerance)
            .min(self.below_min_score)
    }
}

/// Where the cluster validator gets pairwise distances from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValidationDistance {
    /// A copy of the distance matrix taken before clustering.
    #[default]
    #[serde(rename = "matrix_snapshot")]
    MatrixSnapshot,
    /// Re-score every pair on demand, trading CPU for the snapshot's memory.
    #[serde(rename = "rescore")]
    Rescore,
}

/// Parameters of a hierarchical alignment run.
///
/// Example:
/// ```
/// use hieralign::AlignmentParameters;
///
/// let params = AlignmentParameters::default();
/// assert_eq!(params.effective_distance_tolerance(), 2.0);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentParameters {
    /// Half width of the m/z window, in daltons.
    pub mz_tolerance: f64,
    /// Half width of the retention time window, in minutes.
    pub rt_tolerance: f64,
    pub mz_weight: f64,
    pub rt_weight: f64,
    pub min_score: f64,
    pub linkage: Linkage,
    /// Maximum distance allowed inside a cluster.
    /// Falls back to `mz_weight + rt_weight` when unset.
    pub distance_tolerance: Option<f64>,
    pub max_mz_bins: usize,
    pub sentinels: DistanceSentinels,
    pub validation_distance: ValidationDistance,
    pub matrix_chunk_len: usize,
    pub block_size: usize,
    pub export_dendrogram: bool,
    pub aligned_list_name: String,
}

impl Default for AlignmentParameters {
    fn default() -> Self {
        Self {
            mz_tolerance: 0.5,
            rt_tolerance: 0.5,
            mz_weight: 1.0,
            rt_weight: 1.0,
            min_score: 0.5,
            linkage: Linkage::default(),
            distance_tolerance: None,
            max_mz_bins: DEFAULT_MAX_MZ_BINS,
            sentinels: DistanceSentinels::default(),
            validation_distance: ValidationDistance::default(),
            matrix_chunk_len: DEFAULT_MATRIX_CHUNK_LEN,
            block_size: DEFAULT_BLOCK_SIZE,
            export_dendrogram: false,
            aligned_list_name: "Aligned feature list".to_string(),
        }
    }
}

impl AlignmentParameters {
    /// The maximum achievable score.
    pub fn max_score(&self) -> f64 {
        self.mz_weight + self.rt_weight
    }

    pub fn effective_distance_tolerance(&self) -> f64 {
        self.distance_tolerance.unwrap_or_else(|| self.max_score())
    }

    /// Checks that the parameters give the scorer something to work with.
    ///
    /// Runs before any matrix work, so a bad configuration never costs a
    /// distance computation.
    pub fn validate(&self) -> Result<()> {
        if self.mz_weight == 0.0 && self.rt_weight == 0.0 {
            return Err(AlignmentError::configuration(
                "m/z weight and RT weight are both zero, there is no basis for scoring",
            ));
        }
        for (name, value) in [
            ("mz_weight", self.mz_weight),
            ("rt_weight", self.rt_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AlignmentError::configuration(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("mz_tolerance", self.mz_tolerance),
            ("rt_tolerance", self.rt_tolerance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AlignmentError::configuration(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }
        if self.min_score.is_nan() {
            return Err(AlignmentError::configuration("min_score is NaN"));
        }
        if self.max_mz_bins == 0 {
            return Err(AlignmentError::configuration(
                "max_mz_bins must be at least 1",
            ));
        }
        if self.matrix_chunk_len == 0 || self.block_size == 0 {
            return Err(AlignmentError::configuration(
                "matrix_chunk_len and block_size must be at least 1",
            ));
        }
        let tolerance = self.effective_distance_tolerance();
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(AlignmentError::configuration(format!(
                "distance tolerance must be finite and non-negative, got {}",
                tolerance
            )));
        }
        if self.sentinels.smallest() <= tolerance {
            return Err(AlignmentError::configuration(format!(
                "distance sentinels ({:?}) must all exceed the distance tolerance {}; \
                 with mz_weight + rt_weight at or above {} raise `sentinels` as well \
                 or set a smaller `distance_tolerance`",
                self.sentinels,
                tolerance,
                self.sentinels.smallest()
            )));
        }
        Ok(())
    }
}
