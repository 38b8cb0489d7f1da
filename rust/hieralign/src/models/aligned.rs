use serde::{
    Deserialize,
    Serialize,
};

use super::feature::{
    FeatureRow,
    PeakIdentity,
    Sample,
};
use super::parameters::AlignmentParameters;

/// One row of the aligned output: at most one feature per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedFeatureRow {
    pub id: u32,
    /// One slot per sample column, in the same order as
    /// [`AlignedFeatureList::samples`].
    pub features: Vec<Option<FeatureRow>>,
    pub identities: Vec<PeakIdentity>,
    pub preferred_identity: Option<PeakIdentity>,
    pub mz: f64,
    pub rt: f64,
    /// Mean score of the members against the cluster's mean spectrum.
    pub consensus_score: f64,
}

impl AlignedFeatureRow {
    pub fn new(id: u32, sample_count: usize) -> Self {
        Self {
            id,
            features: vec![None; sample_count],
            identities: Vec::new(),
            preferred_identity: None,
            mz: f64::NAN,
            rt: f64::NAN,
            consensus_score: f64::NAN,
        }
    }

    pub fn member_count(&self) -> usize {
        self.features.iter().filter(|x| x.is_some()).count()
    }

    pub fn members(&self) -> impl Iterator<Item = &FeatureRow> {
        self.features.iter().flatten()
    }
}

/// Where an aligned list came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub module: String,
    pub parameters: AlignmentParameters,
    /// Seconds since the UNIX epoch at which the alignment finished.
    pub timestamp_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedFeatureList {
    pub name: String,
    pub samples: Vec<Sample>,
    pub rows: Vec<AlignedFeatureRow>,
    pub provenance: Provenance,
}

impl AlignedFeatureList {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_features(&self) -> usize {
        self.rows.iter().map(|r| r.member_count()).sum()
    }
}
