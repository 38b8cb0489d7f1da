//! Pairwise similarity between feature rows of different samples.

mod binning;
mod scorer;

pub use binning::{
    ClusterProfile,
    ScoringRow,
    bin_spectrum,
};
pub use scorer::RowSimilarityScorer;
