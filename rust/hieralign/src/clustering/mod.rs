//! Agglomerative clustering of the distance matrix and the cut of the
//! resulting tree into aligned clusters.

mod agglomerative;
mod tree;
mod validation;

pub use agglomerative::AgglomerativeClusterer;
pub use tree::{
    LeafSet,
    MergeNode,
    MergeTree,
    NodeRef,
};
pub use validation::{
    ClusterTreeValidator,
    DISTANCE_EPSILON,
    DistanceSource,
    RescoringDistances,
};
