#![doc = include_str!("../README.md")]

// Declare modules
pub mod alignment;
pub mod clustering;
pub mod dendrogram;
pub mod errors;
pub mod matrix;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod scoring;
pub mod utils;

// Re-export main structures
pub use crate::alignment::AlignmentBuilder;
pub use crate::clustering::{
    AgglomerativeClusterer,
    ClusterTreeValidator,
    LeafSet,
    MergeTree,
};
pub use crate::matrix::{
    ChunkedSymmetricMatrix,
    DistanceMatrixBuilder,
};
pub use crate::models::{
    AlignedFeatureList,
    AlignmentParameters,
    FeatureList,
    FeatureRow,
    Linkage,
};
pub use crate::pipeline::{
    AlignmentResult,
    HierarchicalAligner,
};
pub use crate::progress::{
    CancellationToken,
    ProgressSink,
};
pub use crate::scoring::RowSimilarityScorer;

// Re-export errors
pub use crate::errors::{
    AlignmentError,
    DataProcessingError,
    Result,
};
