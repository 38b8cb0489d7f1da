use tracing::debug;

use super::tree::{
    LeafSet,
    MergeTree,
    NodeRef,
};
use crate::errors::Result;
use crate::matrix::ChunkedSymmetricMatrix;
use crate::progress::{
    CancellationToken,
    ProgressSink,
    Stage,
};
use crate::scoring::{
    RowSimilarityScorer,
    ScoringRow,
};

/// Slack on the distance tolerance to absorb floating point noise.
pub const DISTANCE_EPSILON: f64 = 1e-9;

/// Anything that can report the distance between two rows by global index.
pub trait DistanceSource {
    fn distance(&self, a: usize, b: usize) -> f64;
}

impl DistanceSource for ChunkedSymmetricMatrix {
    fn distance(&self, a: usize, b: usize) -> f64 {
        self.get(a, b)
    }
}

/// Scores pairs on demand instead of reading a stored matrix.
pub struct RescoringDistances<'a> {
    pub scorer: &'a RowSimilarityScorer,
    pub rows: &'a [ScoringRow],
}

impl DistanceSource for RescoringDistances<'_> {
    fn distance(&self, a: usize, b: usize) -> f64 {
        self.scorer.distance(&self.rows[a], &self.rows[b])
    }
}

/// Cuts a merge tree into clusters that are valid aligned rows.
///
/// Walks the tree from the root. A node is accepted as a whole when it
/// does not hold more leaves than there are samples and every pair of its
/// leaves is within the distance tolerance; otherwise both children are
/// examined on their own. Leaves reached this way become singletons.
#[derive(Debug, Clone, Copy)]
pub struct ClusterTreeValidator {
    sample_count: usize,
    distance_tolerance: f64,
}

impl ClusterTreeValidator {
    pub fn new(sample_count: usize, distance_tolerance: f64) -> Self {
        Self {
            sample_count,
            distance_tolerance,
        }
    }

    fn max_pairwise_within(&self, leaves: &[usize], distances: &impl DistanceSource) -> bool {
        let limit = self.distance_tolerance + DISTANCE_EPSILON;
        leaves.iter().enumerate().all(|(i, &a)| {
            leaves[i + 1..]
                .iter()
                .all(|&b| distances.distance(a, b) < limit)
        })
    }

    /// Whether the leaves below a node may form one aligned row.
    pub fn accepts(&self, leaves: &[usize], distances: &impl DistanceSource) -> bool {
        leaves.len() <= self.sample_count && self.max_pairwise_within(leaves, distances)
    }

    pub fn validate(
        &self,
        tree: &MergeTree,
        distances: &impl DistanceSource,
        progress: &impl ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<LeafSet>> {
        let mut out = Vec::new();
        let Some(root) = tree.root() else {
            return Ok(out);
        };
        progress.start_stage(Stage::Validation, tree.leaf_count() as u64);

        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            match current {
                NodeRef::Leaf(i) => {
                    out.push(LeafSet(vec![i]));
                    progress.advance(1);
                }
                NodeRef::Node(k) => {
                    cancel.check()?;
                    let node = tree.node(k);
                    // Nodes bigger than the sample count are rejected without
                    // expanding their leaves.
                    if node.size <= self.sample_count {
                        let leaves = tree.leaves(current);
                        if self.max_pairwise_within(&leaves, distances) {
                            progress.advance(leaves.len() as u64);
                            out.push(LeafSet(leaves));
                            continue;
                        }
                    }
                    debug!(
                        "Splitting node {} ({} leaves, merged at {})",
                        k, node.size, node.distance
                    );
                    stack.push(node.right);
                    stack.push(node.left);
                }
            }
        }

        progress.finish_stage(Stage::Validation);
        Ok(out)
    }
}
