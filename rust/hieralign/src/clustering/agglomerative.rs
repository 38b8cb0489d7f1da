use std::cmp::Ordering;
use std::time::Instant;
use tracing::{
    debug,
    info,
};

use super::tree::{
    MergeNode,
    MergeTree,
    NodeRef,
};
use crate::errors::Result;
use crate::matrix::ChunkedSymmetricMatrix;
use crate::models::Linkage;
use crate::progress::{
    CancellationToken,
    ProgressSink,
    Stage,
};

impl Linkage {
    /// Distance from the union of `a` and `b` to a third cluster.
    pub fn combine(&self, d_a: f64, d_b: f64, size_a: usize, size_b: usize) -> f64 {
        match self {
            Linkage::Min => d_a.min(d_b),
            Linkage::Max => d_a.max(d_b),
            Linkage::Avg => {
                let (wa, wb) = (size_a as f64, size_b as f64);
                (wa * d_a + wb * d_b) / (wa + wb)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveCluster {
    node: NodeRef,
    size: usize,
    leaf_sum: u64,
    min_leaf: usize,
}

/// Total order over candidate merges.
///
/// Closest first; ties go to the pair with the lower combined leaf-index
/// sum, then to the pair holding the lowest leaf. Clusters partition the
/// leaves, so the smallest leaves of two different clusters always differ
/// and the order is total.
#[derive(Debug, Clone, Copy)]
struct PairKey {
    distance: f64,
    leaf_sum: u64,
    low: usize,
    high: usize,
}

impl PairKey {
    fn new(distance: f64, a: &ActiveCluster, b: &ActiveCluster) -> Self {
        Self {
            distance,
            leaf_sum: a.leaf_sum + b.leaf_sum,
            low: a.min_leaf.min(b.min_leaf),
            high: a.min_leaf.max(b.min_leaf),
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.leaf_sum.cmp(&other.leaf_sum))
            .then(self.low.cmp(&other.low))
            .then(self.high.cmp(&other.high))
    }
}

/// Naive dense agglomerative hierarchical clustering.
///
/// Each step merges the closest pair of active clusters and rewrites the
/// distances of the merged cluster into the slot of its first member,
/// using the configured [`Linkage`]. A nearest neighbour is cached per
/// cluster and only rescanned when it was one of the merged clusters,
/// which keeps the usual cost at O(n²).
#[derive(Debug, Clone, Copy)]
pub struct AgglomerativeClusterer {
    linkage: Linkage,
}

impl AgglomerativeClusterer {
    pub fn new(linkage: Linkage) -> Self {
        Self { linkage }
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Clusters the rows of `matrix`, consuming it as working storage.
    ///
    /// Keep a clone beforehand if the original distances are needed later.
    pub fn cluster(
        &self,
        mut matrix: ChunkedSymmetricMatrix,
        progress: &impl ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<MergeTree> {
        let start = Instant::now();
        let n = matrix.size();
        let mut nodes: Vec<MergeNode> = Vec::with_capacity(n.saturating_sub(1));
        if n < 2 {
            return Ok(MergeTree::new_unchecked(n, nodes));
        }
        info!("Clustering {} rows with {:?} linkage", n, self.linkage);
        progress.start_stage(Stage::Clustering, (n - 1) as u64);

        let mut clusters: Vec<Option<ActiveCluster>> = (0..n)
            .map(|i| {
                Some(ActiveCluster {
                    node: NodeRef::Leaf(i),
                    size: 1,
                    leaf_sum: i as u64,
                    min_leaf: i,
                })
            })
            .collect();
        let mut nearest: Vec<Option<(usize, PairKey)>> = (0..n)
            .map(|i| find_nearest(&matrix, &clusters, i))
            .collect();

        for k in 0..(n - 1) {
            cancel.check()?;

            let (a, b, key) = nearest
                .iter()
                .enumerate()
                .filter_map(|(i, x)| x.map(|(j, key)| (i, j, key)))
                .min_by(|x, y| x.2.cmp(&y.2))
                .expect("At least two active clusters remain while merging");

            let ca = clusters[a].expect("Merged cluster must be active");
            let cb = clusters[b].expect("Merged cluster must be active");
            let (first, second) = if ca.min_leaf < cb.min_leaf {
                (ca, cb)
            } else {
                (cb, ca)
            };
            nodes.push(MergeNode {
                left: first.node,
                right: second.node,
                distance: key.distance,
                size: ca.size + cb.size,
            });

            // The merged cluster lives on in slot `a`.
            clusters[b] = None;
            nearest[b] = None;
            for other in 0..n {
                if other == a || clusters[other].is_none() {
                    continue;
                }
                let merged = self.linkage.combine(
                    matrix.get(a, other),
                    matrix.get(b, other),
                    ca.size,
                    cb.size,
                );
                matrix.set(a, other, merged);
            }
            clusters[a] = Some(ActiveCluster {
                node: NodeRef::Node(k),
                size: ca.size + cb.size,
                leaf_sum: ca.leaf_sum + cb.leaf_sum,
                min_leaf: first.min_leaf,
            });
            let merged_cluster = clusters[a].expect("Just assigned");

            for other in 0..n {
                let Some(other_cluster) = clusters[other] else {
                    continue;
                };
                if other == a {
                    continue;
                }
                match nearest[other] {
                    Some((target, _)) if target == a || target == b => {
                        nearest[other] = find_nearest(&matrix, &clusters, other);
                    }
                    Some((target, current)) => {
                        let candidate =
                            PairKey::new(matrix.get(other, a), &other_cluster, &merged_cluster);
                        if candidate.cmp(&current) == Ordering::Less {
                            nearest[other] = Some((a, candidate));
                        } else {
                            nearest[other] = Some((target, current));
                        }
                    }
                    None => {
                        nearest[other] = find_nearest(&matrix, &clusters, other);
                    }
                }
            }
            nearest[a] = find_nearest(&matrix, &clusters, a);

            progress.advance(1);
        }

        progress.finish_stage(Stage::Clustering);
        debug!(
            "Root merge distance: {:?}",
            nodes.last().map(|x| x.distance)
        );
        info!("Clustering finished in {:?}", start.elapsed());
        Ok(MergeTree::new_unchecked(n, nodes))
    }
}

fn find_nearest(
    matrix: &ChunkedSymmetricMatrix,
    clusters: &[Option<ActiveCluster>],
    i: usize,
) -> Option<(usize, PairKey)> {
    let this = clusters[i]?;
    let mut best: Option<(usize, PairKey)> = None;
    for (j, other) in clusters.iter().enumerate() {
        let Some(other) = other else {
            continue;
        };
        if j == i {
            continue;
        }
        let key = PairKey::new(matrix.get(i, j), &this, other);
        match best {
            Some((_, current)) if key.cmp(&current) != Ordering::Less => {}
            _ => best = Some((j, key)),
        }
    }
    best
}
