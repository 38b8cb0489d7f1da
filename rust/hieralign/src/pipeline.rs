//! End to end hierarchical alignment.
//!
//! The stages run strictly in order on the calling thread:
//!
//! 1. **Input checks**: parameters, then one list per sample.
//! 2. **Distance matrix**: every pair of rows is scored (parallel, in blocks).
//! 3. **Clustering**: agglomerative merge of the matrix into a merge tree.
//! 4. **Tree cut**: the tree is split into clusters with at most one row per
//!    sample and all pairwise distances within tolerance.
//! 5. **Alignment**: each cluster becomes one aligned row.
//!
//! Stages 2 to 4 check the cancellation token as they go. A canceled or
//! failed run returns an error and never a partial list.

use std::collections::HashSet;
use std::time::{
    Instant,
    SystemTime,
    UNIX_EPOCH,
};
use tracing::info;

use crate::alignment::{
    AlignmentBuilder,
    flatten_lists,
};
use crate::clustering::{
    AgglomerativeClusterer,
    ClusterTreeValidator,
    LeafSet,
    MergeTree,
    RescoringDistances,
};
use crate::errors::{
    AlignmentError,
    DataProcessingError,
    Result,
};
use crate::matrix::DistanceMatrixBuilder;
use crate::models::{
    AlignedFeatureList,
    AlignmentParameters,
    FeatureList,
    Provenance,
    Sample,
    ValidationDistance,
};
use crate::progress::{
    CancellationToken,
    ProgressSink,
};
use crate::scoring::RowSimilarityScorer;

pub const MODULE_NAME: &str = "Hierarchical aligner";

/// Everything an alignment run produces.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    pub aligned: AlignedFeatureList,
    /// Merge tree over the global row indices.
    pub tree: MergeTree,
    /// Accepted clusters, in the order the tree cut produced them.
    pub leaf_sets: Vec<LeafSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub input_rows: usize,
    pub aligned_rows: usize,
    pub singletons: usize,
    pub complete_rows: usize,
}

impl AlignmentResult {
    pub fn summary(&self) -> AlignmentSummary {
        let sample_count = self.aligned.samples.len();
        AlignmentSummary {
            input_rows: self.leaf_sets.iter().map(|x| x.len()).sum(),
            aligned_rows: self.aligned.len(),
            singletons: self.leaf_sets.iter().filter(|x| x.len() == 1).count(),
            complete_rows: self
                .aligned
                .rows
                .iter()
                .filter(|x| x.member_count() == sample_count)
                .count(),
        }
    }
}

/// Checks that no sample contributes more than one list.
pub fn check_unique_samples(lists: &[FeatureList]) -> Result<()> {
    let mut seen: HashSet<&Sample> = HashSet::with_capacity(lists.len());
    for list in lists {
        if !seen.insert(&list.sample) {
            return Err(AlignmentError::DuplicateSample {
                sample: list.sample.name.clone(),
            });
        }
    }
    Ok(())
}

/// Checks that every row and spectrum point carries finite values.
///
/// A NaN coordinate would compare as "not outside" every window, so these
/// rows are refused before anything is scored.
pub fn check_finite_rows(lists: &[FeatureList]) -> Result<()> {
    for list in lists {
        for row in list.rows.iter() {
            let finite_spectrum = row
                .spectrum
                .iter()
                .all(|p| p.mz.is_finite() && p.intensity.is_finite());
            if !(row.mz.is_finite() && row.rt.is_finite() && finite_spectrum) {
                return Err(DataProcessingError::ExpectedFiniteNonNanData {
                    context: format!(
                        "row {} of sample '{}' (mz {}, rt {})",
                        row.id, list.sample.name, row.mz, row.rt
                    ),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Checks that the leaf sets cover `0..n_rows` exactly once.
pub fn check_partition(leaf_sets: &[LeafSet], n_rows: usize) -> Result<()> {
    let mut seen = vec![false; n_rows];
    for leaf in leaf_sets.iter().flat_map(|x| x.iter()) {
        match seen.get_mut(*leaf) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(DataProcessingError::InvalidPartition {
                    context: format!("row {} is in more than one cluster", leaf),
                }
                .into());
            }
            None => {
                return Err(DataProcessingError::IndexOutOfBounds {
                    index: *leaf,
                    len: n_rows,
                    context: "tree cut".to_string(),
                }
                .into());
            }
        }
    }
    let covered = seen.iter().filter(|x| **x).count();
    if covered != n_rows {
        return Err(DataProcessingError::InvalidPartition {
            context: format!("covered {} of {} rows", covered, n_rows),
        }
        .into());
    }
    Ok(())
}

/// Aligns feature lists with hierarchical clustering.
///
/// Example:
/// ```
/// use hieralign::{AlignmentParameters, CancellationToken, HierarchicalAligner};
/// use hieralign::models::{FeatureList, FeatureRow, Sample};
///
/// let lists = vec![
///     FeatureList::new(
///         Sample::new("run_1"),
///         vec![FeatureRow::new(1, 180.06, 5.2).with_spectrum([(180.0, 100.0)])],
///     ),
///     FeatureList::new(
///         Sample::new("run_2"),
///         vec![FeatureRow::new(1, 180.07, 5.25).with_spectrum([(180.0, 80.0)])],
///     ),
/// ];
/// let aligner = HierarchicalAligner::new(AlignmentParameters::default()).unwrap();
/// let result = aligner.align(&lists, &(), &CancellationToken::new()).unwrap();
/// assert_eq!(result.aligned.len(), 1);
/// assert_eq!(result.aligned.rows[0].member_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct HierarchicalAligner {
    params: AlignmentParameters,
    scorer: RowSimilarityScorer,
}

impl HierarchicalAligner {
    /// Fails with [`AlignmentError::Configuration`] on unusable parameters.
    pub fn new(params: AlignmentParameters) -> Result<Self> {
        params.validate()?;
        let scorer = RowSimilarityScorer::new(&params);
        Ok(Self { params, scorer })
    }

    pub fn parameters(&self) -> &AlignmentParameters {
        &self.params
    }

    pub fn scorer(&self) -> &RowSimilarityScorer {
        &self.scorer
    }

    pub fn align(
        &self,
        lists: &[FeatureList],
        progress: &impl ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<AlignmentResult> {
        let start = Instant::now();
        check_unique_samples(lists)?;
        check_finite_rows(lists)?;
        let samples: Vec<Sample> = lists.iter().map(|l| l.sample.clone()).collect();
        let rows = self.scorer.prepare_rows(lists);
        info!(
            "Aligning {} rows from {} samples",
            rows.len(),
            samples.len()
        );

        let matrix = DistanceMatrixBuilder::new(&self.scorer)
            .with_block_size(self.params.block_size)
            .with_chunk_len(self.params.matrix_chunk_len)
            .build(&rows, progress, cancel)?;

        let snapshot = match self.params.validation_distance {
            ValidationDistance::MatrixSnapshot => Some(matrix.clone()),
            ValidationDistance::Rescore => None,
        };
        let tree = AgglomerativeClusterer::new(self.params.linkage).cluster(matrix, progress, cancel)?;

        let validator = ClusterTreeValidator::new(
            samples.len(),
            self.params.effective_distance_tolerance(),
        );
        let leaf_sets = match snapshot {
            Some(ref snapshot) => validator.validate(&tree, snapshot, progress, cancel)?,
            None => validator.validate(
                &tree,
                &RescoringDistances {
                    scorer: &self.scorer,
                    rows: &rows,
                },
                progress,
                cancel,
            )?,
        };
        drop(snapshot);

        check_partition(&leaf_sets, rows.len())?;

        cancel.check()?;
        let flat_rows = flatten_lists(lists);
        let aligned_rows =
            AlignmentBuilder::new(&self.scorer).build(&leaf_sets, &flat_rows, &samples, progress)?;

        let aligned = AlignedFeatureList {
            name: self.params.aligned_list_name.clone(),
            samples,
            rows: aligned_rows,
            provenance: Provenance {
                module: MODULE_NAME.to_string(),
                parameters: self.params.clone(),
                timestamp_secs: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|x| x.as_secs())
                    .unwrap_or(0),
            },
        };
        let result = AlignmentResult {
            aligned,
            tree,
            leaf_sets,
        };
        let summary = result.summary();
        info!(
            "Aligned {} rows into {} aligned rows ({} singletons, {} complete) in {:?}",
            summary.input_rows,
            summary.aligned_rows,
            summary.singletons,
            summary.complete_rows,
            start.elapsed()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureRow;
    use crate::progress::testing::RecordingSink;
    use crate::progress::Stage;

    fn species(id: u32, mz: f64, rt: f64) -> FeatureRow {
        FeatureRow::new(id, mz, rt).with_spectrum([(mz, 100.0), (mz - 18.0, 30.0)])
    }

    #[test]
    fn test_duplicate_sample_rejected_before_scoring() {
        let lists = vec![
            FeatureList::new(Sample::new("a"), vec![species(1, 200.0, 3.0)]),
            FeatureList::new(Sample::new("a"), vec![species(1, 200.0, 3.0)]),
        ];
        let sink = RecordingSink::default();
        let aligner = HierarchicalAligner::new(AlignmentParameters::default()).unwrap();
        let err = aligner
            .align(&lists, &sink, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, AlignmentError::DuplicateSample { .. }));
        assert!(sink.stages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_nan_rt_rejected_before_scoring() {
        let lists = vec![
            FeatureList::new(Sample::new("a"), vec![species(1, 200.0, f64::NAN)]),
            FeatureList::new(Sample::new("b"), vec![species(1, 200.0, 10.0)]),
        ];
        let sink = RecordingSink::default();
        let err = HierarchicalAligner::new(AlignmentParameters::default())
            .unwrap()
            .align(&lists, &sink, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AlignmentError::DataProcessing(DataProcessingError::ExpectedFiniteNonNanData { .. })
        ));
        assert!(sink.stages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_infinite_intensity_rejected() {
        let lists = vec![FeatureList::new(
            Sample::new("a"),
            vec![FeatureRow::new(1, 200.0, 3.0).with_spectrum([(200.0, f32::INFINITY)])],
        )];
        assert!(check_finite_rows(&lists).is_err());
    }

    #[test]
    fn test_partition_check() {
        let sets = vec![LeafSet(vec![0, 2]), LeafSet(vec![1])];
        assert!(check_partition(&sets, 3).is_ok());
        assert!(check_partition(&[], 0).is_ok());

        // Missing row.
        let err = check_partition(&sets[..1], 3).unwrap_err();
        assert!(matches!(
            err,
            AlignmentError::DataProcessing(DataProcessingError::InvalidPartition { .. })
        ));
        // Row in two clusters.
        let twice = vec![LeafSet(vec![0, 1]), LeafSet(vec![1, 2])];
        assert!(check_partition(&twice, 3).is_err());
        // Leaf past the row count.
        let beyond = vec![LeafSet(vec![0, 1, 2, 3])];
        assert!(check_partition(&beyond, 3).is_err());
    }

    #[test]
    fn test_stages_reported_in_order() {
        let lists = vec![
            FeatureList::new(
                Sample::new("a"),
                vec![species(1, 200.0, 3.0), species(2, 300.0, 6.0)],
            ),
            FeatureList::new(Sample::new("b"), vec![species(1, 200.1, 3.1)]),
        ];
        let sink = RecordingSink::default();
        let aligner = HierarchicalAligner::new(AlignmentParameters::default()).unwrap();
        let result = aligner
            .align(&lists, &sink, &CancellationToken::new())
            .unwrap();
        let stages: Vec<Stage> = sink.stages.lock().unwrap().iter().map(|x| x.0).collect();
        assert_eq!(
            stages,
            vec![
                Stage::DistanceMatrix,
                Stage::Clustering,
                Stage::Validation,
                Stage::Alignment
            ]
        );
        let summary = result.summary();
        assert_eq!(summary.input_rows, 3);
        assert_eq!(summary.aligned_rows, 2);
        assert_eq!(summary.complete_rows, 1);
        assert_eq!(summary.singletons, 1);
        assert_eq!(result.aligned.provenance.module, MODULE_NAME);
    }

    #[test]
    fn test_rescoring_matches_snapshot() {
        let lists: Vec<FeatureList> = (0..4)
            .map(|s| {
                let drift = s as f64 * 0.07;
                FeatureList::new(
                    Sample::new(format!("s{}", s)),
                    vec![
                        species(1, 150.0 + drift * 0.1, 2.0 + drift),
                        species(2, 250.0, 8.0 - drift),
                        species(3, 251.0, 8.1 + drift),
                    ],
                )
            })
            .collect();
        let snapshot = HierarchicalAligner::new(AlignmentParameters::default())
            .unwrap()
            .align(&lists, &(), &CancellationToken::new())
            .unwrap();
        let rescored = HierarchicalAligner::new(AlignmentParameters {
            validation_distance: ValidationDistance::Rescore,
            ..Default::default()
        })
        .unwrap()
        .align(&lists, &(), &CancellationToken::new())
        .unwrap();
        assert_eq!(snapshot.leaf_sets, rescored.leaf_sets);
    }
}
