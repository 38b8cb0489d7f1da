use tracing::debug;

use crate::clustering::LeafSet;
use crate::errors::{
    AlignmentError,
    Result,
};
use crate::models::{
    AlignedFeatureRow,
    FeatureList,
    FeatureRow,
    Sample,
};
use crate::progress::{
    ProgressSink,
    Stage,
};
use crate::scoring::{
    ClusterProfile,
    RowSimilarityScorer,
    ScoringRow,
};

/// A feature row together with the sample column it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SampleRow<'a> {
    pub sample: usize,
    pub row: &'a FeatureRow,
}

/// Flattens the lists in input order; the position of a row in the output is
/// its global row index.
pub fn flatten_lists(lists: &[FeatureList]) -> Vec<SampleRow<'_>> {
    lists
        .iter()
        .enumerate()
        .flat_map(|(sample, list)| list.rows.iter().map(move |row| SampleRow { sample, row }))
        .collect()
}

/// Turns accepted leaf sets into aligned rows.
pub struct AlignmentBuilder<'a> {
    scorer: &'a RowSimilarityScorer,
}

impl<'a> AlignmentBuilder<'a> {
    pub fn new(scorer: &'a RowSimilarityScorer) -> Self {
        Self { scorer }
    }

    /// Builds one aligned row per leaf set.
    ///
    /// Fails with [`AlignmentError::DuplicateSampleInCluster`] when a leaf set
    /// holds two rows of the same sample, which means the tree cut is broken.
    ///
    /// Rows come out sorted by m/z, then RT; ids follow the leaf set order.
    pub fn build(
        &self,
        leaf_sets: &[LeafSet],
        rows: &[SampleRow<'_>],
        samples: &[Sample],
        progress: &impl ProgressSink,
    ) -> Result<Vec<AlignedFeatureRow>> {
        progress.start_stage(Stage::Alignment, leaf_sets.len() as u64);
        let mut out = Vec::with_capacity(leaf_sets.len());
        for (cluster, leaf_set) in leaf_sets.iter().enumerate() {
            let mut aligned = AlignedFeatureRow::new((cluster + 1) as u32, samples.len());
            for &leaf in leaf_set.iter() {
                let SampleRow { sample, row } = rows[leaf];
                let slot = &mut aligned.features[sample];
                if slot.is_some() {
                    return Err(AlignmentError::DuplicateSampleInCluster {
                        sample: samples[sample].name.clone(),
                        cluster,
                    });
                }
                *slot = Some(row.clone());

                for identity in row.identities.iter() {
                    if !aligned.identities.contains(identity) {
                        aligned.identities.push(identity.clone());
                    }
                }
                if aligned.preferred_identity.is_none() {
                    aligned.preferred_identity = row.preferred_identity.clone();
                }
            }
            out.push(aligned);
            progress.advance(1);
        }

        // Summary values only once every cluster is final.
        for aligned in out.iter_mut() {
            self.finalize_row(aligned);
        }
        out.sort_by(|a, b| {
            a.mz.total_cmp(&b.mz)
                .then(a.rt.total_cmp(&b.rt))
                .then(a.id.cmp(&b.id))
        });

        progress.finish_stage(Stage::Alignment);
        debug!("Built {} aligned rows", out.len());
        Ok(out)
    }

    fn finalize_row(&self, aligned: &mut AlignedFeatureRow) {
        let n_bins = self.scorer.max_mz_bins();
        let count = aligned.member_count();
        if count == 0 {
            return;
        }

        let profile = ClusterProfile::from_members(aligned.members(), n_bins);
        let consensus: f64 = aligned
            .features
            .iter()
            .enumerate()
            .filter_map(|(sample, x)| x.as_ref().map(|row| (sample, row)))
            .map(|(sample, row)| {
                let srow = ScoringRow::new(sample, sample, row, n_bins);
                self.scorer.score_against_profile(&srow, &profile)
            })
            .sum();

        aligned.mz = profile.mz;
        aligned.rt = profile.rt;
        aligned.consensus_score = consensus / count as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AlignmentParameters,
        PeakIdentity,
    };

    fn lists() -> Vec<FeatureList> {
        vec![
            FeatureList::new(
                Sample::new("a"),
                vec![
                    FeatureRow::new(1, 300.0, 10.0)
                        .with_spectrum([(100.0, 1.0)])
                        .with_identity(PeakIdentity::named("caffeine")),
                    FeatureRow::new(2, 150.0, 4.0).with_spectrum([(75.0, 1.0)]),
                ],
            ),
            FeatureList::new(
                Sample::new("b"),
                vec![FeatureRow::new(1, 300.2, 10.4)
                    .with_spectrum([(100.0, 1.0)])
                    .with_identity(PeakIdentity::named("theine"))
                    .with_identity(PeakIdentity::named("caffeine"))],
            ),
        ]
    }

    #[test]
    fn test_build_fills_slots_and_summaries() {
        let lists = lists();
        let samples: Vec<Sample> = lists.iter().map(|l| l.sample.clone()).collect();
        let rows = flatten_lists(&lists);
        let scorer = RowSimilarityScorer::new(&AlignmentParameters::default());
        let leaf_sets = vec![LeafSet(vec![2, 0]), LeafSet(vec![1])];

        let out = AlignmentBuilder::new(&scorer)
            .build(&leaf_sets, &rows, &samples, &())
            .unwrap();
        assert_eq!(out.len(), 2);

        // Sorted by m/z: the singleton (150) comes first, ids keep leaf set order.
        assert_eq!(out[0].id, 2);
        assert_eq!(out[0].member_count(), 1);
        assert_eq!(out[0].rt, 4.0);

        let pair = &out[1];
        assert_eq!(pair.id, 1);
        assert_eq!(pair.features[0].as_ref().unwrap().id, 1);
        assert_eq!(pair.features[1].as_ref().unwrap().mz, 300.2);
        assert!((pair.rt - 10.2).abs() < 1e-12);
        assert!((pair.mz - 300.1).abs() < 1e-12);
        // Leaf set order: sample b's row comes first.
        assert_eq!(
            pair.preferred_identity,
            Some(PeakIdentity::named("theine"))
        );
        assert_eq!(
            pair.identities,
            vec![PeakIdentity::named("theine"), PeakIdentity::named("caffeine")]
        );
        assert!(pair.consensus_score > 1.5 && pair.consensus_score <= 2.0);
    }

    #[test]
    fn test_duplicate_sample_in_cluster_is_an_error() {
        let lists = lists();
        let samples: Vec<Sample> = lists.iter().map(|l| l.sample.clone()).collect();
        let rows = flatten_lists(&lists);
        let scorer = RowSimilarityScorer::new(&AlignmentParameters::default());
        let err = AlignmentBuilder::new(&scorer)
            .build(&[LeafSet(vec![0, 1]), LeafSet(vec![2])], &rows, &samples, &())
            .unwrap_err();
        match err {
            AlignmentError::DuplicateSampleInCluster { sample, cluster } => {
                assert_eq!(sample, "a");
                assert_eq!(cluster, 0);
            }
            other => panic!("Unexpected error {:?}", other),
        }
    }
}
