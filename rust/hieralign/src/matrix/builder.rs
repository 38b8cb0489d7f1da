use rayon::prelude::*;
use std::time::Instant;
use tracing::{
    debug,
    info,
};

use super::ChunkedSymmetricMatrix;
use crate::errors::Result;
use crate::models::parameters::{
    DEFAULT_BLOCK_SIZE,
    DEFAULT_MATRIX_CHUNK_LEN,
};
use crate::progress::{
    CancellationToken,
    ProgressSink,
    Stage,
};
use crate::scoring::{
    RowSimilarityScorer,
    ScoringRow,
};

/// Fills a [`ChunkedSymmetricMatrix`] with the distance of every pair of rows.
///
/// Rows are processed in blocks. Inside a block every row computes its
/// slice of the lower triangle in parallel; the slices are then written by
/// the calling thread, so workers never touch the matrix. Cancellation is
/// checked and progress reported once per block.
pub struct DistanceMatrixBuilder<'a> {
    scorer: &'a RowSimilarityScorer,
    block_size: usize,
    chunk_len: usize,
}

impl<'a> DistanceMatrixBuilder<'a> {
    pub fn new(scorer: &'a RowSimilarityScorer) -> Self {
        Self {
            scorer,
            block_size: DEFAULT_BLOCK_SIZE,
            chunk_len: DEFAULT_MATRIX_CHUNK_LEN,
        }
    }

    pub fn with_block_size(self, block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
            ..self
        }
    }

    pub fn with_chunk_len(self, chunk_len: usize) -> Self {
        Self { chunk_len, ..self }
    }

    fn score_lower_row(&self, rows: &[ScoringRow], i: usize) -> Vec<f64> {
        let row = &rows[i];
        rows[..=i]
            .iter()
            .map(|other| self.scorer.distance(row, other))
            .collect()
    }

    pub fn build(
        &self,
        rows: &[ScoringRow],
        progress: &impl ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ChunkedSymmetricMatrix> {
        let start = Instant::now();
        let n = rows.len();
        let mut matrix = ChunkedSymmetricMatrix::with_chunk_len(n, self.chunk_len)?;
        info!(
            "Building distance matrix for {} rows ({} cells in {} chunks)",
            n,
            matrix.num_cells(),
            matrix.num_chunks()
        );
        progress.start_stage(Stage::DistanceMatrix, n as u64);

        let mut block_start = 0;
        while block_start < n {
            cancel.check()?;
            let block_end = (block_start + self.block_size).min(n);
            let block: Vec<Vec<f64>> = (block_start..block_end)
                .into_par_iter()
                .map(|i| self.score_lower_row(rows, i))
                .collect();

            for (i, values) in (block_start..block_end).zip(block.iter()) {
                matrix.set_lower_row(i, values)?;
            }
            progress.advance((block_end - block_start) as u64);
            debug!("Scored rows {}..{} of {}", block_start, block_end, n);
            block_start = block_end;
        }

        progress.finish_stage(Stage::DistanceMatrix);
        info!("Distance matrix built in {:?}", start.elapsed());
        Ok(matrix)
    }
}
