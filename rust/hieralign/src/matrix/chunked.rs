use crate::errors::DataProcessingError;
use crate::models::parameters::DEFAULT_MATRIX_CHUNK_LEN;

/// Number of cells in the lower triangle (diagonal included) of rows `0..k`.
#[inline]
fn triangular(k: usize) -> usize {
    k * (k + 1) / 2
}

/// Dense symmetric `n x n` matrix of `f64` storing only one triangle.
///
/// The `n(n+1)/2` values are spread over fixed-size chunks, so no single
/// allocation has to hold the whole matrix. Callers address cells by
/// `(i, j)` and never see chunk boundaries.
///
/// Cloning makes a full deep copy.
///
/// # Example
///
/// ```
/// use hieralign::matrix::ChunkedSymmetricMatrix;
///
/// let mut mat = ChunkedSymmetricMatrix::with_chunk_len(4, 3).unwrap();
/// mat.set(3, 1, 2.5);
/// assert_eq!(mat.get(1, 3), 2.5);
/// assert_eq!(mat.num_chunks(), 4); // 10 cells in chunks of 3
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkedSymmetricMatrix {
    size: usize,
    chunk_len: usize,
    chunks: Vec<Vec<f64>>,
}

impl ChunkedSymmetricMatrix {
    /// A zero-filled matrix using the default (1 GiB) chunks.
    pub fn new(size: usize) -> Result<Self, DataProcessingError> {
        Self::with_chunk_len(size, DEFAULT_MATRIX_CHUNK_LEN)
    }

    pub fn with_chunk_len(size: usize, chunk_len: usize) -> Result<Self, DataProcessingError> {
        if chunk_len == 0 {
            return Err(DataProcessingError::InvalidChunkLength { chunk_len });
        }
        let num_cells = size
            .checked_add(1)
            .and_then(|x| x.checked_mul(size))
            .map(|x| x / 2)
            .ok_or(DataProcessingError::MatrixTooLarge { size })?;

        let num_chunks = num_cells.div_ceil(chunk_len);
        let chunks = (0..num_chunks)
            .map(|i| {
                let len = chunk_len.min(num_cells - i * chunk_len);
                vec![0.0; len]
            })
            .collect();

        Ok(Self {
            size,
            chunk_len,
            chunks,
        })
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of stored cells, `n(n+1)/2`.
    pub fn num_cells(&self) -> usize {
        triangular(self.size)
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    fn locate(&self, i: usize, j: usize) -> (usize, usize) {
        assert!(
            i < self.size && j < self.size,
            "Index ({}, {}) out of bounds for a matrix of size {}",
            i,
            j,
            self.size
        );
        let flat = triangular(i.max(j)) + i.min(j);
        (flat / self.chunk_len, flat % self.chunk_len)
    }

    /// # Panics
    /// Panics if `i` or `j` is not smaller than [`size`](Self::size).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (chunk, offset) = self.locate(i, j);
        self.chunks[chunk][offset]
    }

    /// Sets both `(i, j)` and `(j, i)`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is not smaller than [`size`](Self::size).
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let (chunk, offset) = self.locate(i, j);
        self.chunks[chunk][offset] = value;
    }

    /// Writes `values[j]` to `(row, j)` for `j in 0..values.len()`.
    ///
    /// Used to store one row of the lower triangle at once.
    pub fn set_lower_row(&mut self, row: usize, values: &[f64]) -> Result<(), DataProcessingError> {
        if row >= self.size {
            return Err(DataProcessingError::IndexOutOfBounds {
                index: row,
                len: self.size,
                context: "set_lower_row".to_string(),
            });
        }
        if values.len() > row + 1 {
            return Err(DataProcessingError::ExpectedSlicesSameLength {
                expected: row + 1,
                other: values.len(),
                context: "set_lower_row".to_string(),
            });
        }
        for (j, &v) in values.iter().enumerate() {
            self.set(row, j, v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cell_is_independent() {
        let n = 9;
        let mut mat = ChunkedSymmetricMatrix::with_chunk_len(n, 7).unwrap();
        assert_eq!(mat.num_cells(), 45);
        assert_eq!(mat.num_chunks(), 7);

        for i in 0..n {
            for j in 0..=i {
                mat.set(i, j, (i * 100 + j) as f64);
            }
        }
        for i in 0..n {
            for j in 0..n {
                let (hi, lo) = (i.max(j), i.min(j));
                assert_eq!(mat.get(i, j), (hi * 100 + lo) as f64);
            }
        }
    }

    #[test]
    fn test_chunk_sizes_cover_cells_exactly() {
        let mat = ChunkedSymmetricMatrix::with_chunk_len(10, 8).unwrap();
        let total: usize = mat.chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, 55);
        assert_eq!(mat.chunks.last().unwrap().len(), 55 - 6 * 8);
    }

    #[test]
    fn test_empty_matrix() {
        let mat = ChunkedSymmetricMatrix::new(0).unwrap();
        assert_eq!(mat.num_cells(), 0);
        assert_eq!(mat.num_chunks(), 0);
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(matches!(
            ChunkedSymmetricMatrix::with_chunk_len(3, 0),
            Err(DataProcessingError::InvalidChunkLength { .. })
        ));
        assert!(matches!(
            ChunkedSymmetricMatrix::new(usize::MAX),
            Err(DataProcessingError::MatrixTooLarge { .. })
        ));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut mat = ChunkedSymmetricMatrix::with_chunk_len(3, 2).unwrap();
        mat.set(2, 0, 1.0);
        let snapshot = mat.clone();
        mat.set(2, 0, 5.0);
        assert_eq!(snapshot.get(0, 2), 1.0);
        assert_eq!(mat.get(0, 2), 5.0);
    }

    #[test]
    fn test_set_lower_row() {
        let mut mat = ChunkedSymmetricMatrix::with_chunk_len(3, 4).unwrap();
        mat.set_lower_row(2, &[1.0, 2.0, 0.0]).unwrap();
        assert_eq!(mat.get(0, 2), 1.0);
        assert_eq!(mat.get(2, 1), 2.0);
        assert!(mat.set_lower_row(1, &[1.0, 2.0, 3.0]).is_err());
        assert!(mat.set_lower_row(3, &[]).is_err());
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics() {
        let mat = ChunkedSymmetricMatrix::new(2).unwrap();
        mat.get(2, 0);
    }
}
