//! Directional NBLAST scoring for cloud pairs and cloud collections.

use std::ops::Index;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cloud::VectorCloud;
use crate::par::maybe_par_iter;
use crate::score_table::ScoreTable;

/// Raw directional NBLAST score of `query` against `target`.
///
/// Every query point is matched to its nearest target point, the
/// (distance, unsigned alignment) pair is looked up in `table`, and the raw
/// score is the sum over all query points. It is not averaged or normalized,
/// and it is asymmetric: `score(a, b, t)` and `score(b, a, t)` differ in
/// general, since matching runs from each cloud's own points and the clouds
/// may have different sizes and densities.
pub fn score(query: &VectorCloud, target: &VectorCloud, table: &ScoreTable) -> f32 {
    // Accumulated in f64 in point order, so the result is bit-identical no
    // matter how the surrounding batch is scheduled.
    let mut total = 0.0f64;
    for i in 0..query.num_points() {
        let m = query.nearest_match(target, i);
        total += f64::from(table.lookup(m.dist, m.dot));
    }
    total as f32
}

/// All ordered-pair directional scores over a collection of clouds.
///
/// `matrix[(i, j)]` is `score(&clouds[i], &clouds[j], table)`; the diagonal
/// holds self-scores, computed through the same path as every other pair.
/// Storage is flat row-major and immutable once built. Normalizing or
/// symmetrizing the matrix is left to callers.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    scores: Vec<f32>,
    size: usize,
}

impl ScoreMatrix {
    /// Score every ordered pair of `clouds`, the diagonal included.
    ///
    /// Rows are independent and computed in parallel when the `parallel`
    /// feature is enabled; the output is identical either way. An empty
    /// collection yields a 0x0 matrix.
    pub fn build(clouds: &[VectorCloud], table: &ScoreTable) -> Self {
        let size = clouds.len();
        let rows: Vec<Vec<f32>> = maybe_par_iter!(clouds)
            .map(|query| {
                clouds
                    .iter()
                    .map(|target| score(query, target, table))
                    .collect()
            })
            .collect();

        let mut scores = Vec::with_capacity(size * size);
        for row in rows {
            scores.extend(row);
        }
        debug_assert_eq!(scores.len(), size * size, "matrix fill mismatch");
        Self { scores, size }
    }

    /// Number of clouds, i.e. the matrix is `num_clouds() x num_clouds()`.
    #[inline]
    pub fn num_clouds(&self) -> usize {
        self.size
    }

    /// One score by (query row, target column).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self[(i, j)]
    }

    /// Row `i`: cloud i queried against every cloud, in cloud order.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.scores[i * self.size..(i + 1) * self.size]
    }

    /// The full matrix, flat row-major.
    #[inline]
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }
}

impl Index<(usize, usize)> for ScoreMatrix {
    type Output = f32;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f32 {
        assert!(j < self.size, "column {} out of bounds for size {}", j, self.size);
        &self.scores[i * self.size + j]
    }
}
