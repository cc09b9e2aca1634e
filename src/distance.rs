//! Pairwise dissimilarity between interval vectors.

use std::{fmt, str::FromStr};

use rayon::prelude::*;

use crate::{
    bbv::{IntervalVector, VectorSet},
    dense::dense_matrix,
    input::VecVectorStore,
    Error,
};

/// Metric used to compute the dissimilarity between two interval vectors.
///
/// Both metrics compute the same manhattan distance; they differ only in representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Metric {
    /// Manhattan distance over dense rows.
    ///
    /// This materializes an `N x (max_id + 1)` matrix, which may be very large if block ids are
    /// sparse.
    #[default]
    DenseManhattan,
    /// Symmetric difference computed directly over sparse vectors.
    ///
    /// Cost is proportional to the number of non-zero entries in each pair.
    SparseSymmetric,
}

impl Metric {
    /// Return an iterator over all metrics.
    pub fn all() -> impl ExactSizeIterator<Item = Metric> {
        [Metric::DenseManhattan, Metric::SparseSymmetric].into_iter()
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dense_manhattan" | "dense" | "manhattan" => Ok(Metric::DenseManhattan),
            "sparse_symmetric" | "sparse" => Ok(Metric::SparseSymmetric),
            x => Err(Error::InvalidArgument(format!("unknown metric {x}"))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::DenseManhattan => write!(f, "dense_manhattan"),
            Metric::SparseSymmetric => write!(f, "sparse_symmetric"),
        }
    }
}

/// Manhattan distance between two dense vectors of the same length.
pub fn manhattan(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Squared euclidean distance between two vectors of the same length.
#[cfg(feature = "simsimd")]
pub fn l2sq(a: &[f64], b: &[f64]) -> f64 {
    simsimd::SpatialSimilarity::l2sq(a, b).expect("same dimensions")
}

/// Squared euclidean distance between two vectors of the same length.
#[cfg(not(feature = "simsimd"))]
pub fn l2sq(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let delta = x - y;
            delta * delta
        })
        .sum()
}

/// Euclidean distance between two vectors of the same length.
pub fn l2(a: &[f64], b: &[f64]) -> f64 {
    l2sq(a, b).sqrt()
}

/// Manhattan distance between two sparse vectors, treating absent ids as zero.
///
/// Ids present in only one vector contribute that vector's value; ids present in both contribute
/// the absolute difference.
pub fn sparse_symmetric(x: &IntervalVector, y: &IntervalVector) -> f64 {
    let mut xi = x.iter().peekable();
    let mut yi = y.iter().peekable();
    let mut sum = 0.0;
    loop {
        match (xi.peek().copied(), yi.peek().copied()) {
            (Some((xk, xv)), Some((yk, yv))) => {
                if xk < yk {
                    sum += xv;
                    xi.next();
                } else if yk < xk {
                    sum += yv;
                    yi.next();
                } else {
                    sum += (xv - yv).abs();
                    xi.next();
                    yi.next();
                }
            }
            (Some((_, xv)), None) => {
                sum += xv;
                xi.next();
            }
            (None, Some((_, yv))) => {
                sum += yv;
                yi.next();
            }
            (None, None) => break,
        }
    }
    sum
}

/// Symmetric `N x N` matrix of pairwise distances with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DissimilarityMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DissimilarityMatrix {
    /// Create an all-zero `n x n` matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Set both `(i, j)` and `(j, i)` to `d`.
    pub fn set_symmetric(&mut self, i: usize, j: usize, d: f64) {
        self.data[i * self.n + j] = d;
        self.data[j * self.n + i] = d;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> {
        self.data.chunks_exact(self.n.max(1)).take(self.n)
    }

    /// Minimum and maximum entries, or `None` if the matrix is empty.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.data.iter().copied().fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
    }

    /// Fill the upper triangle from per-row distances and mirror it.
    ///
    /// `upper[i]` holds distances from `i` to each `j > i`.
    fn from_upper_rows(n: usize, upper: Vec<Vec<f64>>) -> Self {
        let mut matrix = Self::zeros(n);
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, d) in row.into_iter().enumerate() {
                matrix.set_symmetric(i, i + 1 + offset, d);
            }
        }
        matrix
    }
}

/// Compute all pairwise distances between `vectors` using `metric`.
///
/// `progress` is called once for each completed row. [`Metric::DenseManhattan`] fails with
/// [`Error::DenseTooLarge`] if block ids are too large to densify.
pub fn dissimilarity_matrix<P>(
    vectors: &VectorSet,
    metric: Metric,
    progress: P,
) -> crate::Result<DissimilarityMatrix>
where
    P: Fn() + Send + Sync,
{
    let n = vectors.len();
    let upper = match metric {
        Metric::DenseManhattan => {
            let dense = dense_matrix(vectors)?;
            upper_rows(n, &progress, |i, j| dense_manhattan(&dense, i, j))
        }
        Metric::SparseSymmetric => upper_rows(n, &progress, |i, j| {
            sparse_symmetric(&vectors[i], &vectors[j])
        }),
    };
    Ok(DissimilarityMatrix::from_upper_rows(n, upper))
}

/// Compute the distance from each row `i` to every `j > i`.
fn upper_rows<D, P>(n: usize, progress: &P, distance: D) -> Vec<Vec<f64>>
where
    D: Fn(usize, usize) -> f64 + Send + Sync,
    P: Fn() + Send + Sync,
{
    (0..n)
        .into_par_iter()
        .map(|i| {
            let row = ((i + 1)..n).map(|j| distance(i, j)).collect::<Vec<_>>();
            progress();
            row
        })
        .collect()
}

/// Manhattan distance between rows `i` and `j` of a dense interval matrix.
pub fn dense_manhattan(dense: &VecVectorStore<f64>, i: usize, j: usize) -> f64 {
    manhattan(&dense[i], &dense[j])
}
