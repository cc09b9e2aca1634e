//! An implementation of k-means for clustering projected interval vectors.

use std::str::FromStr;

use rand::{distr::weighted::WeightedIndex, prelude::*, seq::index};
use rayon::prelude::*;

use crate::{
    distance::{l2, l2sq},
    input::{VecVectorStore, VectorStore},
    Error,
};

/// Centroid initialization method for k-means partitioning.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum InitializationMethod {
    /// Choose centers randomly from the data set.
    Random,
    /// Choose centers randomly from the data set weighted by squared distance to other centers.
    #[default]
    KMeansPlusPlus,
}

impl FromStr for InitializationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "kmeans++" | "k-means++" | "kmeanspp" => Ok(Self::KMeansPlusPlus),
            x => Err(Error::InvalidArgument(format!(
                "unknown initialization method {x}"
            ))),
        }
    }
}

/// Parameters for k-means partitioning.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// Maximum number of iterations to run before exiting, even if the centers have not converged.
    pub iters: usize,
    /// Number of candidate initializations; the one with the lowest total distance is kept.
    pub init_iters: usize,
    /// Convergence epsilon. Computation is considered to have converged if every centroid moved
    /// less than this distance in the last iteration.
    pub epsilon: f64,
    /// Algorithm for computing initial centroids.
    pub initialization: InitializationMethod,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            iters: 300,
            init_iters: 1,
            epsilon: 0.0001,
            initialization: InitializationMethod::KMeansPlusPlus,
        }
    }
}

/// Compute `k` centroids over `dataset` with Lloyd's algorithm.
///
/// Returns the computed centroids -- `Ok()` if the centroid computation converged and `Err()` if
/// we terminated by reaching max iterations.
///
/// *Panics* if `k` is zero or greater than the number of vectors in `dataset`.
pub fn kmeans(
    dataset: &VecVectorStore<f64>,
    k: usize,
    params: &Params,
    rng: &mut impl Rng,
) -> Result<VecVectorStore<f64>, VecVectorStore<f64>> {
    assert!(k > 0 && k <= dataset.len());

    let mut centroids = (0..params.init_iters.max(1))
        .map(|_| initialize_centroids(dataset, k, params.initialization, rng))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .expect("non-zero iters")
        .0;

    for _ in 0..params.iters {
        let new_centroids = update_centroids(dataset, &centroids);
        let centroid_distance_max = compute_centroid_distance_max(&centroids, &new_centroids);
        centroids = new_centroids;
        // Terminate if _every_ centroid distance is less than epsilon.
        if centroid_distance_max < params.epsilon {
            return Ok(centroids);
        }
    }

    Err(centroids)
}

/// Recompute each centroid as the mean of its assigned vectors.
///
/// A centroid with no assigned vectors keeps its previous position.
fn update_centroids(
    dataset: &VecVectorStore<f64>,
    centroids: &VecVectorStore<f64>,
) -> VecVectorStore<f64> {
    let mut sums = VecVectorStore::filled(centroids.elem_stride(), centroids.len(), 0.0);
    let mut counts = vec![0usize; centroids.len()];
    for (vector, (cluster, _)) in dataset
        .iter()
        .zip(compute_assignments(dataset, centroids).into_iter())
    {
        counts[cluster] += 1;
        for (s, v) in sums[cluster].iter_mut().zip(vector.iter()) {
            *s += *v;
        }
    }

    for (i, (sum, count)) in sums.iter_mut().zip(counts.iter()).enumerate() {
        if *count == 0 {
            sum.copy_from_slice(&centroids[i]);
        } else {
            for s in sum.iter_mut() {
                *s /= *count as f64;
            }
        }
    }
    sums
}

fn initialize_centroids(
    dataset: &VecVectorStore<f64>,
    k: usize,
    method: InitializationMethod,
    rng: &mut impl Rng,
) -> (VecVectorStore<f64>, f64) {
    let mut centroids = VecVectorStore::with_capacity(dataset.elem_stride(), k);
    let assignments = match method {
        InitializationMethod::Random => {
            for i in index::sample(rng, dataset.len(), k) {
                centroids.push(&dataset[i]);
            }
            compute_assignments(dataset, &centroids)
        }
        InitializationMethod::KMeansPlusPlus => {
            centroids.push(&dataset[rng.random_range(0..dataset.len())]);
            let mut assignments = compute_assignments(dataset, &centroids);
            while centroids.len() < k {
                // If every vector coincides with a chosen centroid the weights are all zero;
                // fall back to a uniform choice.
                let index = match WeightedIndex::new(assignments.iter().map(|a| a.1)) {
                    Ok(weighted) => weighted.sample(rng),
                    Err(_) => rng.random_range(0..dataset.len()),
                };

                let centroid = centroids.len();
                centroids.push(&dataset[index]);
                let centroid_vector = &centroids[centroid];
                let distances = (0..dataset.len())
                    .into_par_iter()
                    .map(|i| l2sq(&dataset[i], centroid_vector))
                    .collect::<Vec<_>>();
                for ((cluster, distance), new_distance) in
                    assignments.iter_mut().zip(distances.into_iter())
                {
                    if new_distance < *distance {
                        *cluster = centroid;
                        *distance = new_distance;
                    }
                }
            }
            assignments
        }
    };
    let distance_sum = assignments.into_iter().map(|a| a.1).sum::<f64>();
    (centroids, distance_sum)
}

/// For each input vector compute the closest centroid and the squared distance to that centroid.
///
/// Ties are broken in favor of the lowest centroid index.
pub fn compute_assignments(
    dataset: &VecVectorStore<f64>,
    centroids: &VecVectorStore<f64>,
) -> Vec<(usize, f64)> {
    (0..dataset.len())
        .into_par_iter()
        .map(|i| {
            let v = &dataset[i];
            centroids
                .iter()
                .map(|c| l2sq(v, c))
                .enumerate()
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .expect("at least one centroid")
        })
        .collect()
}

/// Compute the maximum distance between new and old centroids.
fn compute_centroid_distance_max(old: &VecVectorStore<f64>, new: &VecVectorStore<f64>) -> f64 {
    (0..old.len())
        .into_par_iter()
        .map(|i| l2(&old[i], &new[i]))
        .max_by(|a, b| a.total_cmp(b))
        .expect("non-zero k")
}
