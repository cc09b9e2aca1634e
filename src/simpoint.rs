//! Simpoint selection: cluster intervals and choose one representative interval per cluster.
//!
//! Interval vectors are densified, randomly projected into a small number of dimensions, and
//! partitioned with k-means. The representative (simpoint) for each cluster is the interval whose
//! projection is closest to the cluster centroid, and its weight is the fraction of all intervals
//! assigned to that cluster.

use rand::Rng;
use tracing::{debug, warn};

use crate::{
    bbv::VectorSet,
    dense::dense_matrix,
    distance::l2,
    input::{VecVectorStore, VectorStore},
    kmeans::{self, compute_assignments},
    projection::{random_projection, DEFAULT_DIMENSIONS},
    Error, Result,
};

/// Default number of clusters to produce.
pub const DEFAULT_CLUSTERS: usize = 4;

/// Parameters for simpoint selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpointParams {
    /// Number of clusters (and simpoints) to produce.
    pub clusters: usize,
    /// Number of dimensions to randomly project interval vectors into before clustering.
    pub dimensions: usize,
    /// Parameters for k-means.
    pub kmeans: kmeans::Params,
}

impl Default for SimpointParams {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTERS,
            dimensions: DEFAULT_DIMENSIONS,
            kmeans: kmeans::Params::default(),
        }
    }
}

/// A representative interval for one cluster.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Simpoint {
    /// Cluster id in `[0, k)`.
    pub cluster: usize,
    /// Index of the representative interval in the input.
    pub index: usize,
    /// Fraction of all intervals assigned to this cluster.
    pub weight: f64,
}

/// Result of clustering `N` intervals into `k` clusters.
#[derive(Debug, Clone)]
pub struct SimpointSelection {
    labels: Vec<usize>,
    simpoints: Vec<Simpoint>,
    centroids: VecVectorStore<f64>,
    converged: bool,
}

impl SimpointSelection {
    /// Cluster label for each interval, in input order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// One simpoint per cluster, in ascending cluster order.
    pub fn simpoints(&self) -> &[Simpoint] {
        &self.simpoints
    }

    /// Final k-means centroids in the projected space.
    pub fn centroids(&self) -> &VecVectorStore<f64> {
        &self.centroids
    }

    /// True if k-means converged before reaching its iteration limit.
    pub fn converged(&self) -> bool {
        self.converged
    }
}

/// Run the complete pipeline over `vectors`: densify, project, and cluster.
pub fn select_simpoints(
    vectors: &VectorSet,
    params: &SimpointParams,
    rng: &mut impl Rng,
) -> Result<SimpointSelection> {
    validate(vectors.len(), params.clusters)?;
    let dense = dense_matrix(vectors)?;
    debug!(
        "built dense matrix {} x {}",
        dense.len(),
        dense.elem_stride()
    );
    let projected = random_projection(&dense, params.dimensions, rng)?;
    drop(dense);
    cluster_samples(&projected, params.clusters, &params.kmeans, rng)
}

/// Cluster `samples` into `k` groups and select a representative sample for each group.
pub fn cluster_samples(
    samples: &VecVectorStore<f64>,
    k: usize,
    params: &kmeans::Params,
    rng: &mut impl Rng,
) -> Result<SimpointSelection> {
    validate(samples.len(), k)?;
    let (centroids, converged) = match kmeans::kmeans(samples, k, params, rng) {
        Ok(c) => (c, true),
        Err(c) => {
            warn!("k-means did not converge after {} iterations", params.iters);
            (c, false)
        }
    };

    let labels = compute_assignments(samples, &centroids)
        .into_iter()
        .map(|(c, _)| c)
        .collect::<Vec<_>>();
    let weights = cluster_weights(&labels, k);
    let simpoints = centroids
        .iter()
        .zip(weights)
        .enumerate()
        .map(|(cluster, (centroid, weight))| Simpoint {
            cluster,
            index: nearest_sample(samples, centroid),
            weight,
        })
        .collect();

    Ok(SimpointSelection {
        labels,
        simpoints,
        centroids,
        converged,
    })
}

fn validate(samples: usize, k: usize) -> Result<()> {
    if samples == 0 {
        Err(Error::EmptyInput)
    } else if k == 0 || k > samples {
        Err(Error::InvalidClusterCount { k, samples })
    } else {
        Ok(())
    }
}

/// Return the index of the sample closest to `centroid` by euclidean distance.
///
/// Ties go to the lowest index. *Panics* if `samples` is empty.
pub fn nearest_sample(samples: &VecVectorStore<f64>, centroid: &[f64]) -> usize {
    samples
        .iter()
        .map(|s| l2(centroid, s))
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .expect("non-empty samples")
        .0
}

/// Fraction of `labels` equal to each cluster id in `[0, k)`.
pub fn cluster_weights(labels: &[usize], k: usize) -> Vec<f64> {
    let counts = labels.iter().fold(vec![0usize; k], |mut counts, c| {
        counts[*c] += 1;
        counts
    });
    counts
        .into_iter()
        .map(|c| c as f64 / labels.len() as f64)
        .collect()
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro128PlusPlus;

    use crate::{
        bbv::{IntervalAccumulator, VectorSet},
        input::{VecVectorStore, VectorStore},
        kmeans, Error,
    };

    use super::{
        cluster_samples, cluster_weights, nearest_sample, select_simpoints, SimpointParams,
    };

    /// Intervals drawn from `phases` distinct block distributions, in round robin order.
    fn phased_set(n: usize, phases: u64, rng: &mut impl Rng) -> VectorSet {
        VectorSet::from_vectors(
            (0..n)
                .map(|i| {
                    let phase = i as u64 % phases;
                    let mut acc = IntervalAccumulator::new();
                    for b in 0..8 {
                        acc.add(phase * 100 + b, rng.random_range(900..1100));
                    }
                    acc.finish()
                })
                .collect(),
        )
    }

    #[test]
    fn weights() {
        assert_eq!(cluster_weights(&[0, 1, 1, 3], 4), vec![0.25, 0.5, 0.0, 0.25]);
    }

    #[test]
    fn nearest_prefers_lowest_index() {
        let samples = VecVectorStore::from_flat(vec![2.0, 1.0, 0.0, 1.0, 3.0], 1);
        assert_eq!(nearest_sample(&samples, &[1.0]), 1);
        assert_eq!(nearest_sample(&samples, &[2.6]), 4);
    }

    #[test]
    fn single_cluster() {
        let mut rng = Xoshiro128PlusPlus::seed_from_u64(5);
        let samples = VecVectorStore::from_flat(
            (0..30).map(|_| rng.random_range(-1.0..1.0)).collect(),
            3,
        );
        let selection =
            cluster_samples(&samples, 1, &kmeans::Params::default(), &mut rng).unwrap();
        assert!(selection.converged());
        assert_eq!(selection.labels(), &[0; 10]);
        assert_eq!(selection.simpoints().len(), 1);
        assert_eq!(selection.simpoints()[0].weight, 1.0);

        let mut mean = [0.0; 3];
        for s in samples.iter() {
            for (m, x) in mean.iter_mut().zip(s.iter()) {
                *m += x / 10.0;
            }
        }
        for (m, c) in mean.iter().zip(selection.centroids()[0].iter()) {
            assert!((m - c).abs() < 1e-9);
        }
        assert_eq!(
            selection.simpoints()[0].index,
            nearest_sample(&samples, &selection.centroids()[0])
        );
    }

    #[test]
    fn selects_one_simpoint_per_phase() {
        let mut rng = Xoshiro128PlusPlus::seed_from_u64(17);
        let set = phased_set(60, 3, &mut rng);
        let params = SimpointParams {
            clusters: 3,
            kmeans: kmeans::Params {
                init_iters: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        let selection = select_simpoints(&set, &params, &mut rng).unwrap();
        let simpoints = selection.simpoints();
        assert_eq!(simpoints.len(), 3);
        assert!((simpoints.iter().map(|s| s.weight).sum::<f64>() - 1.0).abs() < 1e-9);
        for (c, s) in simpoints.iter().enumerate() {
            assert_eq!(s.cluster, c);
            assert!(s.index < set.len());
            assert_eq!(selection.labels()[s.index], c);
            assert!((s.weight - 1.0 / 3.0).abs() < 1e-9);
        }

        let mut phases = simpoints.iter().map(|s| s.index % 3).collect::<Vec<_>>();
        phases.sort();
        assert_eq!(phases, vec![0, 1, 2]);
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let set = phased_set(40, 4, &mut Xoshiro128PlusPlus::seed_from_u64(3));
        let params = SimpointParams::default();
        let select = |seed| {
            select_simpoints(&set, &params, &mut Xoshiro128PlusPlus::seed_from_u64(seed)).unwrap()
        };
        let (a, b) = (select(0), select(0));
        assert_eq!(a.simpoints(), b.simpoints());
        assert_eq!(a.labels(), b.labels());
    }

    #[test]
    fn invalid_cluster_counts() {
        let mut rng = Xoshiro128PlusPlus::seed_from_u64(0);
        let set = phased_set(3, 1, &mut rng);
        for clusters in [0, 4] {
            let params = SimpointParams {
                clusters,
                ..Default::default()
            };
            assert!(matches!(
                select_simpoints(&set, &params, &mut rng),
                Err(Error::InvalidClusterCount { k, samples: 3 }) if k == clusters
            ));
        }
        assert!(matches!(
            select_simpoints(&VectorSet::default(), &SimpointParams::default(), &mut rng),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn block_ids_too_large_to_densify() {
        let input = "T :18446744073709551615:1\nT :1:1\n";
        let set = VectorSet::from_reader(input.as_bytes()).unwrap();
        let params = SimpointParams {
            clusters: 1,
            ..Default::default()
        };
        assert!(matches!(
            select_simpoints(&set, &params, &mut Xoshiro128PlusPlus::seed_from_u64(0)),
            Err(Error::DenseTooLarge { rows: 2, max_id: u64::MAX })
        ));
    }
}
