use std::{io, num::NonZero, path::PathBuf};

use clap::Args;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro128PlusPlus;
use simpoint::{
    bbv::VectorSet,
    kmeans::{self, InitializationMethod},
    output::write_files,
    projection::DEFAULT_DIMENSIONS,
    simpoint::{select_simpoints, SimpointParams, DEFAULT_CLUSTERS},
};
use tracing::info;

#[derive(Args)]
pub struct SimpointsArgs {
    /// Input BBV file.
    input: PathBuf,

    /// Number of clusters, and so the number of simpoints chosen.
    #[arg(short = 'k', long, default_value_t = NonZero::new(DEFAULT_CLUSTERS).unwrap())]
    clusters: NonZero<usize>,
    /// Number of dimensions to randomly project interval vectors into before clustering.
    #[arg(short, long, default_value_t = NonZero::new(DEFAULT_DIMENSIONS).unwrap())]
    dimensions: NonZero<usize>,
    /// RNG seed for projection and k-means initialization.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Run up to this many k-means iterations before terminating.
    #[arg(short, long, default_value_t = NonZero::new(300).unwrap())]
    iters: NonZero<usize>,
    /// Run this many initializations of the centroids and keep the best.
    #[arg(long, default_value_t = NonZero::new(1).unwrap())]
    init_iters: NonZero<usize>,
    /// Exit early from iteration if no centroid moved more than epsilon.
    #[arg(long, default_value_t = 0.0001)]
    epsilon: f64,
    /// Centroid initialization: random or kmeans++.
    #[arg(long, default_value = "kmeans++")]
    initialization: InitializationMethod,

    /// Directory to write the simpoints and weights files into.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

pub fn simpoints(args: SimpointsArgs, quiet: bool) -> io::Result<()> {
    let vectors = VectorSet::read_path(&args.input)?;
    info!(
        "loaded {} vectors with {} unique blocks",
        vectors.len(),
        vectors.keys().len()
    );

    let params = SimpointParams {
        clusters: args.clusters.get(),
        dimensions: args.dimensions.get(),
        kmeans: kmeans::Params {
            iters: args.iters.get(),
            init_iters: args.init_iters.get(),
            epsilon: args.epsilon,
            initialization: args.initialization,
        },
    };
    let mut rng = Xoshiro128PlusPlus::seed_from_u64(args.seed);
    let selection = select_simpoints(&vectors, &params, &mut rng)?;
    if !quiet {
        for s in selection.simpoints() {
            info!(
                "cluster {:3} simpoint {:8} weight {:.6}",
                s.cluster, s.index, s.weight
            );
        }
    }

    write_files(&args.output_dir, selection.simpoints())?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::{fs, num::NonZero, path::Path};

    use simpoint::kmeans::InitializationMethod;

    use super::{simpoints, SimpointsArgs};

    fn args(input: &Path, output_dir: &Path, clusters: usize) -> SimpointsArgs {
        SimpointsArgs {
            input: input.to_path_buf(),
            clusters: NonZero::new(clusters).unwrap(),
            dimensions: NonZero::new(15).unwrap(),
            seed: 0,
            iters: NonZero::new(300).unwrap(),
            init_iters: NonZero::new(1).unwrap(),
            epsilon: 0.0001,
            initialization: InitializationMethod::KMeansPlusPlus,
            output_dir: output_dir.to_path_buf(),
        }
    }

    #[test]
    fn writes_simpoints_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.bbv");
        let records = (0..12)
            .map(|i| format!("T:{}:{} :{}:7\n", i % 2, 10 + i, 2 + i % 2))
            .collect::<String>();
        fs::write(&input, records).unwrap();

        simpoints(args(&input, dir.path(), 2), true).unwrap();

        let simpoints = fs::read_to_string(dir.path().join("simpoints")).unwrap();
        let weights = fs::read_to_string(dir.path().join("weights")).unwrap();
        assert_eq!(simpoints.lines().count(), 2);
        assert_eq!(weights, "0.5 0\n0.5 1\n");
        for (c, line) in simpoints.lines().enumerate() {
            let (index, cluster) = line.split_once(' ').unwrap();
            assert!(index.parse::<usize>().unwrap() < 12);
            assert_eq!(cluster, c.to_string());
        }
    }

    #[test]
    fn too_many_clusters_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.bbv");
        fs::write(&input, "T:1:1\nT:2:1\n").unwrap();
        let err = simpoints(args(&input, dir.path(), 3), false).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(!dir.path().join("simpoints").exists());
        assert!(!dir.path().join("weights").exists());
    }

    #[test]
    fn missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = simpoints(args(&dir.path().join("nope"), dir.path(), 1), true).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
