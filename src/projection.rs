//! Random linear projection of dense interval vectors into a low dimensional space.

use rand::Rng;
use rayon::prelude::*;

use crate::{
    input::{VecVectorStore, VectorStore},
    Error, Result,
};

/// Default number of dimensions to project into.
pub const DEFAULT_DIMENSIONS: usize = 15;

/// Generate a `rows x columns` matrix with entries uniformly distributed in `[0.0, 2.0)`.
pub fn projection_matrix(rows: usize, columns: usize, rng: &mut impl Rng) -> VecVectorStore<f64> {
    VecVectorStore::from_flat(
        (0..rows * columns)
            .map(|_| 2.0 * rng.random::<f64>())
            .collect(),
        columns,
    )
}

/// Project `dense` (`N x D`) into `dimensions` using a random `D x dimensions` matrix drawn from
/// `rng`, then subtract 1.0 from every projected value.
pub fn random_projection(
    dense: &VecVectorStore<f64>,
    dimensions: usize,
    rng: &mut impl Rng,
) -> Result<VecVectorStore<f64>> {
    if dimensions == 0 {
        return Err(Error::InvalidDimensions(dimensions));
    }
    let projection = projection_matrix(dense.elem_stride(), dimensions, rng);
    Ok(project(dense, &projection))
}

/// Compute `dense * projection - 1.0`.
///
/// *Panics* if `projection` does not have one row for each column of `dense`.
pub fn project(
    dense: &VecVectorStore<f64>,
    projection: &VecVectorStore<f64>,
) -> VecVectorStore<f64> {
    assert_eq!(dense.elem_stride(), projection.len());
    let dimensions = projection.elem_stride();
    let mut out = VecVectorStore::filled(dimensions, dense.len(), 0.0);
    out.iter_mut()
        .collect::<Vec<_>>()
        .into_par_iter()
        .zip(dense.iter().collect::<Vec<_>>())
        .for_each(|(o, row)| {
            // Rows are mostly zero so skip those columns entirely.
            for (x, p) in row.iter().zip(projection.iter()).filter(|(x, _)| **x != 0.0) {
                for (o, p) in o.iter_mut().zip(p.iter()) {
                    *o += x * p;
                }
            }
            for o in o.iter_mut() {
                *o -= 1.0;
            }
        });
    out
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro128PlusPlus;

    use crate::{
        input::{VecVectorStore, VectorStore},
        Error,
    };

    use super::{project, projection_matrix, random_projection};

    #[test]
    fn projection_entries_in_range() {
        let mut rng = Xoshiro128PlusPlus::seed_from_u64(0);
        let p = projection_matrix(100, 15, &mut rng);
        assert_eq!(p.len(), 100);
        assert_eq!(p.elem_stride(), 15);
        assert!(p.as_flat().iter().all(|x| (0.0..2.0).contains(x)));
    }

    #[test]
    fn project_known_matrix() {
        let dense = VecVectorStore::from_flat(vec![0.5, 0.5, 0.0, 0.0, 0.25, 0.75], 3);
        let projection = VecVectorStore::from_flat(vec![1.0, 2.0, 0.0, 4.0, 1.5, 0.5], 2);
        let out = project(&dense, &projection);
        assert_eq!(out.len(), 2);
        assert_eq!(&out[0], &[-0.5, 2.0]);
        assert_eq!(&out[1], &[0.125, 0.375]);
    }

    #[test]
    fn seeded_projection_is_reproducible() {
        let dense = VecVectorStore::from_flat((0..40).map(|i| i as f64 / 40.0).collect(), 8);
        let a = random_projection(&dense, 4, &mut Xoshiro128PlusPlus::seed_from_u64(9)).unwrap();
        let b = random_projection(&dense, 4, &mut Xoshiro128PlusPlus::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert_eq!(a.elem_stride(), 4);
    }

    #[test]
    fn zero_dimensions() {
        let dense = VecVectorStore::from_flat(vec![1.0], 1);
        assert!(matches!(
            random_projection(&dense, 0, &mut Xoshiro128PlusPlus::seed_from_u64(0)),
            Err(Error::InvalidDimensions(0))
        ));
    }
}
