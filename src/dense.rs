//! Dense representation of a [`VectorSet`].

use crate::{bbv::VectorSet, input::VecVectorStore, Error, Result};

/// Materialize `vectors` as an `N x (max_id + 1)` matrix.
///
/// Row `i` holds the values of vector `i` at the column for each block id and zero elsewhere.
/// Fails with [`Error::DenseTooLarge`] if the matrix cannot be allocated.
pub fn dense_matrix(vectors: &VectorSet) -> Result<VecVectorStore<f64>> {
    let too_large = || Error::DenseTooLarge {
        rows: vectors.len(),
        max_id: vectors.max_id().unwrap_or(0),
    };
    let columns = match vectors.max_id() {
        Some(id) => usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_add(1))
            .ok_or_else(too_large)?,
        None => 1,
    };
    let mut matrix =
        VecVectorStore::try_filled(columns, vectors.len(), 0.0).ok_or_else(too_large)?;
    for (row, vector) in matrix.iter_mut().zip(vectors.iter()) {
        for (id, value) in vector.iter() {
            row[id as usize] = value;
        }
    }
    Ok(matrix)
}

#[cfg(test)]
mod test {
    use crate::{
        bbv::{IntervalVector, VectorSet},
        input::VectorStore,
        Error,
    };

    use super::dense_matrix;

    #[test]
    fn scatter_by_id() {
        let set = VectorSet::from_vectors(vec![
            IntervalVector::from_entries([(0, 0.5), (3, 0.5)]),
            IntervalVector::from_entries([(2, 1.0)]),
        ]);
        let m = dense_matrix(&set).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.elem_stride(), 4);
        assert_eq!(&m[0], &[0.5, 0.0, 0.0, 0.5]);
        assert_eq!(&m[1], &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn no_blocks() {
        let set = VectorSet::from_vectors(vec![IntervalVector::default(); 3]);
        let m = dense_matrix(&set).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.elem_stride(), 1);
        assert!(m.iter().all(|r| r == [0.0]));
    }

    #[test]
    fn ids_too_large_to_densify() {
        for input in ["T :18446744073709551615:1\nT :1:1\n", "T :2305843009213693951:1\n"] {
            let set = VectorSet::from_reader(input.as_bytes()).unwrap();
            assert!(matches!(
                dense_matrix(&set),
                Err(Error::DenseTooLarge { .. })
            ));
        }
    }
}
