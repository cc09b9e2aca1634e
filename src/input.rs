//! Fixed-width vector storage shared by the dense, projection, and clustering stages.

use std::ops::{Index, IndexMut};

/// A store of vector data indexed by a densely assigned range of values.
///
/// All vectors in the store have the same number of elements (`elem_stride()`).
pub trait VectorStore: Index<usize> {
    type Elem;

    /// Return the number of elements in each vector.
    fn elem_stride(&self) -> usize;

    /// Return the number of vectors in the store.
    fn len(&self) -> usize;

    /// Return true if this store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return an iterator over all the vectors in the store.
    fn iter(&self) -> impl ExactSizeIterator<Item = &[Self::Elem]>;
}

/// Row-major store of fixed-width vectors backed by a single `Vec`.
///
/// Used for dense interval matrices, projected samples, and k-means centroids.
#[derive(Debug, Clone, PartialEq)]
pub struct VecVectorStore<E> {
    data: Vec<E>,
    elem_stride: usize,
}

impl<E: Clone> VecVectorStore<E> {
    /// Create an empty store for vectors of `elem_stride` elements, reserving space for
    /// `capacity` vectors.
    pub fn with_capacity(elem_stride: usize, capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(elem_stride * capacity),
            elem_stride,
        }
    }

    /// Create a store of `len` vectors where every element is `value`.
    pub fn filled(elem_stride: usize, len: usize, value: E) -> Self {
        Self {
            data: vec![value; elem_stride * len],
            elem_stride,
        }
    }

    /// Like [`Self::filled`], but returns `None` instead of aborting if `elem_stride * len`
    /// overflows or the allocation fails.
    pub fn try_filled(elem_stride: usize, len: usize, value: E) -> Option<Self> {
        let size = elem_stride.checked_mul(len)?;
        let mut data = Vec::new();
        data.try_reserve_exact(size).ok()?;
        data.resize(size, value);
        Some(Self { data, elem_stride })
    }

    /// Create a store from a flat row-major buffer.
    ///
    /// *Panics* if `data.len()` is not a multiple of `elem_stride`.
    pub fn from_flat(data: Vec<E>, elem_stride: usize) -> Self {
        assert!(elem_stride > 0);
        assert_eq!(data.len() % elem_stride, 0);
        Self { data, elem_stride }
    }

    /// Append a vector to the store.
    ///
    /// *Panics* if `vector.len() != self.elem_stride()`.
    pub fn push(&mut self, vector: &[E]) {
        assert_eq!(vector.len(), self.elem_stride);
        self.data.extend_from_slice(vector);
    }

    /// Return the underlying row-major buffer.
    pub fn as_flat(&self) -> &[E] {
        &self.data
    }

    /// Return a mutable iterator over each vector in the store.
    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = &mut [E]> {
        self.data.chunks_exact_mut(self.elem_stride)
    }
}

impl<E> VectorStore for VecVectorStore<E> {
    type Elem = E;

    fn elem_stride(&self) -> usize {
        self.elem_stride
    }

    fn len(&self) -> usize {
        if self.elem_stride == 0 {
            0
        } else {
            self.data.len() / self.elem_stride
        }
    }

    fn iter(&self) -> impl ExactSizeIterator<Item = &[Self::Elem]> {
        self.data.chunks_exact(self.elem_stride.max(1))
    }
}

impl<E> Index<usize> for VecVectorStore<E> {
    type Output = [E];

    fn index(&self, index: usize) -> &Self::Output {
        let start = index * self.elem_stride;
        let end = start + self.elem_stride;
        &self.data[start..end]
    }
}

impl<E> IndexMut<usize> for VecVectorStore<E> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let start = index * self.elem_stride;
        let end = start + self.elem_stride;
        &mut self.data[start..end]
    }
}

#[cfg(test)]
mod test {
    use super::{VecVectorStore, VectorStore};

    #[test]
    fn push_and_index() {
        let mut store = VecVectorStore::with_capacity(3, 2);
        assert!(store.is_empty());
        store.push(&[1.0, 2.0, 3.0]);
        store.push(&[4.0, 5.0, 6.0]);
        assert_eq!(store.len(), 2);
        assert_eq!(&store[1], &[4.0, 5.0, 6.0]);
        store[0][2] = 9.0;
        assert_eq!(
            store.iter().collect::<Vec<_>>(),
            vec![&[1.0, 2.0, 9.0][..], &[4.0, 5.0, 6.0][..]]
        );
    }

    #[test]
    #[should_panic]
    fn push_wrong_width() {
        let mut store = VecVectorStore::with_capacity(2, 1);
        store.push(&[1.0]);
    }

    #[test]
    fn try_filled_overflow() {
        assert_eq!(VecVectorStore::try_filled(2, 3, 0u8).unwrap().as_flat(), &[0u8; 6]);
        assert!(VecVectorStore::try_filled(usize::MAX, 2, 0u8).is_none());
        assert!(VecVectorStore::try_filled(usize::MAX / 2, 1, 0.0f64).is_none());
    }
}
