use num::Num;
use serde::{Deserialize, Serialize};

use crate::utils::sort::sort_and_coalesce;

/// Sparse vector storing only non-zero entries.
///
/// `indices` are strictly ascending and every stored value is non-zero,
/// so two vectors with the same logical content compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVec<N>
where
    N: Num + Copy,
{
    dim: u32,
    indices: Vec<u32>,
    values: Vec<N>,
}

impl<N> SparseVec<N>
where
    N: Num + Copy,
{
    /// Empty vector of dimension `dim`
    pub fn new(dim: u32) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from unordered `(index, value)` pairs.
    /// Repeated indices are summed, resulting zeros are dropped.
    ///
    /// # Arguments
    /// * `dim` - logical dimension
    /// * `indices` - feature indices, each `< dim`
    /// * `values` - values matching `indices`
    pub fn from_unsorted(dim: u32, mut indices: Vec<u32>, mut values: Vec<N>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        debug_assert!(indices.iter().all(|&i| i < dim), "index out of dimension");
        sort_and_coalesce(&mut indices, &mut values);
        Self {
            dim,
            indices,
            values,
        }
    }

    #[inline]
    pub fn dim(&self) -> u32 {
        self.dim
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[N] {
        &self.values
    }

    /// Value at `index`, zero when the entry is not stored.
    pub fn get(&self, index: u32) -> N {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => N::zero(),
        }
    }

    /// `(index, value)` pairs in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, N)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn sum(&self) -> N {
        self.values.iter().fold(N::zero(), |acc, &v| acc + v)
    }

    pub(crate) fn into_parts(self) -> (Vec<u32>, Vec<N>) {
        (self.indices, self.values)
    }
}
