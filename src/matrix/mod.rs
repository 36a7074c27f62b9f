pub mod dtm;
pub mod tcm;

use std::collections::HashMap;

use ahash::RandomState;
use num::Num;
use serde::{Deserialize, Serialize};

use crate::utils::SparseVec;
pub use dtm::DtmBuilder;
pub use tcm::{PairPolicy, TcmBuilder, TcmConfig};

/// Document-term matrix: one row per document, counts as entries.
pub type Dtm = SparseMatrix<i64>;
/// Term-co-occurrence matrix: square, distance weighted entries.
pub type Tcm = SparseMatrix<f64>;

/// Labelled sparse matrix in compressed sparse row layout.
///
/// Within a row, column indices are strictly ascending and values non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix<N>
where
    N: Num + Copy,
{
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    values: Vec<N>,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
}

impl<N> SparseMatrix<N>
where
    N: Num + Copy,
{
    /// Assemble from rows; `row_labels` must match the row count and every
    /// row must have dimension `col_labels.len()`.
    pub fn from_rows(rows: Vec<SparseVec<N>>, row_labels: Vec<String>, col_labels: Vec<String>) -> Self {
        debug_assert_eq!(rows.len(), row_labels.len());
        let n_cols = col_labels.len();
        let nnz = rows.iter().map(SparseVec::nnz).sum();
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        indptr.push(0);
        for row in rows {
            debug_assert_eq!(row.dim() as usize, n_cols);
            let (inds, vals) = row.into_parts();
            indices.extend(inds);
            values.extend(vals);
            indptr.push(indices.len());
        }
        Self {
            n_cols,
            indptr,
            indices,
            values,
            row_labels,
            col_labels,
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// `(rows, cols)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols)
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Stored entries of row `row` as `(col, value)`, columns ascending.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (u32, N)> + '_ {
        let span = self.indptr[row]..self.indptr[row + 1];
        self.indices[span.clone()]
            .iter()
            .copied()
            .zip(self.values[span].iter().copied())
    }

    /// Entry at `(row, col)`, zero when not stored or out of range.
    pub fn get(&self, row: usize, col: u32) -> N {
        if row >= self.n_rows() {
            return N::zero();
        }
        let span = self.indptr[row]..self.indptr[row + 1];
        match self.indices[span.clone()].binary_search(&col) {
            Ok(pos) => self.values[span.start + pos],
            Err(_) => N::zero(),
        }
    }

    /// Entry addressed by labels, zero when either label is unknown.
    ///
    /// Scans both label lists, so each call is linear in the matrix size.
    /// Use `label_index` for repeated lookups.
    pub fn get_by_label(&self, row: &str, col: &str) -> N {
        let r = self.row_labels.iter().position(|l| l == row);
        let c = self.col_labels.iter().position(|l| l == col);
        match (r, c) {
            (Some(r), Some(c)) => self.get(r, c as u32),
            _ => N::zero(),
        }
    }

    /// Hashed label → position lookup over this matrix.
    /// If a label repeats, its first position wins, as in `get_by_label`.
    pub fn label_index(&self) -> LabelIndex<'_, N> {
        fn positions<'a>(labels: &'a [String]) -> HashMap<&'a str, usize, RandomState> {
            let mut map = HashMap::with_capacity_and_hasher(labels.len(), RandomState::new());
            for (i, label) in labels.iter().enumerate() {
                map.entry(label.as_str()).or_insert(i);
            }
            map
        }
        LabelIndex {
            matrix: self,
            rows: positions(&self.row_labels),
            cols: positions(&self.col_labels),
        }
    }

    pub fn sum(&self) -> N {
        self.values.iter().fold(N::zero(), |acc, &v| acc + v)
    }

    /// `(row, col, value)` of every stored entry, row-major
    pub fn triplets(&self) -> Vec<(usize, u32, N)> {
        (0..self.n_rows())
            .flat_map(|r| self.row(r).map(move |(c, v)| (r, c, v)))
            .collect()
    }

    /// Number of rows with a stored entry in each column
    pub fn column_nnz(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.n_cols];
        for &c in &self.indices {
            counts[c as usize] += 1;
        }
        counts
    }

    /// Same structure, values mapped row by row.
    /// Entries mapped to zero are removed.
    pub fn map_rows<M, F>(&self, mut f: F) -> SparseMatrix<M>
    where
        M: Num + Copy,
        F: FnMut(usize, &mut dyn Iterator<Item = (u32, N)>) -> Vec<(u32, M)>,
    {
        let rows = (0..self.n_rows())
            .map(|r| {
                let (inds, vals) = f(r, &mut self.row(r)).into_iter().unzip();
                SparseVec::from_unsorted(self.n_cols as u32, inds, vals)
            })
            .collect();
        SparseMatrix::from_rows(rows, self.row_labels.clone(), self.col_labels.clone())
    }
}

/// Constant-time label addressing for a borrowed `SparseMatrix`.
#[derive(Debug)]
pub struct LabelIndex<'a, N>
where
    N: Num + Copy,
{
    matrix: &'a SparseMatrix<N>,
    rows: HashMap<&'a str, usize, RandomState>,
    cols: HashMap<&'a str, usize, RandomState>,
}

impl<'a, N> LabelIndex<'a, N>
where
    N: Num + Copy,
{
    pub fn row(&self, label: &str) -> Option<usize> {
        self.rows.get(label).copied()
    }

    pub fn col(&self, label: &str) -> Option<u32> {
        self.cols.get(label).map(|&c| c as u32)
    }

    /// Same result as `SparseMatrix::get_by_label`.
    pub fn get(&self, row: &str, col: &str) -> N {
        match (self.row(row), self.col(col)) {
            (Some(r), Some(c)) => self.matrix.get(r, c),
            _ => N::zero(),
        }
    }
}
