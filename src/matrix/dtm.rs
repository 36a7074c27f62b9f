use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::{Dtm, SparseMatrix};
use crate::text::TokenizedDoc;
use crate::utils::SparseVec;
use crate::vectorizer::Vectorizer;

/// Row accumulator for a document-term matrix.
///
/// Rows are keyed by document id and kept in insertion order. A partial DTM
/// covers a disjoint set of documents; merging is a union of rows, which is the
/// entry-wise sum when every id occurs once. A repeated id is fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DtmBuilder {
    n_features: usize,
    rows: IndexMap<String, SparseVec<i64>>,
}

impl DtmBuilder {
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            rows: IndexMap::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Append one document row.
    pub fn push(&mut self, id: String, row: SparseVec<i64>) -> Result<()> {
        if row.dim() as usize != self.n_features {
            return Err(Error::config(format!(
                "row of dimension {} pushed into a DTM with {} columns",
                row.dim(),
                self.n_features
            )));
        }
        match self.rows.entry(id) {
            Entry::Occupied(e) => Err(Error::DuplicateId(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(row);
                Ok(())
            }
        }
    }

    /// Vectorize every document of `stream` into a row.
    /// Aborts on the first error, dropping the rows built so far.
    pub fn consume<I>(mut self, stream: I, vectorizer: &dyn Vectorizer) -> Result<Self>
    where
        I: IntoIterator<Item = Result<TokenizedDoc>>,
    {
        for doc in stream {
            let TokenizedDoc { id, tokens } = doc?;
            let row = vectorizer.transform(&tokens)?;
            self.push(id, row)?;
        }
        Ok(self)
    }

    /// Append the rows of `other` after the rows of `self`.
    pub fn merge(mut self, other: DtmBuilder) -> Result<Self> {
        if self.n_features != other.n_features {
            return Err(Error::config(format!(
                "cannot merge DTMs with {} and {} columns",
                self.n_features, other.n_features
            )));
        }
        self.rows.reserve(other.rows.len());
        for (id, row) in other.rows {
            self.push(id, row)?;
        }
        Ok(self)
    }

    /// Freeze into a CSR matrix with the given column labels.
    pub fn finish(self, col_labels: Vec<String>) -> Result<Dtm> {
        if col_labels.len() != self.n_features {
            return Err(Error::config(format!(
                "{} column labels for {} features",
                col_labels.len(),
                self.n_features
            )));
        }
        let (row_labels, rows) = self.rows.into_iter().unzip();
        Ok(SparseMatrix::from_rows(rows, row_labels, col_labels))
    }
}
