use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::{Dtm, SparseMatrix};

/// TF-IDF reweighting of a finished document-term matrix.
///
/// tf is the count divided by the document's total absolute count,
/// idf = ln((1 + n) / (1 + df)) + 1 with `n` documents and `df` documents containing the term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdf {
    idf: Vec<f64>,
}

impl TfIdf {
    /// Learn document frequencies from `dtm`.
    pub fn fit(dtm: &Dtm) -> Self {
        let doc_num = dtm.n_rows() as f64;
        let idf = dtm
            .column_nnz()
            .into_iter()
            .map(|df| ((1.0 + doc_num) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        Self { idf }
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Weighted copy of `dtm`; it must have the columns the idf was fitted on.
    pub fn transform(&self, dtm: &Dtm) -> Result<SparseMatrix<f64>> {
        if dtm.n_cols() != self.idf.len() {
            return Err(Error::config(format!(
                "tf-idf fitted on {} columns applied to a matrix with {}",
                self.idf.len(),
                dtm.n_cols()
            )));
        }
        Ok(dtm.map_rows(|_, row| {
            let entries: Vec<(u32, i64)> = row.collect();
            let total: i64 = entries.iter().map(|(_, c)| c.abs()).sum();
            if total == 0 {
                return Vec::new();
            }
            entries
                .into_iter()
                .map(|(col, c)| (col, c as f64 / total as f64 * self.idf[col as usize]))
                .collect()
        }))
    }

    pub fn fit_transform(dtm: &Dtm) -> Result<(Self, SparseMatrix<f64>)> {
        let model = Self::fit(dtm);
        let weighted = model.transform(dtm)?;
        Ok((model, weighted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SparseVec;

    fn dtm() -> Dtm {
        SparseMatrix::from_rows(
            vec![
                SparseVec::from_unsorted(3, vec![0, 1], vec![1, 3]),
                SparseVec::from_unsorted(3, vec![0], vec![2]),
                SparseVec::new(3),
            ],
            vec!["1".into(), "2".into(), "3".into()],
            vec!["a".into(), "b".into(), "c".into()],
        )
    }

    #[test]
    fn idf_is_smoothed() {
        let model = TfIdf::fit(&dtm());
        let idf = model.idf();
        assert!((idf[0] - ((4.0f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
        assert!((idf[1] - (2.0f64.ln() + 1.0)).abs() < 1e-12);
        // never seen
        assert!((idf[2] - (4.0f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn rows_are_l1_normalised_before_weighting() {
        let m = dtm();
        let model = TfIdf::fit(&m);
        let weighted = model.transform(&m).unwrap();

        assert!((weighted.get(0, 1) - 0.75 * model.idf()[1]).abs() < 1e-12);
        assert!((weighted.get(1, 0) - model.idf()[0]).abs() < 1e-12);
        assert_eq!(weighted.row(2).count(), 0);
        assert_eq!(weighted.row_labels(), m.row_labels());

        let (_, again) = TfIdf::fit_transform(&m).unwrap();
        assert_eq!(again, weighted);
    }

    #[test]
    fn column_mismatch_is_an_error() {
        let model = TfIdf::fit(&dtm());
        let other: Dtm = SparseMatrix::from_rows(vec![], vec![], vec!["x".into()]);
        assert!(matches!(model.transform(&other), Err(Error::Configuration(_))));
    }
}
