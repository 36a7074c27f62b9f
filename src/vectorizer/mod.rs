pub mod hash;
pub mod ngram;
pub mod tfidf;
pub mod vocab;
pub mod vocab_vectorizer;

use std::collections::BTreeSet;

use crate::error::Result;
use crate::utils::SparseVec;
pub use hash::{HashConfig, HashVectorizer};
pub use ngram::NgramRange;
pub use tfidf::TfIdf;
pub use vocab::{PruneRules, TermStats, VocabEntry, Vocabulary, VocabularyBuilder};
pub use vocab_vectorizer::VocabVectorizer;

/// Column a term maps to, with the sign its occurrences are counted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub index: u32,
    pub sign: i8,
}

impl Feature {
    #[inline]
    pub fn positive(index: u32) -> Self {
        Self { index, sign: 1 }
    }
}

/// Stateless mapping from a token sequence to a sparse feature vector.
///
/// Implementations hold only immutable configuration, so a single instance
/// can be shared (`Arc<dyn Vectorizer>`) by every worker of a job.
pub trait Vectorizer: Send + Sync {
    /// Output dimension. Errors when the vectorizer is not ready to be used.
    fn n_features(&self) -> Result<usize>;

    /// Feature of a single term (token or joined n-gram); `None` drops it.
    fn feature_of(&self, term: &str) -> Option<Feature>;

    fn ngram(&self) -> NgramRange;

    /// Column labels, one per feature
    fn feature_labels(&self) -> Result<Vec<String>>;

    /// Tokens removed before n-grams are formed
    fn stopwords(&self) -> Option<&BTreeSet<String>> {
        None
    }

    /// Count the features of one document.
    fn transform(&self, tokens: &[String]) -> Result<SparseVec<i64>> {
        let dim = self.n_features()? as u32;
        let mut indices = Vec::with_capacity(tokens.len());
        let mut values = Vec::with_capacity(tokens.len());
        let mut push = |term: &str| {
            if let Some(feature) = self.feature_of(term) {
                indices.push(feature.index);
                values.push(feature.sign as i64);
            }
        };
        match self.stopwords() {
            Some(stop) if !stop.is_empty() => {
                let kept: Vec<&str> = tokens
                    .iter()
                    .map(String::as_str)
                    .filter(|t| !stop.contains(*t))
                    .collect();
                self.ngram().for_each(&kept, &mut push);
            }
            _ => self.ngram().for_each(tokens, &mut push),
        }
        Ok(SparseVec::from_unsorted(dim, indices, values))
    }
}
