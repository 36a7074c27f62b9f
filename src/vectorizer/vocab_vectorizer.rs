use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::vectorizer::{Feature, NgramRange, Vectorizer, Vocabulary};

/// Vectorizer backed by a finalized `Vocabulary`.
///
/// Terms missing from the vocabulary are dropped silently. The n-gram range
/// and stopwords are the ones the vocabulary was counted with.
#[derive(Debug, Clone, Default)]
pub struct VocabVectorizer {
    vocabulary: Option<Arc<Vocabulary>>,
}

impl VocabVectorizer {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary: Some(vocabulary),
        }
    }

    /// A vectorizer with no vocabulary yet; every operation fails with
    /// `VocabularyNotFinalized` until `fit` is called.
    pub fn unfitted() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, vocabulary: Arc<Vocabulary>) -> &mut Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    pub fn vocabulary(&self) -> Result<&Vocabulary> {
        self.vocabulary.as_deref().ok_or(Error::VocabularyNotFinalized)
    }
}

impl Vectorizer for VocabVectorizer {
    fn n_features(&self) -> Result<usize> {
        Ok(self.vocabulary()?.len())
    }

    #[inline]
    fn feature_of(&self, term: &str) -> Option<Feature> {
        self.vocabulary
            .as_ref()?
            .index_of(term)
            .map(Feature::positive)
    }

    fn ngram(&self) -> NgramRange {
        self.vocabulary
            .as_ref()
            .map(|v| v.ngram())
            .unwrap_or_default()
    }

    fn feature_labels(&self) -> Result<Vec<String>> {
        Ok(self.vocabulary()?.terms())
    }

    fn stopwords(&self) -> Option<&BTreeSet<String>> {
        self.vocabulary.as_ref().map(|v| v.stopwords())
    }
}
