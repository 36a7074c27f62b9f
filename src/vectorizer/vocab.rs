use std::collections::{BTreeSet, HashMap};

use ahash::RandomState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::text::TokenizedDoc;
use crate::vectorizer::ngram::NgramRange;

/// Raw frequency statistics of one term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TermStats {
    /// total occurrences across the corpus
    pub term_count: u64,
    /// number of documents containing the term
    pub doc_count: u64,
}

impl TermStats {
    #[inline]
    fn absorb(&mut self, other: TermStats) {
        self.term_count += other.term_count;
        self.doc_count += other.doc_count;
    }
}

/// Vocabulary pruning bounds, applied in field order by `VocabularyBuilder::finalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneRules {
    pub min_count: u64,
    pub max_count: Option<u64>,
    pub min_doc_proportion: f64,
    pub max_doc_proportion: f64,
    /// keep only the most frequent terms, lexical order breaking ties
    pub max_vocab_size: Option<usize>,
}

impl Default for PruneRules {
    fn default() -> Self {
        Self {
            min_count: 1,
            max_count: None,
            min_doc_proportion: 0.0,
            max_doc_proportion: 1.0,
            max_vocab_size: None,
        }
    }
}

impl PruneRules {
    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn with_max_count(mut self, max_count: u64) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn with_doc_proportion(mut self, min: f64, max: f64) -> Self {
        self.min_doc_proportion = min;
        self.max_doc_proportion = max;
        self
    }

    pub fn with_max_vocab_size(mut self, size: usize) -> Self {
        self.max_vocab_size = Some(size);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.max_count {
            if max < self.min_count {
                return Err(Error::config(format!(
                    "max_count {max} is below min_count {}",
                    self.min_count
                )));
            }
        }
        let in_unit = |p: f64| (0.0..=1.0).contains(&p);
        if !in_unit(self.min_doc_proportion)
            || !in_unit(self.max_doc_proportion)
            || self.min_doc_proportion > self.max_doc_proportion
        {
            return Err(Error::config(format!(
                "document proportion bounds [{}, {}] must satisfy 0 <= min <= max <= 1",
                self.min_doc_proportion, self.max_doc_proportion
            )));
        }
        Ok(())
    }

    fn keeps(&self, stats: &TermStats, document_count: u64) -> bool {
        if stats.term_count < self.min_count {
            return false;
        }
        if self.max_count.is_some_and(|max| stats.term_count > max) {
            return false;
        }
        let proportion = if document_count == 0 {
            0.0
        } else {
            stats.doc_count as f64 / document_count as f64
        };
        proportion >= self.min_doc_proportion && proportion <= self.max_doc_proportion
    }
}

/// Single-pass accumulator of per-term frequencies.
///
/// Builders are partial results: any number of them, built over disjoint
/// parts of a corpus, can be merged in any order and yield the same counts.
/// Pruning and index assignment only happen in `finalize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyBuilder {
    terms: HashMap<String, TermStats, RandomState>,
    document_count: u64,
    ngram: NgramRange,
    stopwords: BTreeSet<String>,
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for VocabularyBuilder {
    fn eq(&self, other: &Self) -> bool {
        self.document_count == other.document_count
            && self.ngram == other.ngram
            && self.stopwords == other.stopwords
            && self.terms.len() == other.terms.len()
            && self.terms.iter().all(|(t, s)| other.terms.get(t) == Some(s))
    }
}

impl VocabularyBuilder {
    pub fn new() -> Self {
        Self {
            terms: HashMap::with_hasher(RandomState::new()),
            document_count: 0,
            ngram: NgramRange::default(),
            stopwords: BTreeSet::new(),
        }
    }

    /// Count n-grams of the given orders instead of single tokens
    pub fn with_ngram(mut self, ngram: NgramRange) -> Self {
        self.ngram = ngram;
        self
    }

    /// Tokens dropped before counting (and before n-grams are formed)
    pub fn with_stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = stopwords.into_iter().map(Into::into).collect();
        self
    }

    /// Empty builder with the same n-gram and stopword settings
    pub fn empty_like(&self) -> Self {
        Self {
            ngram: self.ngram,
            stopwords: self.stopwords.clone(),
            ..Self::new()
        }
    }

    pub fn ngram(&self) -> NgramRange {
        self.ngram
    }

    /// Account one document.
    ///
    /// # Arguments
    /// * `tokens` - the document's tokens, in order
    pub fn update<S: AsRef<str>>(&mut self, tokens: &[S]) {
        let mut doc_terms: HashMap<String, u64, RandomState> = HashMap::with_hasher(RandomState::new());
        let mut count = |term: &str| match doc_terms.get_mut(term) {
            Some(c) => *c += 1,
            None => {
                doc_terms.insert(term.to_string(), 1);
            }
        };
        if self.stopwords.is_empty() {
            self.ngram.for_each(tokens, &mut count);
        } else {
            let kept: Vec<&str> = tokens
                .iter()
                .map(AsRef::as_ref)
                .filter(|t| !self.stopwords.contains(*t))
                .collect();
            self.ngram.for_each(&kept, &mut count);
        }

        for (term, occurrences) in doc_terms {
            let stats = self.terms.entry(term).or_default();
            stats.term_count += occurrences;
            stats.doc_count += 1;
        }
        self.document_count += 1;
    }

    /// Run a whole token stream through `update`.
    /// The first error aborts the pass and the partial counts are dropped.
    pub fn consume<I>(mut self, stream: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<TokenizedDoc>>,
    {
        for doc in stream {
            let doc = doc?;
            self.update(&doc.tokens);
        }
        Ok(self)
    }

    /// Sum two builders over disjoint documents.
    /// Commutative and associative on the counts it holds.
    pub fn merge(mut self, mut other: VocabularyBuilder) -> Result<Self> {
        if self.ngram != other.ngram || self.stopwords != other.stopwords {
            return Err(Error::config(
                "cannot merge vocabularies built with different n-gram or stopword settings",
            ));
        }
        // fold the smaller map into the larger one
        if self.terms.len() < other.terms.len() {
            std::mem::swap(&mut self.terms, &mut other.terms);
        }
        for (term, stats) in other.terms {
            self.terms.entry(term).or_default().absorb(stats);
        }
        self.document_count += other.document_count;
        Ok(self)
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    /// number of distinct terms seen so far
    pub fn term_num(&self) -> usize {
        self.terms.len()
    }

    pub fn stats(&self, term: &str) -> Option<TermStats> {
        self.terms.get(term).copied()
    }

    /// Prune and index.
    ///
    /// Indices follow descending term count, ties broken by lexical order, so
    /// the result only depends on the merged counts.
    pub fn finalize(&self, rules: &PruneRules) -> Result<Vocabulary> {
        rules.validate()?;

        let mut kept: Vec<(&String, TermStats)> = self
            .terms
            .iter()
            .filter(|(_, stats)| rules.keeps(stats, self.document_count))
            .map(|(term, stats)| (term, *stats))
            .collect();
        kept.sort_unstable_by(|(term_a, a), (term_b, b)| {
            b.term_count.cmp(&a.term_count).then_with(|| term_a.cmp(term_b))
        });
        if let Some(cap) = rules.max_vocab_size {
            kept.truncate(cap);
        }

        tracing::info!(
            seen = self.terms.len(),
            kept = kept.len(),
            documents = self.document_count,
            "finalized vocabulary"
        );

        Ok(Vocabulary {
            terms: kept.into_iter().map(|(t, s)| (t.clone(), s)).collect(),
            document_count: self.document_count,
            ngram: self.ngram,
            stopwords: self.stopwords.clone(),
        })
    }
}

/// One row of the vocabulary table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabEntry<'a> {
    pub term: &'a str,
    pub term_count: u64,
    pub doc_count: u64,
    pub index: u32,
}

/// Finalized, pruned and indexed vocabulary. A term's index is its position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: IndexMap<String, TermStats>,
    document_count: u64,
    ngram: NgramRange,
    stopwords: BTreeSet<String>,
}

/// Equal only when every term sits at the same index.
impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.document_count == other.document_count
            && self.ngram == other.ngram
            && self.stopwords == other.stopwords
            && self.terms.iter().eq(other.terms.iter())
    }
}

impl Vocabulary {
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn index_of(&self, term: &str) -> Option<u32> {
        self.terms.get_index_of(term).map(|i| i as u32)
    }

    pub fn term(&self, index: u32) -> Option<&str> {
        self.terms.get_index(index as usize).map(|(t, _)| t.as_str())
    }

    pub fn stats(&self, term: &str) -> Option<TermStats> {
        self.terms.get(term).copied()
    }

    /// Number of documents the vocabulary was counted over
    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    pub fn ngram(&self) -> NgramRange {
        self.ngram
    }

    pub fn stopwords(&self) -> &BTreeSet<String> {
        &self.stopwords
    }

    /// Table rows in index order
    pub fn iter(&self) -> impl Iterator<Item = VocabEntry<'_>> {
        self.terms.iter().enumerate().map(|(index, (term, stats))| VocabEntry {
            term,
            term_count: stats.term_count,
            doc_count: stats.doc_count,
            index: index as u32,
        })
    }

    /// Terms in index order, used as matrix labels
    pub fn terms(&self) -> Vec<String> {
        self.terms.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn build(texts: &[&str]) -> VocabularyBuilder {
        let mut builder = VocabularyBuilder::new();
        for text in texts {
            builder.update(&tokens(text));
        }
        builder
    }

    #[test]
    fn counts_terms_and_documents() {
        let builder = build(&["the cat sat", "the dog ran", "cat and dog played", "the the"]);

        assert_eq!(builder.document_count(), 4);
        assert_eq!(builder.stats("the"), Some(TermStats { term_count: 4, doc_count: 3 }));
        assert_eq!(builder.stats("cat"), Some(TermStats { term_count: 2, doc_count: 2 }));
        assert_eq!(builder.stats("bird"), None);
    }

    #[test]
    fn indices_follow_frequency_then_lexical_order() {
        let vocab = build(&["b a c", "a c", "a"]).finalize(&PruneRules::default()).unwrap();

        let table: Vec<(&str, u32)> = vocab.iter().map(|e| (e.term, e.index)).collect();
        assert_eq!(table, vec![("a", 0), ("c", 1), ("b", 2)]);
        assert_eq!(vocab.index_of("c"), Some(1));
        assert_eq!(vocab.term(2), Some("b"));
    }

    #[test]
    fn merge_matches_sequential_build() {
        let texts = ["x y z", "y z", "z q", "x x x", "q"];
        let whole = build(&texts);

        let left = build(&texts[..2]);
        let right = build(&texts[2..]);
        let merged_lr = left.clone().merge(right.clone()).unwrap();
        let merged_rl = right.merge(left).unwrap();

        assert_eq!(merged_lr, whole);
        assert_eq!(merged_rl, whole);

        let rules = PruneRules::default();
        assert_eq!(merged_lr.finalize(&rules).unwrap(), whole.finalize(&rules).unwrap());
    }

    #[test]
    fn prune_by_counts_and_proportions() {
        // "the" in all 4 docs, "rare" once
        let builder = build(&["the rare", "the a", "the a b", "the b"]);

        let vocab = builder
            .finalize(&PruneRules::default().with_min_count(2).with_doc_proportion(0.0, 0.75))
            .unwrap();
        assert_eq!(vocab.terms(), vec!["a", "b"]);

        let vocab = builder.finalize(&PruneRules::default().with_max_count(2)).unwrap();
        assert!(vocab.index_of("the").is_none());
        assert!(vocab.index_of("rare").is_some());
    }

    #[test]
    fn vocab_size_cap_keeps_most_frequent() {
        let builder = build(&["a a a b b c d", "d"]);
        let vocab = builder.finalize(&PruneRules::default().with_max_vocab_size(2)).unwrap();
        // a:3, b:2, d:2 -> tie between b and d broken lexically
        assert_eq!(vocab.terms(), vec!["a", "b"]);
    }

    #[test]
    fn stopwords_are_not_counted_and_do_not_split_ngrams() {
        let mut builder = VocabularyBuilder::new()
            .with_ngram(NgramRange::new(1, 2).unwrap())
            .with_stopwords(["of"]);
        builder.update(&tokens("bank of england"));

        assert_eq!(builder.stats("of"), None);
        assert!(builder.stats("bank_england").is_some());
        assert_eq!(builder.term_num(), 3);
    }

    #[test]
    fn equality_takes_index_order_into_account() {
        let json = r#"{"terms":{"a":{"term_count":2,"doc_count":1},"b":{"term_count":1,"doc_count":1}},
            "document_count":1,"ngram":{"min":1,"max":1},"stopwords":[]}"#;
        let swapped = r#"{"terms":{"b":{"term_count":1,"doc_count":1},"a":{"term_count":2,"doc_count":1}},
            "document_count":1,"ngram":{"min":1,"max":1},"stopwords":[]}"#;
        let v: Vocabulary = serde_json::from_str(json).unwrap();
        let w: Vocabulary = serde_json::from_str(swapped).unwrap();

        assert_eq!(v.index_of("a"), Some(0));
        assert_eq!(w.index_of("a"), Some(1));
        assert_ne!(v, w);
        assert_eq!(v, build(&["a a b"]).finalize(&PruneRules::default()).unwrap());
    }

    #[test]
    fn prune_by_minimum_document_proportion() {
        // "the" in all 4 docs, "a" and "b" in 2, "rare" in 1
        let builder = build(&["the rare", "the a", "the a b", "the b"]);

        let vocab = builder
            .finalize(&PruneRules::default().with_doc_proportion(0.5, 1.0))
            .unwrap();
        assert_eq!(vocab.terms(), vec!["the", "a", "b"]);

        let vocab = builder
            .finalize(&PruneRules::default().with_doc_proportion(0.75, 1.0))
            .unwrap();
        assert_eq!(vocab.terms(), vec!["the"]);
    }

    #[test]
    fn merge_rejects_mismatched_settings() {
        let a = VocabularyBuilder::new();
        let b = VocabularyBuilder::new().with_ngram(NgramRange::new(1, 2).unwrap());
        assert!(matches!(a.merge(b), Err(Error::Configuration(_))));
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let builder = build(&["a"]);
        let rules = PruneRules::default().with_doc_proportion(0.8, 0.2);
        assert!(builder.finalize(&rules).is_err());
        let rules = PruneRules::default().with_min_count(5).with_max_count(2);
        assert!(builder.finalize(&rules).is_err());
    }
}
