use std::collections::HashMap;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::{SparseMatrix, Tcm};
use crate::text::TokenizedDoc;
use crate::utils::SparseVec;
use crate::vectorizer::Vectorizer;

/// Largest accepted co-occurrence window.
pub const MAX_WINDOW: usize = 1 << 12;

/// Which cell(s) a co-occurring pair of features is counted into.
///
/// For a pair at positions `i < j`, `a` is the feature at `i` and `b` the one at `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PairPolicy {
    /// symmetric, summed into `(min(a, b), max(a, b))`
    #[default]
    Upper,
    /// symmetric, mirrored into `(a, b)` and `(b, a)`; a diagonal pair is counted once
    Full,
    /// directed, `(a, b)`: rows are focus terms, columns their right context
    Right,
    /// directed, `(b, a)`: rows are focus terms, columns their left context
    Left,
}

/// Skip-gram window and weighting of a term-co-occurrence matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcmConfig {
    /// largest positional distance counted as co-occurrence
    pub window: usize,
    /// weight of distance `d` is `weights[d - 1]`; inverse distance when unset
    pub weights: Option<Vec<f64>>,
    pub policy: PairPolicy,
    /// upper bound on every final cell value
    pub cap: Option<f64>,
}

impl Default for TcmConfig {
    fn default() -> Self {
        Self {
            window: 5,
            weights: None,
            policy: PairPolicy::default(),
            cap: None,
        }
    }
}

impl TcmConfig {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_policy(mut self, policy: PairPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cap(mut self, cap: f64) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Weight of a pair `distance` positions apart, `1 <= distance <= window`.
    #[inline]
    pub fn weight(&self, distance: usize) -> f64 {
        match &self.weights {
            Some(w) => w[distance - 1],
            None => 1.0 / distance as f64,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.window == 0 || self.window > MAX_WINDOW {
            return Err(Error::config(format!(
                "co-occurrence window must be in 1..={MAX_WINDOW}, got {}",
                self.window
            )));
        }
        if let Some(weights) = &self.weights {
            if weights.len() != self.window {
                return Err(Error::config(format!(
                    "{} weights given for a window of {}",
                    weights.len(),
                    self.window
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(Error::config("window weights must be finite and non-negative"));
            }
        }
        if let Some(cap) = self.cap {
            if !cap.is_finite() || cap <= 0.0 {
                return Err(Error::config(format!("cap must be positive, got {cap}")));
            }
        }
        Ok(())
    }
}

/// Accumulator for a term-co-occurrence matrix.
///
/// Cells hold integer pair counts per distance, up to the largest distance
/// seen for that cell; weights are applied once in
/// `finish`. Merging partial builders is therefore exact, and the finished
/// matrix does not depend on how the corpus was split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcmBuilder {
    config: TcmConfig,
    n_features: usize,
    cells: HashMap<(u32, u32), Vec<u64>, RandomState>,
}

impl TcmBuilder {
    pub fn new(config: TcmConfig, n_features: usize) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            n_features,
            cells: HashMap::with_hasher(RandomState::new()),
        })
    }

    pub fn config(&self) -> &TcmConfig {
        &self.config
    }

    /// number of non-empty cells before finishing
    pub fn cell_num(&self) -> usize {
        self.cells.len()
    }

    /// Count the pairs of one document.
    ///
    /// Stopwords of the vectorizer are removed first. Tokens without a feature
    /// keep their position, so they still separate their neighbours.
    pub fn update(&mut self, tokens: &[String], vectorizer: &dyn Vectorizer) -> Result<()> {
        let n_features = vectorizer.n_features()?;
        if n_features != self.n_features {
            return Err(Error::config(format!(
                "vectorizer with {n_features} features used on a TCM of {}",
                self.n_features
            )));
        }

        let features: Vec<Option<u32>> = match vectorizer.stopwords() {
            Some(stop) if !stop.is_empty() => tokens
                .iter()
                .filter(|t| !stop.contains(t.as_str()))
                .map(|t| vectorizer.feature_of(t).map(|f| f.index))
                .collect(),
            _ => tokens
                .iter()
                .map(|t| vectorizer.feature_of(t).map(|f| f.index))
                .collect(),
        };

        let window = self.config.window;
        let policy = self.config.policy;
        for (i, a) in features.iter().enumerate() {
            let Some(a) = *a else { continue };
            let end = i.saturating_add(window).min(features.len() - 1);
            for j in i + 1..=end {
                let Some(b) = features[j] else { continue };
                let d = j - i;
                match policy {
                    PairPolicy::Upper => self.bump((a.min(b), a.max(b)), d),
                    PairPolicy::Full => {
                        self.bump((a, b), d);
                        if a != b {
                            self.bump((b, a), d);
                        }
                    }
                    PairPolicy::Right => self.bump((a, b), d),
                    PairPolicy::Left => self.bump((b, a), d),
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn bump(&mut self, cell: (u32, u32), distance: usize) {
        let counts = self.cells.entry(cell).or_default();
        if counts.len() < distance {
            counts.resize(distance, 0);
        }
        counts[distance - 1] += 1;
    }

    /// Run a whole token stream through `update`.
    pub fn consume<I>(mut self, stream: I, vectorizer: &dyn Vectorizer) -> Result<Self>
    where
        I: IntoIterator<Item = Result<TokenizedDoc>>,
    {
        for doc in stream {
            let doc = doc?;
            self.update(&doc.tokens, vectorizer)?;
        }
        Ok(self)
    }

    /// Entry-wise sum of two builders with the same settings.
    pub fn merge(mut self, mut other: TcmBuilder) -> Result<Self> {
        if self.config != other.config || self.n_features != other.n_features {
            return Err(Error::config(
                "cannot merge co-occurrence matrices with different settings",
            ));
        }
        if self.cells.len() < other.cells.len() {
            std::mem::swap(&mut self.cells, &mut other.cells);
        }
        for (cell, counts) in other.cells {
            match self.cells.get_mut(&cell) {
                Some(acc) => {
                    if acc.len() < counts.len() {
                        acc.resize(counts.len(), 0);
                    }
                    acc.iter_mut().zip(counts).for_each(|(a, c)| *a += c);
                }
                None => {
                    self.cells.insert(cell, counts);
                }
            }
        }
        Ok(self)
    }

    /// Apply weights and cap, then freeze into a square CSR matrix.
    pub fn finish(self, labels: Vec<String>) -> Result<Tcm> {
        if labels.len() != self.n_features {
            return Err(Error::config(format!(
                "{} labels for {} features",
                labels.len(),
                self.n_features
            )));
        }
        let config = &self.config;
        let mut entries: Vec<(u32, u32, f64)> = self
            .cells
            .iter()
            .map(|(&(r, c), counts)| {
                // fixed summation order keeps the value independent of merges
                let mut value = counts
                    .iter()
                    .enumerate()
                    .map(|(k, &n)| n as f64 * config.weight(k + 1))
                    .sum::<f64>();
                if let Some(cap) = config.cap {
                    value = value.min(cap);
                }
                (r, c, value)
            })
            .collect();
        entries.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let dim = self.n_features as u32;
        let mut rows: Vec<SparseVec<f64>> = Vec::with_capacity(self.n_features);
        let mut entries = entries.into_iter().peekable();
        for r in 0..dim {
            let mut inds = Vec::new();
            let mut vals = Vec::new();
            while let Some((c, v)) = entries.next_if(|e| e.0 == r).map(|e| (e.1, e.2)) {
                inds.push(c);
                vals.push(v);
            }
            rows.push(SparseVec::from_unsorted(dim, inds, vals));
        }
        Ok(SparseMatrix::from_rows(rows, labels.clone(), labels))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::vectorizer::{PruneRules, VocabVectorizer, VocabularyBuilder};

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn vectorizer(texts: &[&str]) -> VocabVectorizer {
        let mut builder = VocabularyBuilder::new();
        for text in texts {
            builder.update(&tokens(text));
        }
        VocabVectorizer::new(Arc::new(builder.finalize(&PruneRules::default()).unwrap()))
    }

    fn build(texts: &[&str], config: TcmConfig, v: &VocabVectorizer) -> TcmBuilder {
        let mut tcm = TcmBuilder::new(config, v.n_features().unwrap()).unwrap();
        for text in texts {
            tcm.update(&tokens(text), v).unwrap();
        }
        tcm
    }

    fn pair(tcm: &Tcm, a: &str, b: &str) -> f64 {
        tcm.get_by_label(a, b) + tcm.get_by_label(b, a)
    }

    #[test]
    fn window_of_one_counts_adjacent_pairs() {
        let texts = ["the cat sat", "the dog ran", "cat and dog played"];
        let v = vectorizer(&texts);
        let tcm = build(&texts, TcmConfig::new(1), &v)
            .finish(v.feature_labels().unwrap())
            .unwrap();

        assert_eq!(tcm.shape(), (7, 7));
        assert_eq!(pair(&tcm, "the", "cat"), 1.0);
        assert_eq!(pair(&tcm, "cat", "sat"), 1.0);
        assert_eq!(pair(&tcm, "the", "sat"), 0.0);
        // 2 + 2 + 3 adjacent pairs
        assert_eq!(tcm.sum(), 7.0);
    }

    #[test]
    fn inverse_distance_weighting() {
        let v = vectorizer(&["a b c"]);
        let tcm = build(&["a b c"], TcmConfig::new(2), &v)
            .finish(v.feature_labels().unwrap())
            .unwrap();
        assert_eq!(pair(&tcm, "a", "b"), 1.0);
        assert_eq!(pair(&tcm, "a", "c"), 0.5);
    }

    #[test]
    fn custom_weights_and_cap() {
        let v = vectorizer(&["a b a b a b"]);
        let config = TcmConfig::new(2).with_weights(vec![1.0, 0.0]).with_cap(3.0);
        let tcm = build(&["a b a b a b"], config, &v)
            .finish(v.feature_labels().unwrap())
            .unwrap();
        // five adjacent (a, b) pairs, capped
        assert_eq!(pair(&tcm, "a", "b"), 3.0);
        assert_eq!(tcm.get_by_label("a", "a"), 0.0);
    }

    #[test]
    fn pair_policies() {
        let v = vectorizer(&["x y y"]);
        let labels = v.feature_labels().unwrap();
        let run = |policy| {
            build(&["x y"], TcmConfig::new(1).with_policy(policy), &v)
                .finish(labels.clone())
                .unwrap()
        };

        let right = run(PairPolicy::Right);
        assert_eq!(right.get_by_label("x", "y"), 1.0);
        assert_eq!(right.get_by_label("y", "x"), 0.0);

        let left = run(PairPolicy::Left);
        assert_eq!(left.get_by_label("y", "x"), 1.0);
        assert_eq!(left.get_by_label("x", "y"), 0.0);

        let full = run(PairPolicy::Full);
        assert_eq!(full.get_by_label("x", "y"), 1.0);
        assert_eq!(full.get_by_label("y", "x"), 1.0);

        let diagonal = build(&["y y"], TcmConfig::new(1).with_policy(PairPolicy::Full), &v)
            .finish(labels.clone())
            .unwrap();
        assert_eq!(diagonal.get_by_label("y", "y"), 1.0);
        assert_eq!(diagonal.nnz(), 1);
    }

    #[test]
    fn unknown_tokens_keep_their_position() {
        let v = vectorizer(&["a b"]);
        let tcm = build(&["a zzz b"], TcmConfig::new(1), &v)
            .finish(v.feature_labels().unwrap())
            .unwrap();
        assert_eq!(tcm.nnz(), 0);
    }

    #[test]
    fn merge_equals_single_pass() {
        let texts = ["a b c d", "d c b a", "a a b", "c"];
        let v = vectorizer(&texts);
        let labels = v.feature_labels().unwrap();
        let config = TcmConfig::new(3);

        let whole = build(&texts, config.clone(), &v);
        let left = build(&texts[..1], config.clone(), &v);
        let right = build(&texts[1..], config.clone(), &v);
        let merged = right.merge(left).unwrap();

        assert_eq!(merged, whole);
        assert_eq!(merged.finish(labels.clone()).unwrap(), whole.finish(labels).unwrap());
    }

    #[test]
    fn counts_only_grow_to_the_distances_seen() {
        let v = vectorizer(&["a b c"]);
        let tcm = build(&["a b"], TcmConfig::new(MAX_WINDOW), &v);
        assert_eq!(tcm.cell_num(), 1);
        assert!(tcm.cells.values().all(|counts| counts.len() == 1));

        let whole = build(&["a b", "a c b"], TcmConfig::new(MAX_WINDOW), &v);
        let merged = build(&["a c b"], TcmConfig::new(MAX_WINDOW), &v)
            .merge(build(&["a b"], TcmConfig::new(MAX_WINDOW), &v))
            .unwrap();
        assert_eq!(merged, whole);
        let labels = v.feature_labels().unwrap();
        let m = merged.finish(labels).unwrap();
        assert_eq!(pair(&m, "a", "b"), 1.5);
    }

    #[test]
    fn oversized_windows_are_rejected() {
        for window in [MAX_WINDOW + 1, usize::MAX] {
            assert!(matches!(
                TcmBuilder::new(TcmConfig::new(window), 3),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(TcmBuilder::new(TcmConfig::new(0), 3).is_err());
        assert!(TcmBuilder::new(TcmConfig::new(2).with_weights(vec![1.0]), 3).is_err());
        assert!(TcmBuilder::new(TcmConfig::new(2).with_cap(-1.0), 3).is_err());

        let a = TcmBuilder::new(TcmConfig::new(2), 3).unwrap();
        let b = TcmBuilder::new(TcmConfig::new(3), 3).unwrap();
        assert!(matches!(a.merge(b), Err(Error::Configuration(_))));
    }
}
