use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matrix::TcmConfig;
use crate::parallel::ParallelConfig;
use crate::vectorizer::{HashConfig, HashVectorizer, NgramRange, PruneRules, VocabularyBuilder};

/// Every knob of a vectorization run in one serde-friendly struct.
///
/// Loading it is left to the caller; any serde format works. Missing fields
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub parallel: ParallelConfig,
    pub prune: PruneRules,
    pub ngram: NgramRange,
    pub stopwords: BTreeSet<String>,
    pub hash: HashConfig,
    pub tcm: TcmConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: ParallelConfig::default(),
            prune: PruneRules::default(),
            ngram: NgramRange::default(),
            stopwords: BTreeSet::new(),
            hash: HashConfig::default(),
            tcm: TcmConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.parallel.validate()?;
        self.prune.validate()?;
        self.ngram.validate()?;
        self.hash.validate()?;
        self.tcm.validate()
    }

    /// Empty builder carrying the n-gram range and stopwords
    pub fn vocabulary_builder(&self) -> VocabularyBuilder {
        VocabularyBuilder::new()
            .with_ngram(self.ngram)
            .with_stopwords(self.stopwords.iter().cloned())
    }

    pub fn hash_vectorizer(&self) -> Result<HashVectorizer> {
        HashVectorizer::new(self.hash.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::matrix::PairPolicy;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{
            "prune": { "min_count": 3, "max_vocab_size": 100 },
            "ngram": { "min": 1, "max": 2 },
            "stopwords": ["the", "a"],
            "tcm": { "window": 2, "policy": "Full" }
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.prune.min_count, 3);
        assert_eq!(config.prune.max_vocab_size, Some(100));
        assert_eq!(config.prune.max_doc_proportion, 1.0);
        assert_eq!(config.tcm.window, 2);
        assert_eq!(config.tcm.policy, PairPolicy::Full);
        assert_eq!(config.hash, HashConfig::default());
        config.validate().unwrap();

        let builder = config.vocabulary_builder();
        assert_eq!(builder.ngram(), NgramRange::new(1, 2).unwrap());
    }

    #[test]
    fn json_roundtrip() {
        let mut config = PipelineConfig::default();
        config.parallel = ParallelConfig::new(4).with_workers(2);
        config.hash.hash_size = 1 << 10;

        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.hash_vectorizer().unwrap().config().hash_size, 1024);
    }

    #[test]
    fn validation_covers_every_section() {
        let mut config = PipelineConfig::default();
        config.tcm.window = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = PipelineConfig::default();
        config.hash.hash_size = 100;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.parallel.n_chunks = 0;
        assert!(config.validate().is_err());
    }
}
