use std::hash::Hasher;

use fnv::FnvHasher;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vectorizer::{Feature, NgramRange, Vectorizer};

/// Settings of the hashing vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    /// number of buckets, a power of two
    pub hash_size: usize,
    pub ngram: NgramRange,
    /// use the top hash bit as the sign of each increment
    pub signed: bool,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            hash_size: 1 << 18,
            ngram: NgramRange::default(),
            signed: true,
        }
    }
}

impl HashConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hash_size == 0 || !self.hash_size.is_power_of_two() {
            return Err(Error::config(format!(
                "hash_size must be a power of two, got {}",
                self.hash_size
            )));
        }
        if self.hash_size > u32::MAX as usize {
            return Err(Error::config("hash_size does not fit a 32-bit feature index"));
        }
        self.ngram.validate()
    }
}

/// Vocabulary-free vectorizer: each term is hashed into one of `hash_size` buckets.
///
/// Needs no pass over the corpus, the dimension is fixed up front.
#[derive(Debug, Clone)]
pub struct HashVectorizer {
    config: HashConfig,
    mask: u64,
}

impl HashVectorizer {
    pub fn new(config: HashConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mask: config.hash_size as u64 - 1,
            config,
        })
    }

    pub fn config(&self) -> &HashConfig {
        &self.config
    }

    #[inline]
    fn hash(term: &str) -> u64 {
        let mut hasher = FnvHasher::default();
        hasher.write(term.as_bytes());
        hasher.finish()
    }
}

impl Vectorizer for HashVectorizer {
    fn n_features(&self) -> Result<usize> {
        Ok(self.config.hash_size)
    }

    #[inline]
    fn feature_of(&self, term: &str) -> Option<Feature> {
        let h = Self::hash(term);
        // bucket from the low bits, sign from the top bit
        let sign = if self.config.signed && (h >> 63) == 1 { -1 } else { 1 };
        Some(Feature {
            index: (h & self.mask) as u32,
            sign,
        })
    }

    fn ngram(&self) -> NgramRange {
        self.config.ngram
    }

    fn feature_labels(&self) -> Result<Vec<String>> {
        Ok((0..self.config.hash_size).map(|i| i.to_string()).collect())
    }
}
