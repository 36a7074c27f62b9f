use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator placed between the tokens of an n-gram term (`"new_york"`).
pub const NGRAM_SEPARATOR: char = '_';

/// Inclusive range of n-gram orders to emit; `(1, 1)` is unigrams only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramRange {
    pub min: usize,
    pub max: usize,
}

impl Default for NgramRange {
    fn default() -> Self {
        Self { min: 1, max: 1 }
    }
}

impl NgramRange {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min == 0 || self.min > self.max {
            return Err(Error::config(format!(
                "invalid n-gram range ({}, {}): need 1 <= min <= max",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Call `f` once per n-gram occurrence, orders ascending, positions ascending.
    /// The term buffer is reused, so `f` gets a borrowed `&str`.
    pub fn for_each<S, F>(&self, tokens: &[S], mut f: F)
    where
        S: AsRef<str>,
        F: FnMut(&str),
    {
        if self.min == 1 && self.max == 1 {
            tokens.iter().for_each(|t| f(t.as_ref()));
            return;
        }
        let mut term = String::new();
        for n in self.min..=self.max {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                term.clear();
                for (i, token) in window.iter().enumerate() {
                    if i > 0 {
                        term.push(NGRAM_SEPARATOR);
                    }
                    term.push_str(token.as_ref());
                }
                f(&term);
            }
        }
    }
}
