pub mod stream;

use std::fmt;
use std::sync::Arc;

pub use stream::{TokenStream, TokenizedDoc};

/// `text -> text`, free of shared mutable state.
pub type Normalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;
/// `text -> ordered tokens`, free of shared mutable state.
pub type Tokenizer = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Preprocess/tokenize stage.
///
/// Both functions are plain values, so one pipeline can be cloned into any
/// number of workers and invoked concurrently.
#[derive(Clone)]
pub struct TextPipeline {
    normalizer: Option<Normalizer>,
    tokenizer: Tokenizer,
}

impl TextPipeline {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            normalizer: None,
            tokenizer,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// normalize then tokenize
    pub fn tokens(&self, text: &str) -> Vec<String> {
        match &self.normalizer {
            Some(normalize) => (self.tokenizer)(&normalize(text)),
            None => (self.tokenizer)(text),
        }
    }
}

impl Default for TextPipeline {
    /// whitespace tokens, no normalization
    fn default() -> Self {
        Self::new(whitespace_tokenizer())
    }
}

impl fmt::Debug for TextPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPipeline")
            .field("normalizer", &self.normalizer.as_ref().map(|_| "<fn>"))
            .field("tokenizer", &"<fn>")
            .finish()
    }
}

pub fn whitespace_tokenizer() -> Tokenizer {
    Arc::new(|text: &str| text.split_whitespace().map(str::to_string).collect())
}

pub fn lowercase() -> Normalizer {
    Arc::new(|text: &str| text.to_lowercase())
}
