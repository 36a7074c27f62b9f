/// This crate turns document collections into document-term and term-co-occurrence matrices,
/// streaming the corpus and splitting the work over a pool of workers.
pub mod artifact;
pub mod config;
pub mod corpus;
pub mod error;
pub mod matrix;
pub mod parallel;
pub mod text;
pub mod utils;
pub mod vectorizer;

/// Document Source
/// A lazy, restartable producer of `(id, text)` documents.
/// It is backed either by in-memory texts or by a list of files read through a
/// caller-supplied `Reader`.
///
/// Ids are:
/// - caller supplied and kept verbatim, or
/// - the 1-based position for in-memory texts, or
/// - `<source>_<n>` for file items, `n` being the 1-based position inside the file
///
/// `chunks(n)` splits the source into at most `n` contiguous, disjoint chunks.
/// Files are never split across chunks.
pub use corpus::DocumentSource;

/// Document
/// A single `(id, text)` pair.
pub use corpus::Document;

/// Reader contract for file-backed sources
/// `path -> ordered collection of (optional id, text)`.
/// `corpus::line_reader()` reads one document per line.
pub use corpus::Reader;

/// Text Pipeline
/// Holds an optional normalizer and a tokenizer, both plain `Send + Sync` function values.
/// The default pipeline splits on whitespace and does not normalize.
pub use text::TextPipeline;

/// Token Stream
/// Lazily runs documents through a `TextPipeline`, yielding `TokenizedDoc`s one by one.
pub use text::TokenStream;

/// Vocabulary Builder
/// A single-pass accumulator of term and document counts.
/// Builders made over disjoint parts of a corpus can be merged in any order.
///
/// `finalize(rules)` prunes the counts and assigns indices:
/// descending term count, ties broken by lexical order.
///
/// # Serialization
/// Supported, so partial builders can cross a process boundary.
pub use vectorizer::VocabularyBuilder;

/// Vocabulary
/// Finalized, pruned and indexed table of `(term, term_count, doc_count, index)`.
/// Immutable.
pub use vectorizer::Vocabulary;

/// Pruning bounds applied by `VocabularyBuilder::finalize`
pub use vectorizer::PruneRules;

/// Vectorizer
/// Stateless mapping from a token sequence to a sparse count vector.
/// Implemented by `VocabVectorizer` (vocabulary lookup) and `HashVectorizer`
/// (signed feature hashing into a fixed number of buckets).
pub use vectorizer::{HashVectorizer, VocabVectorizer, Vectorizer};

/// Sparse matrices
/// `Dtm` has one row per document, labelled by document id.
/// `Tcm` is square, labelled by feature.
/// Both are CSR `SparseMatrix` values and can be serialized.
pub use matrix::{Dtm, SparseMatrix, Tcm};

/// Matrix builders
/// Mergeable accumulators behind `Dtm` and `Tcm`.
pub use matrix::{DtmBuilder, TcmBuilder, TcmConfig};

/// Parallel Execution Engine
/// Splits a `DocumentSource` into chunks, runs the whole pipeline over each chunk
/// in a worker of its pool, and merges the partial results in chunk order.
///
/// The result is identical for every chunk count.
/// The first failing chunk fails the whole job with `Error::WorkerFailure`.
pub use parallel::{Engine, ParallelConfig};

/// Progress reporting for `Engine` jobs
pub use parallel::{LogProgress, NoProgress, Progress};

/// All knobs of a run, deserializable from any serde format
pub use config::PipelineConfig;

/// TF-IDF reweighting of a finished `Dtm`
pub use vectorizer::TfIdf;

pub use error::{Error, Result};
