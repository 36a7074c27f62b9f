use std::path::Path;

/// Errors produced while reading, vectorizing or merging a corpus.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// invalid chunk count, window, hash size, prune bounds ...
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O failure or malformed output of a reader, tagged with the source it came from
    #[error("reader error in {source_id}: {reason}")]
    Reader { source_id: String, reason: String },

    #[error("duplicate document id: {0}")]
    DuplicateId(String),

    #[error("vocabulary vectorizer used before a vocabulary was fitted")]
    VocabularyNotFinalized,

    /// A failure raised inside a parallel worker.
    /// `origin` names the file (or document range) the chunk was built from.
    #[error("worker for chunk {chunk} ({origin}) failed: {source}")]
    WorkerFailure {
        chunk: usize,
        origin: String,
        #[source]
        source: Box<Error>,
    },

    /// a worker panicked; the payload message when it was a string
    #[error("worker panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_cbor::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub(crate) fn reader(path: &Path, reason: impl ToString) -> Self {
        Error::Reader {
            source_id: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// The error underneath any `WorkerFailure` wrapping
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::WorkerFailure { source, .. } => source.root_cause(),
            e => e,
        }
    }

    /// Wrap an error raised while processing `chunk`.
    /// Errors that are already worker failures are passed through untouched.
    pub(crate) fn in_worker(self, chunk: usize, origin: impl Into<String>) -> Self {
        match self {
            e @ Error::WorkerFailure { .. } => e,
            e => Error::WorkerFailure {
                chunk,
                origin: origin.into(),
                source: Box::new(e),
            },
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
