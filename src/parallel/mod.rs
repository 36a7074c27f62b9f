pub mod progress;

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::corpus::{Chunk, DocumentSource};
use crate::error::{Error, Result};
use crate::matrix::{Dtm, DtmBuilder, Tcm, TcmBuilder, TcmConfig};
use crate::text::{TextPipeline, TokenStream};
use crate::vectorizer::{PruneRules, Vectorizer, Vocabulary, VocabularyBuilder};
pub use progress::{LogProgress, NoProgress, Progress};

/// Parallel granularity of an `Engine`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// number of chunks the corpus is split into
    pub n_chunks: usize,
    /// worker threads; the rayon default when unset
    pub n_workers: Option<usize>,
    /// ship partial results between workers and coordinator as CBOR bytes
    pub serialize_partials: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            n_chunks: rayon::current_num_threads(),
            n_workers: None,
            serialize_partials: false,
        }
    }
}

impl ParallelConfig {
    pub fn new(n_chunks: usize) -> Self {
        Self {
            n_chunks,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = Some(n_workers);
        self
    }

    pub fn with_serialized_partials(mut self, serialize: bool) -> Self {
        self.serialize_partials = serialize;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_chunks == 0 {
            return Err(Error::config("n_chunks must be at least 1"));
        }
        if self.n_workers == Some(0) {
            return Err(Error::config("n_workers must be at least 1"));
        }
        Ok(())
    }
}

/// Chunk-local result of a job. Merging must be associative and commutative
/// over the quantities it accumulates.
pub trait Partial: Serialize + DeserializeOwned + Send + 'static {
    fn merge(self, other: Self) -> Result<Self>;
}

impl Partial for VocabularyBuilder {
    fn merge(self, other: Self) -> Result<Self> {
        VocabularyBuilder::merge(self, other)
    }
}

impl Partial for DtmBuilder {
    fn merge(self, other: Self) -> Result<Self> {
        DtmBuilder::merge(self, other)
    }
}

impl Partial for TcmBuilder {
    fn merge(self, other: Self) -> Result<Self> {
        TcmBuilder::merge(self, other)
    }
}

enum Payload<T> {
    Value(T),
    Bytes(Vec<u8>),
}

impl<T: Partial> Payload<T> {
    fn open(self) -> Result<T> {
        match self {
            Payload::Value(partial) => Ok(partial),
            Payload::Bytes(bytes) => Ok(serde_cbor::from_slice(&bytes)?),
        }
    }
}

enum Message<T> {
    Started(usize),
    Finished(usize, Result<Payload<T>>),
}

/// Fork-join driver.
///
/// A job splits the source into chunks and queues them. Workers of a rayon
/// pool pull chunks from the queue, run the whole pipeline over each one in
/// private state and send the partial back. The calling thread merges the
/// partials in ascending chunk order, so the result is the same for every
/// chunk and worker count.
///
/// The first failure fails the job: chunks still queued are discarded and
/// results still in flight are ignored.
#[derive(Debug)]
pub struct Engine {
    config: ParallelConfig,
    pipeline: TextPipeline,
    pool: rayon::ThreadPool,
}

impl Engine {
    pub fn new(config: ParallelConfig, pipeline: TextPipeline) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_workers.unwrap_or(0))
            .thread_name(|i| format!("corpus-worker-{i}"))
            .build()
            .map_err(|e| Error::config(format!("cannot start worker pool: {e}")))?;
        Ok(Self {
            config,
            pipeline,
            pool,
        })
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &TextPipeline {
        &self.pipeline
    }

    /// Merged, unpruned term counts. Each chunk starts from an empty builder
    /// with the n-gram and stopword settings of `template`.
    pub fn vocabulary_counts(
        &self,
        source: &DocumentSource,
        template: &VocabularyBuilder,
        progress: &dyn Progress,
    ) -> Result<VocabularyBuilder> {
        self.run(source, progress, |chunk, pipeline| {
            template
                .empty_like()
                .consume(TokenStream::new(chunk.documents(), pipeline))
        })
    }

    /// Count, merge, then prune and index once.
    pub fn vocabulary(
        &self,
        source: &DocumentSource,
        template: &VocabularyBuilder,
        rules: &PruneRules,
        progress: &dyn Progress,
    ) -> Result<Vocabulary> {
        rules.validate()?;
        self.vocabulary_counts(source, template, progress)?
            .finalize(rules)
    }

    /// Document-term matrix with one row per document in corpus order.
    pub fn dtm(
        &self,
        source: &DocumentSource,
        vectorizer: &dyn Vectorizer,
        progress: &dyn Progress,
    ) -> Result<Dtm> {
        let n_features = vectorizer.n_features()?;
        let labels = vectorizer.feature_labels()?;
        let dtm = self.run(source, progress, |chunk, pipeline| {
            DtmBuilder::new(n_features)
                .consume(TokenStream::new(chunk.documents(), pipeline), vectorizer)
        })?;
        dtm.finish(labels)
    }

    /// Term-co-occurrence matrix over the features of `vectorizer`.
    pub fn tcm(
        &self,
        source: &DocumentSource,
        vectorizer: &dyn Vectorizer,
        config: &TcmConfig,
        progress: &dyn Progress,
    ) -> Result<Tcm> {
        config.validate()?;
        let n_features = vectorizer.n_features()?;
        let labels = vectorizer.feature_labels()?;
        let tcm = self.run(source, progress, |chunk, pipeline| {
            TcmBuilder::new(config.clone(), n_features)?
                .consume(TokenStream::new(chunk.documents(), pipeline), vectorizer)
        })?;
        tcm.finish(labels)
    }

    fn run<T, F>(&self, source: &DocumentSource, progress: &dyn Progress, work: F) -> Result<T>
    where
        T: Partial,
        F: Fn(&Chunk, &TextPipeline) -> Result<T> + Sync,
    {
        let chunks = source.chunks(self.config.n_chunks)?;
        let origins: Vec<String> = chunks.iter().map(Chunk::origin).collect();
        let n_workers = self.pool.current_num_threads().min(chunks.len());
        tracing::debug!(chunks = chunks.len(), workers = n_workers, "starting job");

        let (task_tx, task_rx) = unbounded::<Chunk>();
        for chunk in chunks {
            task_tx
                .send(chunk)
                .map_err(|_| Error::config("task queue closed before the job started"))?;
        }
        drop(task_tx);

        let (result_tx, result_rx) = unbounded::<Message<T>>();
        let serialize = self.config.serialize_partials;
        let pipeline = &self.pipeline;
        let work = &work;

        self.pool.in_place_scope(|scope| {
            for _ in 0..n_workers {
                let tasks = task_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move |_| work_loop(tasks, results, pipeline, work, serialize));
            }
            drop(result_tx);
            coordinate(result_rx, &task_rx, &origins, progress)
        })
    }
}

fn work_loop<T, F>(
    tasks: Receiver<Chunk>,
    results: Sender<Message<T>>,
    pipeline: &TextPipeline,
    work: &F,
    serialize: bool,
) where
    T: Partial,
    F: Fn(&Chunk, &TextPipeline) -> Result<T> + Sync,
{
    for chunk in tasks.iter() {
        let index = chunk.index();
        if results.send(Message::Started(index)).is_err() {
            return;
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&chunk, pipeline)))
            .unwrap_or_else(|payload| Err(Error::Panic(panic_message(payload.as_ref()))))
            .and_then(|partial| {
                if serialize {
                    Ok(Payload::Bytes(serde_cbor::to_vec(&partial)?))
                } else {
                    Ok(Payload::Value(partial))
                }
            });
        // the chunk (and any file it read) is released here
        drop(chunk);
        if results.send(Message::Finished(index, outcome)).is_err() {
            return;
        }
    }
}

fn coordinate<T: Partial>(
    results: Receiver<Message<T>>,
    tasks: &Receiver<Chunk>,
    origins: &[String],
    progress: &dyn Progress,
) -> Result<T> {
    let total = origins.len();
    let mut ready: BTreeMap<usize, T> = BTreeMap::new();
    let mut next = 0;
    let mut merged: Option<T> = None;
    let mut failure: Option<Error> = None;

    // ends once every worker has exited
    for message in results {
        let (chunk, outcome) = match message {
            Message::Started(chunk) => {
                if failure.is_none() {
                    progress.chunk_started(chunk, total);
                }
                continue;
            }
            Message::Finished(chunk, outcome) => (chunk, outcome),
        };
        if failure.is_some() {
            continue;
        }

        let step = outcome
            .and_then(Payload::open)
            .map_err(|e| e.in_worker(chunk, origins[chunk].clone()))
            .and_then(|partial| {
                progress.chunk_finished(chunk, total);
                ready.insert(chunk, partial);
                while let Some(partial) = ready.remove(&next) {
                    merged = Some(match merged.take() {
                        None => partial,
                        Some(acc) => acc.merge(partial)?,
                    });
                    next += 1;
                }
                Ok(())
            });

        if let Err(error) = step {
            let discarded = tasks.try_iter().count();
            tracing::warn!(chunk, discarded, %error, "aborting job");
            progress.job_failed(&error);
            ready.clear();
            merged = None;
            failure = Some(error);
        }
    }

    match failure {
        Some(error) => Err(error),
        None => {
            tracing::debug!(chunks = total, "job finished");
            merged.ok_or_else(|| Error::config("job produced no partial result"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
