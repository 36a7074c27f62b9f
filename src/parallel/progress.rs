use crate::error::Error;

/// Receives job progress from the coordinating thread.
///
/// Passed explicitly to every `Engine` job; all methods default to no-ops.
pub trait Progress {
    fn chunk_started(&self, _chunk: usize, _total: usize) {}

    fn chunk_finished(&self, _chunk: usize, _total: usize) {}

    fn job_failed(&self, _error: &Error) {}
}

/// Reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Reports through `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn chunk_started(&self, chunk: usize, total: usize) {
        tracing::debug!(chunk, total, "chunk started");
    }

    fn chunk_finished(&self, chunk: usize, total: usize) {
        tracing::info!(chunk, total, "chunk finished");
    }

    fn job_failed(&self, error: &Error) {
        tracing::warn!(%error, "job failed");
    }
}
