pub mod reader;

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{slice, vec};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
pub use reader::{line_reader, read_lines, FileIdScheme, RawDocument, Reader};

/// A single document of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Lazy, restartable producer of documents.
///
/// In-memory sources hold their documents behind an `Arc` so chunks share them
/// without copying. File-backed sources only hold paths; a file is opened by
/// whichever chunk it belongs to, when that chunk is traversed.
///
/// Every traversal yields each document exactly once, in the same order.
#[derive(Clone)]
pub struct DocumentSource {
    kind: SourceKind,
}

#[derive(Clone)]
enum SourceKind {
    Memory(Arc<Vec<Document>>),
    Files {
        paths: Arc<Vec<PathBuf>>,
        reader: Reader,
        scheme: FileIdScheme,
    },
}

impl DocumentSource {
    /// In-memory texts; ids are the 1-based positions (`"1"`, `"2"`, ...).
    pub fn from_texts<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let docs = texts
            .into_iter()
            .enumerate()
            .map(|(pos, text)| Document::new((pos + 1).to_string(), text))
            .collect();
        Self {
            kind: SourceKind::Memory(Arc::new(docs)),
        }
    }

    /// In-memory documents with explicit ids, preserved verbatim.
    /// An empty id is rejected, as it is for reader items.
    pub fn from_documents<I>(docs: I) -> Result<Self>
    where
        I: IntoIterator<Item = Document>,
    {
        let docs: Vec<Document> = docs.into_iter().collect();
        if let Some(pos) = docs.iter().position(|d| d.id.is_empty()) {
            return Err(Error::config(format!(
                "document at position {} has an empty id",
                pos + 1
            )));
        }
        Ok(Self {
            kind: SourceKind::Memory(Arc::new(docs)),
        })
    }

    /// File-backed corpus. Each path is handed to `reader`; items it returns
    /// without an id get `<basename>_<n>` (`n` 1-based within the file).
    pub fn from_files<I, P>(paths: I, reader: Reader) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::from_files_with_scheme(paths, reader, FileIdScheme::default())
    }

    pub fn from_files_with_scheme<I, P>(paths: I, reader: Reader, scheme: FileIdScheme) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        Self {
            kind: SourceKind::Files {
                paths: Arc::new(paths),
                reader,
                scheme,
            },
        }
    }

    /// Number of units a chunk can be cut from: documents for in-memory
    /// sources, files for file-backed ones.
    pub fn units(&self) -> usize {
        match &self.kind {
            SourceKind::Memory(docs) => docs.len(),
            SourceKind::Files { paths, .. } => paths.len(),
        }
    }

    /// Single traversal over the whole corpus.
    pub fn iter(&self) -> Documents<'_> {
        self.kind.documents(0..self.units())
    }

    /// Split into `min(n_chunks, units)` contiguous, disjoint chunks covering
    /// the whole corpus; sizes differ by at most one. Files are never split.
    /// An empty corpus yields one empty chunk.
    pub fn chunks(&self, n_chunks: usize) -> Result<Vec<Chunk>> {
        if n_chunks == 0 {
            return Err(Error::config("n_chunks must be at least 1"));
        }
        let units = self.units();
        if units == 0 {
            return Ok(vec![self.chunk(0, 0..0)]);
        }
        let n = n_chunks.min(units);
        let (base, extra) = (units / n, units % n);
        let mut start = 0;
        Ok((0..n)
            .map(|index| {
                // the first `extra` chunks take one more unit
                let len = base + usize::from(index < extra);
                let chunk = self.chunk(index, start..start + len);
                start += len;
                chunk
            })
            .collect())
    }

    fn chunk(&self, index: usize, range: Range<usize>) -> Chunk {
        Chunk {
            index,
            range,
            kind: self.kind.clone(),
        }
    }
}

/// Contiguous slice of a `DocumentSource`, owned by one worker.
#[derive(Clone)]
pub struct Chunk {
    index: usize,
    range: Range<usize>,
    kind: SourceKind,
}

impl Chunk {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human readable identity used to tag failures.
    pub fn origin(&self) -> String {
        match &self.kind {
            SourceKind::Memory(_) => {
                format!("documents {}..{}", self.range.start, self.range.end)
            }
            SourceKind::Files { paths, .. } => match &paths[self.range.clone()] {
                [] => "no files".to_string(),
                [one] => one.display().to_string(),
                [first, .., last] => format!("{} .. {}", first.display(), last.display()),
            },
        }
    }

    /// Traverse the chunk. File handles are acquired one file at a time.
    pub fn documents(&self) -> Documents<'_> {
        self.kind.documents(self.range.clone())
    }
}

impl SourceKind {
    fn documents(&self, range: Range<usize>) -> Documents<'_> {
        match self {
            SourceKind::Memory(docs) => Documents::Memory(docs[range].iter()),
            SourceKind::Files {
                paths,
                reader,
                scheme,
            } => Documents::Files(FileDocuments {
                paths: paths[range].iter(),
                reader,
                scheme: *scheme,
                pending: Vec::new().into_iter(),
                source_id: String::new(),
                seq: 0,
                failed: false,
            }),
        }
    }
}

/// Iterator over the documents of a source or chunk.
pub enum Documents<'a> {
    Memory(slice::Iter<'a, Document>),
    Files(FileDocuments<'a>),
}

impl Iterator for Documents<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Documents::Memory(iter) => iter.next().cloned().map(Ok),
            Documents::Files(files) => files.next(),
        }
    }
}

/// Reads one file at a time through the reader; stops after the first failure.
pub struct FileDocuments<'a> {
    paths: slice::Iter<'a, PathBuf>,
    reader: &'a Reader,
    scheme: FileIdScheme,
    pending: vec::IntoIter<RawDocument>,
    source_id: String,
    seq: usize,
    failed: bool,
}

impl Iterator for FileDocuments<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(raw) = self.pending.next() {
                self.seq += 1;
                let id = match raw.id {
                    Some(id) if id.is_empty() => {
                        self.failed = true;
                        return Some(Err(Error::Reader {
                            source_id: self.source_id.clone(),
                            reason: format!("item {} has an empty id", self.seq),
                        }));
                    }
                    Some(id) => id,
                    None => format!("{}_{}", self.source_id, self.seq),
                };
                return Some(Ok(Document { id, text: raw.text }));
            }

            let path = self.paths.next()?;
            match (self.reader)(path) {
                Ok(items) => {
                    tracing::debug!(path = %path.display(), documents = items.len(), "read source file");
                    self.source_id = self.scheme.source_id(path);
                    self.seq = 0;
                    self.pending = items.into_iter();
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(Error::reader(path, e)));
                }
            }
        }
    }
}
