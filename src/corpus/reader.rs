use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One item produced by a reader: optional id plus raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: Option<String>,
    pub text: String,
}

impl RawDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
        }
    }
}

/// Reader contract: `path -> ordered collection of (optional id, text)`.
///
/// The reader owns any file handle it opens and must release it before returning.
pub type Reader = Arc<dyn Fn(&Path) -> io::Result<Vec<RawDocument>> + Send + Sync>;

/// How the `<source-identifier>` part of synthesized ids is derived from a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileIdScheme {
    /// `<file-basename>_<n>`; two files sharing a basename collide, which
    /// surfaces as a duplicate id once a DTM is built
    #[default]
    Basename,
    /// `<full-path>_<n>`
    FullPath,
}

impl FileIdScheme {
    pub fn source_id(&self, path: &Path) -> String {
        match self {
            FileIdScheme::Basename => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            FileIdScheme::FullPath => path.display().to_string(),
        }
    }
}

/// Default reader: one document per line, without ids.
pub fn read_lines(path: &Path) -> io::Result<Vec<RawDocument>> {
    let file = File::open(path)?;
    BufReader::new(file)
        .lines()
        .map(|line| line.map(RawDocument::new))
        .collect()
}

/// `read_lines` as a `Reader` value
pub fn line_reader() -> Reader {
    Arc::new(read_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_lines_keeps_line_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first line").unwrap();
        writeln!(file, "second line").unwrap();

        let docs = read_lines(file.path()).unwrap();

        assert_eq!(docs, vec![RawDocument::new("first line"), RawDocument::new("second line")]);
    }

    #[test]
    fn read_lines_reports_missing_file() {
        let err = read_lines(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn source_id_schemes() {
        let path = Path::new("/data/a/news.txt");
        assert_eq!(FileIdScheme::Basename.source_id(path), "news.txt");
        assert_eq!(FileIdScheme::FullPath.source_id(path), "/data/a/news.txt");
    }
}
