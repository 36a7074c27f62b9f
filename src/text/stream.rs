use crate::corpus::Document;
use crate::error::Result;
use crate::text::TextPipeline;

/// `(id, tokens)` of a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedDoc {
    pub id: String,
    pub tokens: Vec<String>,
}

/// Lazily runs each document through normalize -> tokenize.
///
/// Only the current document's tokens are alive at any time. The stream is
/// consumed once; re-traverse the `DocumentSource` to start over.
pub struct TokenStream<'p, I> {
    docs: I,
    pipeline: &'p TextPipeline,
}

impl<'p, I> TokenStream<'p, I>
where
    I: Iterator<Item = Result<Document>>,
{
    pub fn new(docs: I, pipeline: &'p TextPipeline) -> Self {
        Self { docs, pipeline }
    }
}

impl<I> Iterator for TokenStream<'_, I>
where
    I: Iterator<Item = Result<Document>>,
{
    type Item = Result<TokenizedDoc>;

    fn next(&mut self) -> Option<Self::Item> {
        self.docs.next().map(|doc| {
            doc.map(|Document { id, text }| TokenizedDoc {
                tokens: self.pipeline.tokens(&text),
                id,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DocumentSource;
    use crate::text::lowercase;

    #[test]
    fn yields_tokens_in_document_order() {
        let source = DocumentSource::from_texts(["The cat", "A Dog ran"]);
        let pipeline = TextPipeline::default().with_normalizer(lowercase());

        let docs: Vec<TokenizedDoc> = TokenStream::new(source.iter(), &pipeline)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            docs,
            vec![
                TokenizedDoc { id: "1".into(), tokens: vec!["the".into(), "cat".into()] },
                TokenizedDoc { id: "2".into(), tokens: vec!["a".into(), "dog".into(), "ran".into()] },
            ]
        );
    }

    #[test]
    fn restarting_requires_a_new_traversal() {
        let source = DocumentSource::from_texts(["x y"]);
        let pipeline = TextPipeline::default();

        let mut stream = TokenStream::new(source.iter(), &pipeline);
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());

        let again = TokenStream::new(source.iter(), &pipeline).count();
        assert_eq!(again, 1);
    }
}
