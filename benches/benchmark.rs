use std::sync::Arc;

use corpus_matrix::vectorizer::HashConfig;
use corpus_matrix::{
    DocumentSource, Engine, HashVectorizer, NoProgress, ParallelConfig, PruneRules, TcmConfig,
    TextPipeline, VocabVectorizer, VocabularyBuilder,
};
use criterion::{criterion_group, criterion_main, Criterion};

fn synthetic_corpus(docs: usize, words_per_doc: usize) -> Vec<String> {
    // xorshift, so every run sees the same corpus
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    (0..docs)
        .map(|_| {
            (0..words_per_doc)
                .map(|_| {
                    // skewed toward small ids, like real word frequencies
                    let r = next() % 5000;
                    format!("w{}", r * r / 5000)
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn vectorize_benchmark(c: &mut Criterion) {
    let source = DocumentSource::from_texts(synthetic_corpus(2000, 200));
    let template = VocabularyBuilder::new();
    let rules = PruneRules::default().with_min_count(2);

    for n_chunks in [1, 4, 16] {
        let engine = Engine::new(ParallelConfig::new(n_chunks), TextPipeline::default())
            .expect("worker pool");

        c.bench_function(&format!("vocabulary/{n_chunks}_chunks"), |b| {
            b.iter(|| engine.vocabulary(&source, &template, &rules, &NoProgress).unwrap())
        });

        let vocab = engine.vocabulary(&source, &template, &rules, &NoProgress).unwrap();
        let vectorizer = VocabVectorizer::new(Arc::new(vocab));
        c.bench_function(&format!("dtm/{n_chunks}_chunks"), |b| {
            b.iter(|| engine.dtm(&source, &vectorizer, &NoProgress).unwrap())
        });
        c.bench_function(&format!("tcm/{n_chunks}_chunks"), |b| {
            b.iter(|| {
                engine
                    .tcm(&source, &vectorizer, &TcmConfig::default(), &NoProgress)
                    .unwrap()
            })
        });

        let hashing = HashVectorizer::new(HashConfig::default()).unwrap();
        c.bench_function(&format!("hash_dtm/{n_chunks}_chunks"), |b| {
            b.iter(|| engine.dtm(&source, &hashing, &NoProgress).unwrap())
        });
    }
}

criterion_group!(benches, vectorize_benchmark);
criterion_main!(benches);
