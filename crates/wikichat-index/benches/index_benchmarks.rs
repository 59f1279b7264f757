//! Benchmarks for the local parts of the index pipeline: chunking the page
//! and searching the vector index. Network-bound steps (page fetch,
//! embeddings, completions) are not measured.
//!
//! ```bash
//! cargo bench -p wikichat-index
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uuid::Uuid;

use wikichat_index::embedding::{EmbeddingService, MockEmbedding};
use wikichat_index::index::VectorIndex;
use wikichat_index::splitter::SentenceSplitter;

/// Paragraphs of article-like prose, roughly the size of a long Wikipedia page.
fn article_text(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "Section {i} describes the company history in detail. The firm was \
                 founded by former database engineers and grew quickly. Revenue rose \
                 each fiscal year while the product expanded to new cloud providers. \
                 Analysts noted the consumption based pricing model. Paragraph {i} ends here."
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn bench_chunking(c: &mut Criterion) {
    let text = article_text(400);
    let splitter = SentenceSplitter::new(1024, 20).expect("valid splitter");

    c.bench_function("split_article_1024_units", |b| {
        b.iter(|| splitter.split_text(black_box(&text)))
    });
}

fn bench_vector_search(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");
    let embedder = MockEmbedding::new();
    let index = VectorIndex::new();

    let splitter = SentenceSplitter::new(64, 4).expect("valid splitter");
    let chunks = splitter.split_text(&article_text(200));
    rt.block_on(async {
        for (i, chunk) in chunks.iter().enumerate() {
            let embedding = embedder.embed(chunk).await.expect("embed chunk");
            index
                .insert(Uuid::new_v4(), embedding, i)
                .expect("insert chunk");
        }
    });

    let query = rt
        .block_on(embedder.embed("When was the company founded?"))
        .expect("embed query");

    c.bench_function("vector_search_top2", |b| {
        b.iter(|| index.search(black_box(&query), 2).expect("search"))
    });
}

criterion_group!(benches, bench_chunking, bench_vector_search);
criterion_main!(benches);
