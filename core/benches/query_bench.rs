use criterion::{criterion_group, criterion_main, Criterion};
use lexsearch_core::{build_snapshot, Document, QueryService, Tokenizer};
use std::sync::Arc;

const WORDS: &[&str] = &[
    "campus", "research", "engineering", "library", "student", "faculty", "admissions", "tuition",
    "housing", "athletics", "chicago", "design", "architecture", "science", "computer", "business",
];

fn synthetic_corpus(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let text: Vec<&str> = (0..40).map(|j| WORDS[(i * 7 + j * 3 + j / 5) % WORDS.len()]).collect();
            Document::new(i as u32, text.join(" "))
        })
        .collect()
}

fn bench_answer(c: &mut Criterion) {
    let snapshot = build_snapshot(&synthetic_corpus(2_000), &Tokenizer::english()).unwrap();
    let svc = QueryService::new(Arc::new(snapshot));
    c.bench_function("answer_2k_docs", |b| b.iter(|| svc.answer(Some("computer science research")).unwrap()));
}

fn bench_build(c: &mut Criterion) {
    let docs = synthetic_corpus(500);
    let tokenizer = Tokenizer::english();
    c.bench_function("build_500_docs", |b| b.iter(|| build_snapshot(&docs, &tokenizer).unwrap()));
}

criterion_group!(benches, bench_answer, bench_build);
criterion_main!(benches);
