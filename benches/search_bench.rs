use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use termdex::{
    AdjacencyMatrixAggregation, BoolQuery, Document, FieldMapping, IndexHandle, IndexMapping,
    MatchAllQuery, MatchQuery, SearchEngine, SearchRequest, SortCriterion, SortOrder,
    TermQuery, TermsAggregation,
};

const NAMES: &[&str] = &["mouse", "mouse pad", "keyboard", "monitor", "headset"];
const WORDS: &[&str] = &[
    "wireless", "ergonomic", "gaming", "mouse", "pad", "keyboard", "mechanical", "quiet",
    "great", "product", "cheap", "durable",
];

struct BenchEnv {
    engine: SearchEngine,
    handle: IndexHandle,
}

fn products_mapping() -> IndexMapping {
    IndexMapping::new()
        .field(FieldMapping::keyword("name"))
        .field(FieldMapping::keyword("tags"))
        .field(FieldMapping::text("description"))
}

fn make_doc(id: u64) -> Document {
    let i = id as usize;
    let description: Vec<&str> = (0..8).map(|n| WORDS[(i * 7 + n * 3) % WORDS.len()]).collect();
    Document::new(id)
        .field("name", NAMES[i % NAMES.len()])
        .field("tags", vec![NAMES[i % NAMES.len()], NAMES[(i / 3) % NAMES.len()]])
        .field("description", description.join(" "))
}

fn build_env(doc_count: usize) -> BenchEnv {
    let engine = SearchEngine::default();
    let handle = engine.create_index("products", products_mapping()).unwrap();
    let docs = (1..=doc_count as u64).map(make_doc).collect();
    engine.index_documents(&handle, docs).unwrap();
    BenchEnv { engine, handle }
}

fn bench_match_search(c: &mut Criterion) {
    let counts = [1_000usize, 10_000];
    let envs: Vec<(usize, BenchEnv)> = counts.iter().map(|&n| (n, build_env(n))).collect();

    let mut group = c.benchmark_group("match_search");
    for (count, env) in envs.iter() {
        let request = SearchRequest::new(MatchQuery::new("description", "wireless gaming mouse"));
        group.bench_with_input(BenchmarkId::from_parameter(count), env, |b, env| {
            b.iter(|| black_box(env.engine.search(&env.handle, &request).unwrap()));
        });
    }
    group.finish();
}

fn bench_bool_sorted_search(c: &mut Criterion) {
    let env = build_env(10_000);
    let query = BoolQuery::new()
        .must(MatchQuery::new("description", "mouse"))
        .filter(TermQuery::new("tags", "mouse pad"));
    let request = SearchRequest::new(query).sort(SortCriterion::field("name", SortOrder::Desc));

    c.bench_function("bool_sorted_search", |b| {
        b.iter(|| black_box(env.engine.search(&env.handle, &request).unwrap()));
    });
}

fn bench_aggregations(c: &mut Criterion) {
    let env = build_env(10_000);

    let mut group = c.benchmark_group("aggregations");
    let terms = SearchRequest::new(MatchAllQuery::new())
        .size(0)
        .aggregation("names", TermsAggregation::new("name"));
    group.bench_function("terms", |b| {
        b.iter(|| black_box(env.engine.search(&env.handle, &terms).unwrap()));
    });

    let matrix = NAMES.iter().fold(AdjacencyMatrixAggregation::new(), |agg, name| {
        agg.filter(*name, TermQuery::new("tags", *name))
    });
    let adjacency = SearchRequest::new(MatchAllQuery::new())
        .size(0)
        .aggregation("matrix", matrix);
    group.bench_function("adjacency_matrix", |b| {
        b.iter(|| black_box(env.engine.search(&env.handle, &adjacency).unwrap()));
    });

    let collapse = SearchRequest::new(MatchAllQuery::new())
        .collapse("name")
        .sort(SortCriterion::id(SortOrder::Desc));
    group.bench_function("collapse", |b| {
        b.iter(|| black_box(env.engine.search(&env.handle, &collapse).unwrap()));
    });
    group.finish();
}

fn bench_bulk_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_indexing");
    for batch in [100usize, 1_000] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.iter_batched(
                || {
                    let engine = SearchEngine::default();
                    let handle = engine.create_index("products", products_mapping()).unwrap();
                    let docs: Vec<Document> = (1..=batch as u64).map(make_doc).collect();
                    (engine, handle, docs)
                },
                |(engine, handle, docs)| black_box(engine.index_documents(&handle, docs).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_match_search,
    bench_bool_sorted_search,
    bench_aggregations,
    bench_bulk_indexing
);
criterion_main!(benches);
