use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rangecalc_common::CellValue;
use rangecalc_eval::engine::{RangeView, SearchCache};
use rangecalc_eval::locale::Locale;
use rangecalc_eval::search::{Lane, SearchDirection, SearchMode, dichotomic_search, linear_search};
use rangecalc_eval::sort::{SortCriterion, SortOrder, sort_permutation};

fn sorted_column(n: usize) -> RangeView<'static> {
    RangeView::from_column((0..n).map(|i| CellValue::Number(i as f64)).collect())
}

fn text_column(n: usize) -> RangeView<'static> {
    RangeView::from_column((0..n).map(|i| CellValue::Text(format!("item-{i:06}"))).collect())
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Search");
    let locale = Locale::invariant();
    let sizes = [1_000, 50_000];

    for n in sizes.iter() {
        let numbers = sorted_column(*n);
        let texts = text_column(*n);

        // --- 1. DICHOTOMIC ---
        // O(log n) probes, no materialization.
        group.bench_with_input(BenchmarkId::new("Dichotomic/NextSmaller", n), n, |b, &n| {
            let key = CellValue::Number(n as f64 * 0.73);
            b.iter(|| {
                dichotomic_search(
                    &numbers,
                    Lane::Col(0),
                    black_box(&key),
                    SearchMode::NextSmaller,
                    SortOrder::Ascending,
                    &locale,
                )
            })
        });

        // --- 2. LINEAR, COLD ---
        // Every probe rebuilds the exact-match index.
        group.bench_with_input(BenchmarkId::new("Linear/Uncached", n), n, |b, &n| {
            let key = CellValue::Text(format!("item-{:06}", n - 1));
            b.iter_batched(
                || SearchCache::new(0),
                |mut cache| {
                    linear_search(
                        &texts,
                        Lane::Col(0),
                        black_box(&key),
                        SearchMode::Strict,
                        SearchDirection::Forward,
                        &locale,
                        &mut cache,
                    )
                },
                BatchSize::SmallInput,
            )
        });

        // --- 3. LINEAR, MEMOIZED ---
        // The pass cache answers repeated probes from one index.
        let mut cache = SearchCache::new(512);
        group.bench_with_input(BenchmarkId::new("Linear/Cached", n), n, |b, &n| {
            let key = CellValue::Text(format!("item-{:06}", n / 2));
            b.iter(|| {
                linear_search(
                    &texts,
                    Lane::Col(0),
                    black_box(&key),
                    SearchMode::Strict,
                    SearchDirection::Forward,
                    &locale,
                    &mut cache,
                )
            })
        });

        // --- 4. WILDCARD ---
        group.bench_with_input(BenchmarkId::new("Linear/Wildcard", n), n, |b, _| {
            let key = CellValue::from("item-0*9?");
            b.iter_batched(
                || SearchCache::new(0),
                |mut cache| {
                    linear_search(
                        &texts,
                        Lane::Col(0),
                        black_box(&key),
                        SearchMode::Wildcard,
                        SearchDirection::Reverse,
                        &locale,
                        &mut cache,
                    )
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sort");
    let locale = Locale::invariant();
    let n = 50_000;
    let rows = RangeView::from_rows(
        (0..n)
            .map(|i| {
                vec![
                    CellValue::Number(((i * 7919) % 1000) as f64),
                    CellValue::Text(format!("k{}", (i * 31) % 97)),
                ]
            })
            .collect(),
    );
    let criteria = [
        SortCriterion::column(0, SortOrder::Descending),
        SortCriterion::column(1, SortOrder::Ascending),
    ];
    group.bench_function(BenchmarkId::new("Permutation/TwoKeys", n), |b| {
        b.iter(|| sort_permutation(black_box(&rows), &criteria, &locale))
    });
    group.finish();
}

criterion_group!(benches, bench_search, bench_sort);
criterion_main!(benches);
