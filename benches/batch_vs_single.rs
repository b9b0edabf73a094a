use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use spatio_lsm::{BoundingBox, MergeTree};

fn box_at(i: usize) -> BoundingBox {
    let x = (i * 31 % 997) as f64;
    let y = (i * 17 % 991) as f64;
    BoundingBox::new(x, y, x + 1.0, y + 1.0)
}

fn filled(count: usize) -> MergeTree<BoundingBox> {
    let mut tree = MergeTree::new(4, 16).unwrap();
    for i in 0..count {
        tree.insert(box_at(i)).unwrap();
    }
    tree
}

/// Adding a batch to a populated tree: one insert per record versus building
/// the batch as its own tree and merging it in.
fn bench_batch_absorb(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_absorb");
    let base = filled(5_000);

    for batch in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch as u64));

        group.bench_with_input(BenchmarkId::new("single_inserts", batch), batch, |b, &n| {
            b.iter_batched(
                || base.clone(),
                |mut tree| {
                    for i in 0..n {
                        tree.insert(box_at(10_000 + i)).unwrap();
                    }
                    tree
                },
                criterion::BatchSize::LargeInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("tree_merge", batch), batch, |b, &n| {
            b.iter_batched(
                || base.clone(),
                |mut tree| {
                    let mut source = MergeTree::new(4, 16).unwrap();
                    for i in 0..n {
                        source.insert(box_at(10_000 + i)).unwrap();
                    }
                    tree.merge(source);
                    tree
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch_absorb);
criterion_main!(benches);
