use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use marksync::models::{Bookmark, ChangeEvent};
use marksync::poll::diff_snapshots;
use marksync::reconcile;

fn collection(size: usize) -> Vec<Bookmark> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let rows = (0..size)
        .map(|i| {
            Bookmark::new(
                format!("b{}", i),
                "u1",
                format!("https://example.com/{}", i),
                format!("Title {}", i),
                start + Duration::minutes(i as i64),
            )
        })
        .collect();
    reconcile::from_snapshot(rows, "u1")
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    for size in [100, 1_000, 10_000] {
        let base = collection(size);
        let newest = Bookmark::new(
            "fresh",
            "u1",
            "https://fresh.example",
            "Fresh",
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        );
        let insert = ChangeEvent::Insert(newest);
        let middle = base[size / 2].clone();
        let update = ChangeEvent::Update(Bookmark {
            title: "Renamed".to_string(),
            ..middle.clone()
        });
        let delete = ChangeEvent::Delete { id: middle.id.clone() };

        group.bench_with_input(BenchmarkId::new("insert_head", size), &insert, |b, event| {
            b.iter_with_setup(|| base.clone(), |coll| reconcile::apply(coll, "u1", black_box(event)));
        });
        group.bench_with_input(BenchmarkId::new("update_middle", size), &update, |b, event| {
            b.iter_with_setup(|| base.clone(), |coll| reconcile::apply(coll, "u1", black_box(event)));
        });
        group.bench_with_input(BenchmarkId::new("delete_middle", size), &delete, |b, event| {
            b.iter_with_setup(|| base.clone(), |coll| reconcile::apply(coll, "u1", black_box(event)));
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for size in [1_000, 10_000] {
        let base = collection(size);
        let mut shuffled = base.clone();
        shuffled.reverse();

        group.bench_with_input(BenchmarkId::new("from_snapshot", size), &shuffled, |b, rows| {
            b.iter_with_setup(|| rows.clone(), |rows| reconcile::from_snapshot(rows, "u1"));
        });

        let mut next = base.clone();
        next.truncate(size - 10);
        next[0].title = "Changed".to_string();
        group.bench_with_input(BenchmarkId::new("diff", size), &next, |b, next| {
            b.iter(|| diff_snapshots(black_box(&base), black_box(next)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_apply, bench_snapshot);
criterion_main!(benches);
