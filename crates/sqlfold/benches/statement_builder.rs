use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value as Json, json};
use sqlfold::{Column, Order, RecordSet, ResultFormatter, Value, normalize, select};

/// `[[["col0", "=", 0]], [["col1", "=", 1]], ...]`
fn or_filter(n: usize) -> Json {
    Json::Array((0..n).map(|i| json!([[format!("col{i}"), "=", i]])).collect())
}

fn bench_render_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/render_select");

    for n in [1, 5, 10, 50, 100] {
        let filter = or_filter(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &filter, |b, filter| {
            b.iter(|| {
                let qb = select("t")
                    .fields(["id", "name", "count(o.id) as orders"])
                    .left_join("orders", "o", "o.t_id", "=", "t.id")
                    .conditions(filter)
                    .group("t.id")
                    .order("t.id", Order::Desc)
                    .limit(20);
                black_box(qb.build_sql())
            });
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/normalize");

    for n in [1, 10, 100] {
        let filter = or_filter(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &filter, |b, filter| {
            b.iter(|| black_box(normalize(filter)));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let qb = select("t").field("*").condition("id", "IN", values.clone());
                black_box(qb.build_sql())
            });
        });
    }

    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/format");

    for n in [10, 100, 1000] {
        let mut set = RecordSet::new(vec![
            Column::from_table("post", "id"),
            Column::from_table("post", "title"),
            Column::from_table("tag", "id"),
            Column::from_table("tag", "label"),
        ]);
        for i in 0..n {
            set.push_row(vec![
                Value::Int(i / 4),
                Value::from("title"),
                Value::Int(i),
                Value::from(format!("tag{i}")),
            ]);
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &set, |b, set| {
            b.iter(|| black_box(ResultFormatter::new("post", "id").format(set)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render_select,
    bench_normalize,
    bench_in_list,
    bench_format
);
criterion_main!(benches);
