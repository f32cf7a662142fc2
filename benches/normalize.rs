//! Normalization benchmark: raw JSON → validated records.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fraudshield::normalize::{normalize_batch, normalize_single};
use serde_json::{json, Value};

fn make_rows(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| {
                json!({
                    "user_id": i,
                    "amount": format!("{}.50", i % 900),
                    "hour": i % 24,
                    "merchant_category": "electronics",
                    "device_type": "desktop",
                    "distance_from_home_km": 3.2,
                    "is_foreign": 0,
                    "is_high_risk_merchant": "1",
                    "has_history_of_chargeback": false
                })
            })
            .collect(),
    )
}

fn bench_normalize_single(c: &mut Criterion) {
    let raw = json!({
        "amount": "129.99",
        "merchant_category": "fashion",
        "device_type": "mobile",
        "is_foreign": true
    });

    c.bench_function("normalize_single", |b| {
        b.iter(|| normalize_single(black_box(&raw)).unwrap())
    });
}

fn bench_normalize_batch(c: &mut Criterion) {
    let mut g = c.benchmark_group("normalize_batch");
    for n in [10, 100, 1000] {
        let raw = make_rows(n);
        g.bench_function(format!("rows_{}", n).as_str(), |b| {
            b.iter(|| normalize_batch(black_box(&raw)).unwrap())
        });
    }
    g.finish();
}

criterion_group!(benches, bench_normalize_single, bench_normalize_batch);
criterion_main!(benches);
