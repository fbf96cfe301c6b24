use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

use tradeerp_validation::{
    Attributes, InMemoryPresenceVerifier, Input, Messages, Rule, Rules, Validator,
};

fn order_rules() -> Rules {
    Rules::new()
        .field("customer_id", [Rule::Required, Rule::Integer, Rule::exists("customers", "id")])
        .field("currency", [Rule::Required, Rule::String, Rule::Between(3.0, 3.0)])
        .field("notes", [Rule::Nullable, Rule::String, Rule::Max(1000.0)])
        .field("items", [Rule::Required, Rule::Array, Rule::Min(1.0)])
        .field(
            "items.*.product_id",
            [Rule::Required, Rule::Integer, Rule::Distinct, Rule::exists("products", "id")],
        )
        .field("items.*.quantity", [Rule::Required, Rule::Integer, Rule::Min(1.0)])
        .field("items.*.unit_price", [Rule::Required, Rule::Numeric, Rule::Min(0.0)])
}

fn order_body(lines: usize) -> Value {
    let items: Vec<Value> = (0..lines)
        .map(|i| json!({"product_id": i + 1, "quantity": 2, "unit_price": "19.99"}))
        .collect();
    json!({"customer_id": 1, "currency": "USD", "notes": "  leave at door ", "items": items})
}

fn verifier(products: usize) -> InMemoryPresenceVerifier {
    let v = InMemoryPresenceVerifier::new().with_row("customers", 1, json!({"name": "Ada"}));
    for id in 1..=products as i64 {
        v.insert("products", id, json!({"sku": format!("SKU-{id}")}));
    }
    v
}

/// Whole-request validation as line count grows (wildcards, distinct, presence).
fn bench_order_validation(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let rules = order_rules();
    let messages = Messages::new();
    let attributes = Attributes::new();

    let mut group = c.benchmark_group("order_validation");
    for lines in [1usize, 10, 50] {
        let verifier = verifier(lines);
        let mut input = Input::from_value(order_body(lines)).unwrap();
        input.normalize();

        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &input, |b, input| {
            b.iter(|| {
                let errors = rt
                    .block_on(
                        Validator::new(&rules, &messages, &attributes)
                            .validate(black_box(input), &verifier),
                    )
                    .unwrap();
                assert!(errors.is_empty());
            });
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let body = order_body(50);
    c.bench_function("normalize_50_lines", |b| {
        b.iter(|| {
            let mut input = Input::from_value(black_box(body.clone())).unwrap();
            input.normalize();
            input
        });
    });
}

criterion_group!(benches, bench_order_validation, bench_normalize);
criterion_main!(benches);
