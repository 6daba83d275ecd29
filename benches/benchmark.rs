use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use docattr::construct::{Catalog, Database, RecordType};
use docattr::datatype::AttrValue;
use docattr::definition::AttributeOptions;
use docattr::persist::PersistenceMode;
use docattr::query::json_contains;
use docattr::record::Record;
use serde_json::json;

fn order_type() -> std::sync::Arc<RecordType> {
    RecordType::builder("Order")
        .attribute("status", "string", AttributeOptions::new())
        .unwrap()
        .attribute("quantity", "integer", AttributeOptions::new())
        .unwrap()
        .attribute("placed_at", "datetime", AttributeOptions::new())
        .unwrap()
        .attribute_in("total", "decimal", "billing", AttributeOptions::new())
        .unwrap()
        .build()
        .unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let order_type = order_type();
    let quantity = order_type.registry().lookup("quantity").unwrap().clone();
    let placed_at = order_type.registry().lookup("placed_at").unwrap().clone();

    let raw = AttrValue::from("42");
    c.bench_function("encode integer", |b| b.iter(|| quantity.encode(black_box(&raw))));
    let raw = AttrValue::from("2024-03-01T10:00:00+02:00");
    c.bench_function("encode datetime", |b| b.iter(|| placed_at.encode(black_box(&raw))));

    c.bench_function("build predicate", |b| {
        b.iter(|| {
            order_type.json_attributes_where(black_box([
                ("status", AttrValue::from("active")),
                ("quantity", AttrValue::from(3)),
                ("total", AttrValue::from("19.90")),
            ]))
        })
    });

    let document = json!({
        "status": "active",
        "quantity": 3,
        "tags": ["a", "b", "c", "d"],
        "address": {"city": "Stockholm", "zip": "11122"}
    });
    let fragment = json!({"tags": ["c"], "address": {"city": "Stockholm"}});
    c.bench_function("json_contains", |b| {
        b.iter(|| json_contains(black_box(&document), black_box(&fragment)))
    });

    let mut catalog = Catalog::new();
    catalog.keep(order_type.clone()).unwrap();
    let db = Database::new(catalog, PersistenceMode::InMemory).unwrap();
    for i in 0..1000 {
        let mut order = db.new_record("Order").unwrap();
        order
            .set_attribute("status", if i % 10 == 0 { "active" } else { "closed" })
            .unwrap();
        order.set_attribute("quantity", i).unwrap();
        db.save(&mut order).unwrap();
    }
    c.bench_function("query 1k", |b| {
        b.iter(|| db.json_attributes_where("Order", [("status", "active")]).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
