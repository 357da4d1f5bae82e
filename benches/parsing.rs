use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use tomldec::{decode, from_str, parse, to_string};

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize)]
struct Catalog {
    title: String,
    product: Vec<Product>,
}

fn catalog(size: u32) -> Catalog {
    Catalog {
        title: "bench".to_string(),
        product: (0..size)
            .map(|i| Product {
                sku: format!("SKU{}", i),
                name: format!("Product {}", i),
                price: 9.99 + f64::from(i),
                quantity: i,
            })
            .collect(),
    }
}

const CONFIG: &str = r#"
title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00

[database]
enabled = true
ports = [ 8000, 8001, 8002 ]
temp_targets = { cpu = 79.5, case = 72.0 }

[servers.alpha]
ip = "10.0.0.1"
role = "frontend"

[servers.beta]
ip = "10.0.0.2"
role = "backend"
"#;

fn benchmark_parse_config(c: &mut Criterion) {
    c.bench_function("parse_config", |b| b.iter(|| parse(black_box(CONFIG))));
}

fn benchmark_decode_config(c: &mut Criterion) {
    c.bench_function("decode_config_into_value", |b| {
        b.iter(|| decode::<tomldec::Table>(black_box(CONFIG)))
    });
}

fn benchmark_parse_array_of_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_array_of_tables");

    for size in [10, 50, 100, 500].iter() {
        let text = to_string(&catalog(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| parse(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_decode_array_of_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_array_of_tables");

    for size in [10, 50, 100, 500].iter() {
        let text = to_string(&catalog(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| from_str::<Catalog>(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_encode(c: &mut Criterion) {
    let data = catalog(100);
    c.bench_function("encode_catalog_100", |b| b.iter(|| to_string(black_box(&data))));
}

criterion_group!(
    benches,
    benchmark_parse_config,
    benchmark_decode_config,
    benchmark_parse_array_of_tables,
    benchmark_decode_array_of_tables,
    benchmark_encode
);
criterion_main!(benches);
