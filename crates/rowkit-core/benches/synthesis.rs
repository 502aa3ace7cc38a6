//! Benchmarks for the two CPU-bound stages: DDL extraction and row synthesis.

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rowkit_core::generate::key_pool::KeyPool;
use rowkit_core::generate::synthesize::build_row;
use rowkit_core::schema::ddl;
use rowkit_testutil::{shop_scenario, shop_schema, SHOP_DDL};

/// A dump with `tables` copies of the shop schema under distinct names.
fn large_dump(tables: usize) -> String {
    let mut dump = String::new();
    for i in 0..tables {
        dump.push_str(&SHOP_DDL.replace("CREATE TABLE `", &format!("CREATE TABLE `t{}_", i)));
    }
    dump
}

fn bench_ddl_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddl/parse");

    for copies in [1, 20, 200] {
        let dump = large_dump(copies);
        group.throughput(Throughput::Bytes(dump.len() as u64));
        group.bench_with_input(BenchmarkId::new("copies", copies), &dump, |b, dump| {
            b.iter(|| ddl::parse(dump));
        });
    }
    group.finish();
}

fn bench_build_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize/order_items");

    let schema = shop_schema();
    let scenario = shop_scenario();
    let table = &schema.tables["order_items"];
    let scenario_table = &scenario.tables["order_items"];
    let base_time = NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let mut keys = KeyPool::new();
    for k in 1..=1000 {
        keys.record_key("orders", k);
        keys.record_key("products", k);
    }

    for row_count in [100, 1000, 10_000] {
        group.throughput(Throughput::Elements(row_count as u64));
        group.bench_with_input(
            BenchmarkId::new("rows", row_count),
            &row_count,
            |b, &rows| {
                b.iter(|| {
                    let mut rng = StdRng::seed_from_u64(42);
                    for _ in 0..rows {
                        build_row(table, scenario_table, &keys, &mut rng, base_time);
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_ddl_parse, bench_build_row);
criterion_main!(benches);
