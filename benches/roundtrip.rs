//! Reader/writer throughput benchmark: parsing and serializing list
//! graphs of increasing size and sharing, per spec §4.1/§4.7.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use slip::{write_to_string, Arena, Cell, Config, Datum, Reader};

/// `( 0 1 2 ... n-1 )` — a flat list with no sharing, exercising the
/// hash table's insert path once per name registered (here: none) and
/// the writer's line-fitting output loop `n` times.
fn flat_list_source(n: usize) -> String {
    let mut text = String::from("(");
    for i in 0..n {
        text.push(' ');
        text.push_str(&i.to_string());
    }
    text.push_str(" )");
    text
}

/// `list1 ( ... ); list2 ( {list1} {list1} ... {list1} ); {list2}` — a
/// single shared sublist referenced `n` times, exercising the registry's
/// by-name lookup (`get_sublist_handle`) on the hot path.
fn shared_sublist_source(n: usize) -> String {
    let mut text = String::from("list1 ( 1 2 3 ); list2 (");
    for _ in 0..n {
        text.push_str(" {list1}");
    }
    text.push_str(" ); {list2}");
    text
}

fn bench_parse_flat_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_flat_list");
    for &n in &[100usize, 1_000, 10_000] {
        let source = flat_list_source(n);
        group.bench_function(format!("{n}_cells"), |b| {
            b.iter(|| {
                let mut reader = Reader::new(Config::default());
                let mut arena = Arena::new();
                let outcome = reader.read_str("bench.slip", black_box(source.clone()), &mut arena);
                black_box(outcome.top)
            })
        });
    }
    group.finish();
}

fn bench_parse_shared_sublist(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_shared_sublist");
    for &n in &[100usize, 1_000, 10_000] {
        let source = shared_sublist_source(n);
        group.bench_function(format!("{n}_refs"), |b| {
            b.iter(|| {
                let mut reader = Reader::new(Config::default());
                let mut arena = Arena::new();
                let outcome = reader.read_str("bench.slip", black_box(source.clone()), &mut arena);
                black_box(outcome.top)
            })
        });
    }
    group.finish();
}

fn bench_write_flat_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_flat_list");
    for &n in &[100usize, 1_000, 10_000] {
        let mut arena = Arena::new();
        let top = arena.create_header();
        for i in 0..n {
            arena.push(top, Cell::Data(Datum::I64(i as i64)));
        }
        group.bench_function(format!("{n}_cells"), |b| {
            b.iter(|| black_box(write_to_string(&arena, top, Config::default())))
        });
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    for &n in &[100usize, 1_000] {
        let source = shared_sublist_source(n);
        group.bench_function(format!("{n}_refs"), |b| {
            b.iter(|| {
                let mut reader = Reader::new(Config::default());
                let mut arena = Arena::new();
                let outcome = reader.read_str("bench.slip", black_box(source.clone()), &mut arena);
                black_box(write_to_string(&arena, outcome.top, Config::default()))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_flat_list,
    bench_parse_shared_sublist,
    bench_write_flat_list,
    bench_round_trip,
);
criterion_main!(benches);
