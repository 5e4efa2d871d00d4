#[macro_use]
extern crate criterion;

use criterion::{BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

use cc_array::sort::{insertion_sort_by, merge_sort_by};
use cc_array::{ManagedArray, ValueArray};

static SIZES: [usize; 4] = [16, 256, 4096, 65536];

fn random_records(n: usize) -> Vec<(u32, u32)> {
    let mut rng = StdRng::seed_from_u64(n as u64);
    (0..n).map(|i| (rng.gen_range(0..1024), i as u32)).collect()
}

fn append(c: &mut Criterion) {
    let mut g = c.benchmark_group("append");
    for n in &SIZES {
        g.bench_with_input(BenchmarkId::new("value_with_resize", n), n, |b, n| {
            b.iter(|| {
                let mut a = ValueArray::with_capacity(1);
                for i in 0..*n {
                    a.append_with_resize(i as u32);
                }
                std::hint::black_box(a.len());
            })
        });
        g.bench_with_input(BenchmarkId::new("managed_with_resize", n), n, |b, n| {
            let handle = Rc::new(0u32);
            b.iter(|| {
                let mut a = ManagedArray::with_capacity(1);
                for _ in 0..*n {
                    a.append_with_resize(&handle);
                }
                std::hint::black_box(a.len());
            })
        });
    }
}

fn sort(c: &mut Criterion) {
    let mut g = c.benchmark_group("sort");
    for n in &SIZES {
        let records = random_records(*n);
        g.bench_with_input(BenchmarkId::new("merge", n), &records, |b, records| {
            b.iter(|| {
                let mut v = records.clone();
                merge_sort_by(&mut v, |a, b| a.0.cmp(&b.0));
                std::hint::black_box(v);
            })
        });
        if *n <= 4096 {
            g.bench_with_input(BenchmarkId::new("insertion", n), &records, |b, records| {
                b.iter(|| {
                    let mut v = records.clone();
                    insertion_sort_by(&mut v, |a, b| a.0.cmp(&b.0));
                    std::hint::black_box(v);
                })
            });
        }
        g.bench_with_input(BenchmarkId::new("std_stable", n), &records, |b, records| {
            b.iter(|| {
                let mut v = records.clone();
                v.sort_by(|a, b| a.0.cmp(&b.0));
                std::hint::black_box(v);
            })
        });
    }
}

criterion_group!(benches, append, sort);
criterion_main!(benches);
