//! # Entity Table Benchmark
//!
//! Measures the per-frame table workload:
//! 1. Create/destroy churn with slot recycling
//! 2. Draining the change list after sparse updates
//! 3. Growth from a tiny initial capacity

#![allow(missing_docs)]

use bifrost_core::{ChangeFlags, Column, Columns, EntityTable, Rgb, Uid};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct LightChanges: u8 {
        const CREATED = 1 << 0;
        const DESTROYED = 1 << 1;
        const UPDATED = 1 << 2;
    }
}

impl ChangeFlags for LightChanges {
    fn none() -> Self {
        Self::empty()
    }

    fn created() -> Self {
        Self::CREATED
    }

    fn destroyed() -> Self {
        Self::DESTROYED
    }
}

struct Lights;

#[derive(Default)]
struct LightColumns {
    power: Column<Rgb>,
    radius: Column<f32>,
}

impl Columns for LightColumns {
    fn resize(&mut self, capacity: usize) {
        self.power.resize(capacity);
        self.radius.resize(capacity);
    }

    fn init_sentinel(&mut self) {
        self.power[0] = Rgb::black();
    }
}

type LightTable = EntityTable<Lights, LightColumns, LightChanges>;

fn create(table: &mut LightTable, i: usize) -> Uid<Lights> {
    table.create_with(|columns, index| {
        columns.power[index] = Rgb::splat(i as f32);
        columns.radius[index] = 0.1;
    })
}

// =============================================================================
// CHURN
// =============================================================================

fn bench_create_destroy_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_destroy_churn");

    for count in [1_000usize, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut table = LightTable::new();
            table.allocate(count + 1);
            let mut ids = Vec::with_capacity(count);

            b.iter(|| {
                ids.extend((0..count).map(|i| create(&mut table, i)));
                for id in ids.drain(..) {
                    table.destroy_with(id, |_, _| {});
                }
                table.reset_change_notifications();
                black_box(table.len())
            });
        });
    }

    group.finish();
}

// =============================================================================
// CHANGE DRAIN
// =============================================================================

fn bench_sparse_change_drain(c: &mut Criterion) {
    const COUNT: usize = 100_000;

    let mut table = LightTable::new();
    table.allocate(COUNT + 1);
    let ids: Vec<_> = (0..COUNT).map(|i| create(&mut table, i)).collect();
    table.reset_change_notifications();

    c.bench_function("sparse_change_drain_1pct", |b| {
        b.iter(|| {
            for id in ids.iter().step_by(100) {
                table.columns_mut().radius[id.index()] = 0.2;
                table.mark_changed(*id, LightChanges::UPDATED);
            }

            let mut sum = 0.0f32;
            for id in table.changed() {
                sum += table.columns().radius[id.index()];
            }
            table.reset_change_notifications();
            black_box(sum)
        });
    });
}

// =============================================================================
// GROWTH
// =============================================================================

fn bench_growth_from_one(c: &mut Criterion) {
    c.bench_function("growth_from_one_to_100k", |b| {
        b.iter(|| {
            let mut table = LightTable::new();
            table.allocate(1);
            for i in 0..100_000 {
                create(&mut table, i);
            }
            black_box(table.capacity())
        });
    });
}

criterion_group!(
    benches,
    bench_create_destroy_churn,
    bench_sparse_change_drain,
    bench_growth_from_one,
);
criterion_main!(benches);
