//! Compares the synchronization strategies of the array sum and dot product kernels on the
//! available processors, under the statistical treatment of Criterion.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fork_join::ExecutionContext;
use new_zealand::nz;
use sync_sweep::kernels::{ArraySum, DotProduct, Variant};
use sync_sweep::{DataGenerator, SweepConfig};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const LEN: usize = 1_000_000;

fn entrypoint(c: &mut Criterion) {
    let hardware_threads = SweepConfig::detect().hardware_threads;
    let mut data = DataGenerator::from_seed(0);

    let values = data.vector(LEN);
    let left = data.vector(LEN);
    let right = data.vector(LEN);

    let mut context = ExecutionContext::new(nz!(1));

    for thread_count in [nz!(1), hardware_threads] {
        context.set_thread_count(thread_count);

        let mut group = c.benchmark_group(format!("array_sum_{thread_count}t"));

        for &variant in ArraySum::ALL {
            group.bench_with_input(
                BenchmarkId::from_parameter(variant.tag()),
                &variant,
                |b, variant| {
                    b.iter(|| black_box(variant.run(&context, black_box(&values))));
                },
            );
        }

        group.finish();

        let mut group = c.benchmark_group(format!("dot_product_{thread_count}t"));

        for &variant in DotProduct::ALL {
            group.bench_with_input(
                BenchmarkId::from_parameter(variant.tag()),
                &variant,
                |b, variant| {
                    b.iter(|| {
                        black_box(
                            variant
                                .run(&context, black_box(&left), black_box(&right))
                                .expect("operands are generated with equal lengths"),
                        )
                    });
                },
            );
        }

        group.finish();
    }
}
