//! Benchmarks for the creation kernels
//!
//! Measures fills, structured matrices and the host round trip every
//! conformance trial pays for

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polyarr_core::{Array, CreationOps, DType, Device, HostArray, Indexing, Scalar};
use polyarr_cpu::CpuBackend;

const CPU: Device = Device::Cpu(0);

fn ramp(len: usize, dtype: DType) -> HostArray {
    HostArray::new((0..len).map(|i| i as f64).collect(), vec![len], dtype).unwrap()
}

fn bench_fills(c: &mut Criterion) {
    let mut group = c.benchmark_group("fills");

    for size in [1_000, 100_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::new("zeros_f64", size), &size, |bench, &n| {
            bench.iter(|| black_box(CpuBackend::zeros(&[n], Some(DType::Float64), CPU).unwrap()));
        });

        // every element goes through the f16 cast
        group.bench_with_input(BenchmarkId::new("full_f16", size), &size, |bench, &n| {
            bench.iter(|| {
                black_box(CpuBackend::full(&[n], Scalar::Float(1.5), Some(DType::Float16), CPU).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("arange_i32", size), &size, |bench, &n| {
            bench.iter(|| {
                black_box(
                    CpuBackend::arange(Scalar::Int(n as i64), None, Scalar::Int(1), Some(DType::Int32), CPU).unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_matrices(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrices");

    for n in [64, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("eye", n), &n, |bench, &n| {
            bench.iter(|| black_box(CpuBackend::eye(n, None, 0, None, CPU).unwrap()));
        });

        let x = CpuBackend::ones(&[n, n], None, CPU).unwrap();
        group.bench_with_input(BenchmarkId::new("tril", n), &x, |bench, x| {
            bench.iter(|| black_box(CpuBackend::tril(x, 0).unwrap()));
        });

        let axis = CpuBackend::asarray(&ramp(n, DType::Float32), None, None).unwrap();
        let pair = [axis.clone(), axis];
        group.bench_with_input(BenchmarkId::new("meshgrid_xy", n), &pair, |bench, pair| {
            bench.iter(|| black_box(CpuBackend::meshgrid(pair, Indexing::Xy).unwrap()));
        });
    }

    group.finish();
}

fn bench_host_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_round_trip");

    for size in [10_000, 1_000_000] {
        let host = ramp(size, DType::Int64);

        group.bench_with_input(BenchmarkId::new("asarray", size), &host, |bench, host| {
            bench.iter(|| black_box(CpuBackend::asarray(host, None, None).unwrap()));
        });

        let native = CpuBackend::asarray(&host, None, None).unwrap();
        group.bench_with_input(BenchmarkId::new("to_host", size), &native, |bench, native| {
            bench.iter(|| black_box(native.to_host()));
        });

        group.bench_with_input(BenchmarkId::new("dlpack", size), &native, |bench, native| {
            bench.iter(|| black_box(CpuBackend::from_dlpack(&native.to_dlpack()).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fills, bench_matrices, bench_host_round_trip);
criterion_main!(benches);
