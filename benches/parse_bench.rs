use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hostpulse::system::cpu::{CpuTimeSample, utilization_between};
use hostpulse::system::platform::linux::{parse_df_total_mb, used_memory_mb};
use std::hint::black_box;

fn make_proc_stat(cores: usize) -> String {
    let mut stat = String::from("cpu  4705 356 584 3699176 23060 0 277 0 0 0\n");
    for i in 0..cores {
        stat.push_str(&format!("cpu{i} 1393 280 290 3686950 2294 0 10 0 0 0\n"));
    }
    stat.push_str("intr 114930548 113199788 3 0 5 263 0 4 [... 0]\nctxt 1990473\nbtime 1062191376\n");
    stat
}

fn make_meminfo() -> String {
    let mut meminfo = String::new();
    for (key, value) in [
        ("MemTotal", 16_000_000u64),
        ("MemFree", 1_000_000),
        ("MemAvailable", 8_000_000),
        ("Buffers", 200_000),
        ("Cached", 4_000_000),
        ("SwapCached", 0),
        ("Active", 6_000_000),
        ("Inactive", 3_000_000),
    ] {
        meminfo.push_str(&format!("{key}:{value:>16} kB\n"));
    }
    meminfo
}

fn bench_proc_stat(c: &mut Criterion) {
    let mut group = c.benchmark_group("proc_stat_8_64_256");

    for cores in [8usize, 64, 256] {
        let stat = make_proc_stat(cores);
        group.bench_with_input(BenchmarkId::from_parameter(cores), &stat, |b, stat| {
            b.iter(|| {
                let first = CpuTimeSample::parse(black_box(stat));
                let second = CpuTimeSample::parse(black_box(stat));
                black_box(utilization_between(first, second));
            })
        });
    }

    group.finish();
}

fn bench_meminfo_and_df(c: &mut Criterion) {
    let meminfo = make_meminfo();
    let df = "Filesystem     1M-blocks   Used Available Use% Mounted on\n\
              /dev/nvme0n1p2    467464 201234    242390  46% /\n";

    c.bench_function("meminfo_used", |b| {
        b.iter(|| black_box(used_memory_mb(black_box(&meminfo))))
    });
    c.bench_function("df_total", |b| {
        b.iter(|| black_box(parse_df_total_mb(black_box(df))))
    });
}

criterion_group!(benches, bench_proc_stat, bench_meminfo_and_df);
criterion_main!(benches);
