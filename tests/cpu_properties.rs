use hostpulse::system::cpu::{CpuTimeSample, utilization_between};
use hostpulse::system::platform::linux::{parse_df_total_mb, total_memory_mb, used_memory_mb};
use proptest::prelude::*;

fn stat_line(fields: &[u64]) -> String {
    let joined: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    format!("cpu  {}\ncpu0 {}\n", joined.join(" "), joined.join(" "))
}

proptest! {
    #[test]
    fn utilization_is_a_percentage(
        idle_a in 0u64..u64::MAX / 4,
        total_a in 0u64..u64::MAX / 4,
        idle_b in 0u64..u64::MAX / 4,
        total_b in 0u64..u64::MAX / 4,
    ) {
        let first = CpuTimeSample { idle_ticks: idle_a, total_ticks: total_a };
        let second = CpuTimeSample { idle_ticks: idle_b, total_ticks: total_b };
        let usage = utilization_between(first, second);
        prop_assert!((0.0..=100.0).contains(&usage), "usage {} out of range", usage);
    }

    #[test]
    fn busy_ticks_raise_utilization(
        base in prop::collection::vec(0u64..1_000_000, 8),
        busy in 1u64..100_000,
        idle in 0u64..100_000,
    ) {
        let first = CpuTimeSample::parse(&stat_line(&base));
        let mut next = base.clone();
        next[0] += busy;
        next[3] += idle;
        let second = CpuTimeSample::parse(&stat_line(&next));

        let usage = utilization_between(first, second);
        let expected = 100.0 * busy as f64 / (busy + idle) as f64;
        prop_assert!((usage - expected).abs() < 1e-9);
    }

    #[test]
    fn parsers_never_panic(input in ".{0,200}") {
        let _ = CpuTimeSample::parse(&input);
        let _ = used_memory_mb(&input);
        let _ = total_memory_mb(&input);
        let _ = parse_df_total_mb(&input);
    }

    #[test]
    fn meminfo_used_is_total_minus_available(
        total in 0u64..1_000_000_000,
        available in 0u64..1_000_000_000,
    ) {
        let meminfo = format!("MemTotal: {total} kB\nMemFree: 1 kB\nMemAvailable: {available} kB\n");
        let used = used_memory_mb(&meminfo).unwrap();
        prop_assert_eq!(used, (total as f64 - available as f64) / 1024.0);
        prop_assert_eq!(total_memory_mb(&meminfo).unwrap(), total as f64 / 1024.0);
    }
}
