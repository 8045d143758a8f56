use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dfaregex::Regex;

pub fn compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("a?^na^n compile");
    group.measurement_time(Duration::from_secs(1));

    let patterns = (1..=8).map(|n| (n, "a?".repeat(n) + &"a".repeat(n)));

    for (n, pattern) in patterns {
        group.bench_with_input(BenchmarkId::new(format!("n={n}"), 0), &pattern, |b, pattern| {
            b.iter(|| Regex::new(pattern).unwrap())
        });
    }
}

pub fn scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.measurement_time(Duration::from_secs(1));

    let text: Vec<char> = "lorem ipsum dolor sit amet 12345 consectetur adipiscing elit "
        .repeat(100)
        .chars()
        .collect();

    for pattern in ["[0-9]+", "(aa|b)+", "[a-z]+", "[A-Z][a-z]+", "lo.*"] {
        let re = Regex::new(pattern).unwrap();
        group.bench_with_input(BenchmarkId::new("find_iter", pattern), &text, |b, text| {
            b.iter(|| re.find_iter(text).count())
        });
    }
}

/// Candidates that run to the end of the text before failing, so every start
/// position rescans the rest of the text.
pub fn restart(c: &mut Criterion) {
    let mut group = c.benchmark_group("a+b over a^n");
    group.measurement_time(Duration::from_secs(1));

    let re = Regex::new("a+b").unwrap();
    for n in [100, 1_000, 4_000] {
        let text: Vec<char> = "a".repeat(n).chars().collect();
        group.bench_with_input(BenchmarkId::new("find_iter", n), &text, |b, text| {
            b.iter(|| re.find_iter(text).count())
        });
    }
}

criterion_group!(benches, compile, scan, restart);
criterion_main!(benches);
