use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use doe_engine::doe::{analyze, prepare, AnalysisConfig};
use doe_engine::experiment::{Experiment, Factor, ResponseVariable};
use doe_engine::FullFactorialBuilder;

/// 2^k design with `replicates` replicates and a deterministic response.
fn two_level(k: usize, replicates: u32) -> Experiment {
    let factors: Vec<Factor> = (0..k)
        .map(|i| {
            let symbol = ((b'A' + i as u8) as char).to_string();
            Factor::quantitative(i as u64 + 1, &format!("Factor {symbol}"), &symbol, &[-1.0, 1.0])
        })
        .collect();
    let mut exp = Experiment::new(1, "Bench");
    exp.responses = vec![ResponseVariable::new(1, "Y", "")];
    exp.runs = FullFactorialBuilder::new()
        .factors(&factors)
        .replicates(replicates)
        .build()
        .unwrap();
    for run in &mut exp.runs {
        let y: f64 = run
            .factor_values
            .values()
            .enumerate()
            .map(|(i, l)| l.as_f64().unwrap_or(0.0) * (i as f64 + 1.0))
            .sum::<f64>()
            + (run.standard_order % 7) as f64 * 0.1;
        run.response_values.insert(1, y);
    }
    exp.factors = factors;
    exp
}

fn bench_full_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("Analyze");

    for k in [2, 3, 4, 5] {
        let exp = two_level(k, 2);
        group.bench_with_input(BenchmarkId::from_parameter(k), &exp, |b, exp| {
            b.iter(|| analyze(exp, &AnalysisConfig::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_prepare(c: &mut Criterion) {
    let exp = two_level(5, 4);
    c.bench_function("Prepare_2^5x4", |b| {
        b.iter(|| prepare(&exp).unwrap());
    });
}

fn bench_render(c: &mut Criterion) {
    let result = analyze(&two_level(4, 2), &AnalysisConfig::default()).unwrap();
    c.bench_function("Render_JSON_2^4", |b| {
        b.iter(|| result.to_json().unwrap());
    });
}

criterion_group!(benches, bench_full_analysis, bench_prepare, bench_render);
criterion_main!(benches);
