use criterion::{criterion_group, criterion_main, Criterion};
use vaxrisk_transmission::{
    branching_outbreak_risk, case_outbreak_risk, instantaneous_outbreak_risks, BranchingConfig,
    Dispersion, GenerationTimeConfig, ModelConfig, SeasonalReproduction, SolverConfig,
};

fn bench_solvers(c: &mut Criterion) {
    let reproduction = SeasonalReproduction::default().daily(365);
    let generation_time = GenerationTimeConfig::default().build().expect("generation time");
    let dispersion = Dispersion::default();
    let solver = SolverConfig::default();

    c.bench_function("instantaneous_risk_365_days", |b| {
        b.iter(|| instantaneous_outbreak_risks(&reproduction, &dispersion, &solver).expect("risk"));
    });
    c.bench_function("case_risk_365_days", |b| {
        b.iter(|| {
            case_outbreak_risk(&reproduction, &generation_time, &dispersion, &solver).expect("risk")
        });
    });
}

fn bench_monte_carlo(c: &mut Criterion) {
    let config = BranchingConfig {
        trials: 1_000,
        ..BranchingConfig::default()
    };
    c.bench_function("branching_1000_trials", |b| {
        b.iter(|| branching_outbreak_risk(2.0, &Dispersion::default(), &config).expect("estimate"));
    });

    let model_config = ModelConfig {
        immunity: None,
        ..ModelConfig::default()
    };
    let model = vaxrisk_transmission::OutbreakRiskModel::new(&model_config).expect("model");
    let simulation = vaxrisk_transmission::SimulationConfig {
        simulations: 500,
        ..Default::default()
    };
    c.bench_function("renewal_500_runs", |b| {
        b.iter(|| model.simulated_outbreak_risk(&[0.0], &simulation).expect("simulation"));
    });
}

criterion_group!(benches, bench_solvers, bench_monte_carlo);
criterion_main!(benches);
