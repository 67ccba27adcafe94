use criterion::{criterion_group, criterion_main, Criterion};
use vaxrisk_immune::{
    AntibodyKinetics, CohortConfig, HillSusceptibility, ImmuneParameters, PopulationImmunity,
    VaccinatedProfile, VaccinationCampaign, VaccinationSchedule,
};

fn bench_kinetics(c: &mut Criterion) {
    let params = ImmuneParameters::default();
    let schedule = VaccinationSchedule::from_times(&[0.0, 180.0, 365.0]).expect("schedule");
    let times: Vec<f64> = (0..730).map(|day| day as f64).collect();
    c.bench_function("mrna_titers_two_years", |b| {
        b.iter(|| params.titers(&schedule, &times, 0.25).expect("titers"));
    });
}

fn bench_profile(c: &mut Criterion) {
    let immunity = PopulationImmunity::default();
    let map = HillSusceptibility::default();
    let cohort = CohortConfig {
        population_size: 200,
        ..CohortConfig::default()
    };
    c.bench_function("vaccinated_profile_200", |b| {
        b.iter(|| VaccinatedProfile::compute(&immunity, &map, 365, &cohort).expect("profile"));
    });

    let profile = VaccinatedProfile::compute(&immunity, &map, 365, &cohort).expect("profile");
    let campaign = VaccinationCampaign::default();
    c.bench_function("campaign_susceptibility", |b| {
        b.iter(|| profile.campaign_susceptibility(&campaign).expect("campaign"));
    });
}

criterion_group!(benches, bench_kinetics, bench_profile);
criterion_main!(benches);
