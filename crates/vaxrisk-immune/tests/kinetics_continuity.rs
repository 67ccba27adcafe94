use vaxrisk_immune::{
    AntibodyKinetics, AntibodyTrajectory, BoostDecayParams, HillSusceptibility, ImmuneParameters,
    MrnaParams, PreExistingImmunity, VaccinationSchedule,
};

fn mrna() -> ImmuneParameters {
    ImmuneParameters::Mrna(MrnaParams::default())
}

fn boost() -> ImmuneParameters {
    ImmuneParameters::BoostDecay(BoostDecayParams::default())
}

#[test]
fn unvaccinated_titer_follows_pre_existing_decay() {
    let schedule = VaccinationSchedule::unvaccinated()
        .with_pre_existing(PreExistingImmunity {
            titer: 800.0,
            time: 10.0,
        })
        .unwrap();
    let params = mrna();
    let titers = params.titers(&schedule, &[0.0, 10.0, 20.0], 0.25).unwrap();
    let decay = MrnaParams::default().antibody_decay_rate;
    assert_eq!(titers[0], 800.0);
    assert_eq!(titers[1], 800.0);
    assert!((titers[2] - 800.0 * (-decay * 10.0).exp()).abs() < 1e-9);
}

#[test]
fn no_production_before_first_dose_or_during_first_delay() {
    let schedule = VaccinationSchedule::from_times(&[5.0]).unwrap();
    let titers = mrna().titers(&schedule, &[0.0, 5.0, 11.9], 0.25).unwrap();
    assert_eq!(titers, vec![0.0, 0.0, 0.0]);
}

#[test]
fn mrna_response_rises_then_decays() {
    let schedule = VaccinationSchedule::from_times(&[0.0]).unwrap();
    let times: Vec<f64> = (0..=200).map(|day| day as f64).collect();
    let titers = mrna().titers(&schedule, &times, 0.25).unwrap();
    let (peak_day, peak) = titers
        .iter()
        .enumerate()
        .fold((0, 0.0), |best, (day, &value)| if value > best.1 { (day, value) } else { best });
    assert!(peak_day > 7 && peak_day < 40, "peak on day {peak_day}");
    assert!(peak > 1000.0);
    assert!(titers[200] < peak);
    assert!(titers.iter().all(|&value| value >= 0.0));
}

#[test]
fn trajectory_is_continuous_at_dose_times() {
    let schedule = VaccinationSchedule::from_times(&[0.0, 100.0]).unwrap();
    for params in [mrna(), boost()] {
        let titers = params
            .titers(&schedule, &[100.0 - 1e-6, 100.0, 100.0 + 1e-6], 0.25)
            .unwrap();
        assert!((titers[0] - titers[1]).abs() < 1e-3, "{params:?}: {titers:?}");
        assert!((titers[2] - titers[1]).abs() < 1e-3, "{params:?}: {titers:?}");
    }
}

#[test]
fn query_order_does_not_change_values() {
    let schedule = VaccinationSchedule::from_times(&[0.0, 60.0]).unwrap();
    let ascending = [3.0, 17.5, 40.0, 61.0, 90.0];
    let shuffled = [61.0, 3.0, 90.0, 40.0, 17.5];
    let params = mrna();
    let a = params.titers(&schedule, &ascending, 0.25).unwrap();
    let b = params.titers(&schedule, &shuffled, 0.25).unwrap();
    assert_eq!(a[0], b[1]);
    assert_eq!(a[1], b[4]);
    assert_eq!(a[2], b[3]);
    assert_eq!(a[3], b[0]);
    assert_eq!(a[4], b[2]);
}

#[test]
fn rk4_step_refinement_converges() {
    let schedule = VaccinationSchedule::from_times(&[0.0]).unwrap();
    let coarse = mrna().titers(&schedule, &[30.0], 0.25).unwrap()[0];
    let fine = mrna().titers(&schedule, &[30.0], 0.01).unwrap()[0];
    assert!((coarse - fine).abs() / fine < 1e-4);
}

#[test]
fn boost_decay_matches_closed_form_for_single_dose() {
    let params = BoostDecayParams::default();
    let schedule = VaccinationSchedule::from_times(&[0.0]).unwrap();
    let titer = ImmuneParameters::BoostDecay(params.clone())
        .titers(&schedule, &[20.0], 0.25)
        .unwrap()[0];
    let (r, d, floor) = (params.boost_rise_rate, params.decay_rate, params.floor_titer);
    let expected = floor - floor * (-d * 20.0).exp()
        + params.peak_boost * r / (r - d) * ((-d * 20.0).exp() - (-r * 20.0).exp());
    assert!((titer - expected).abs() < 1e-9);
}

#[test]
fn boosting_is_attenuated_by_existing_titer() {
    let params = boost();
    let single = VaccinationSchedule::from_times(&[0.0]).unwrap();
    let boosted = VaccinationSchedule::from_times(&[0.0, 30.0]).unwrap();
    // Gain over 30 days from a naive dose versus from a dose given at high titer.
    let naive_gain = params.titers(&single, &[30.0], 0.25).unwrap()[0];
    let base = params.titers(&single, &[60.0], 0.25).unwrap()[0];
    let with_second = params.titers(&boosted, &[60.0], 0.25).unwrap()[0];
    assert!(with_second > base);
    assert!(with_second - base < 0.5 * naive_gain);
}

#[test]
fn invalid_inputs_are_config_errors() {
    let schedule = VaccinationSchedule::from_times(&[0.0]).unwrap();
    let err = mrna().titers(&schedule, &[1.0], 0.0).unwrap_err();
    assert!(err.is_config());

    let mut params = MrnaParams::default();
    params.antibody_decay_rate = -1.0;
    let err = ImmuneParameters::Mrna(params)
        .titers(&schedule, &[1.0], 0.25)
        .unwrap_err();
    assert!(err.is_config());

    assert!(VaccinationSchedule::from_times(&[3.0, 3.0]).is_err());
    assert!(VaccinationSchedule::from_times(&[-1.0]).is_err());
}

#[test]
fn trajectory_table_has_contract_columns() {
    let schedule = VaccinationSchedule::from_times(&[0.0]).unwrap();
    let trajectory = AntibodyTrajectory::compute(&mrna(), &schedule, &[0.0, 30.0], 0.25).unwrap();
    let table = trajectory.to_table(&HillSusceptibility::default()).unwrap();
    assert_eq!(table.columns(), &["time", "titer", "susceptibility"]);
    assert_eq!(table.column("susceptibility").unwrap()[0], 1.0);
}
