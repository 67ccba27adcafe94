use proptest::prelude::*;
use vaxrisk_immune::{
    AntibodyKinetics, BoostDecayParams, HillSusceptibility, ImmuneParameters, MrnaParams,
    VaccinationSchedule,
};

#[test]
fn boundary_values_are_exact() {
    let map = HillSusceptibility::default();
    assert_eq!(map.susceptibility(0.0), 1.0);
    assert_eq!(map.susceptibility(f64::INFINITY), 0.0);
    assert_eq!(map.susceptibility(f64::MAX), 0.0);
    assert!((map.susceptibility(1000.0) - 0.5).abs() < 1e-12);
}

#[test]
#[should_panic(expected = "non-negative titer")]
fn negative_titer_is_a_contract_violation() {
    HillSusceptibility::default().susceptibility(-1.0);
}

#[test]
#[should_panic]
fn nan_titer_is_a_contract_violation() {
    HillSusceptibility::default().susceptibility(f64::NAN);
}

#[test]
fn invalid_map_parameters_are_rejected() {
    let map = HillSusceptibility {
        half_protection_titer: 0.0,
        steepness: 1.0,
    };
    assert!(map.validate().unwrap_err().is_config());
}

proptest! {
    #[test]
    fn susceptibility_is_monotone_and_bounded(
        a in 0.0f64..1e7,
        b in 0.0f64..1e7,
        half in 1.0f64..1e4,
        steepness in 0.1f64..5.0,
    ) {
        let map = HillSusceptibility { half_protection_titer: half, steepness };
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let s_low = map.susceptibility(low);
        let s_high = map.susceptibility(high);
        prop_assert!((0.0..=1.0).contains(&s_low));
        prop_assert!((0.0..=1.0).contains(&s_high));
        prop_assert!(s_high <= s_low);
    }

    #[test]
    fn titers_are_never_negative(
        first in 0.0f64..50.0,
        gap in 1.0f64..200.0,
        decay in 0.001f64..0.2,
        use_boost in any::<bool>(),
    ) {
        let params = if use_boost {
            ImmuneParameters::BoostDecay(BoostDecayParams { decay_rate: decay, ..BoostDecayParams::default() })
        } else {
            ImmuneParameters::Mrna(MrnaParams { antibody_decay_rate: decay, ..MrnaParams::default() })
        };
        let schedule = VaccinationSchedule::from_times(&[first, first + gap]).unwrap();
        let times: Vec<f64> = (0..60).map(|idx| idx as f64 * 5.0).collect();
        let titers = params.titers(&schedule, &times, 0.5).unwrap();
        prop_assert!(titers.iter().all(|&titer| titer >= 0.0 && titer.is_finite()));
    }
}
