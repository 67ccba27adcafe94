//! Antibody kinetics: titer trajectories from parameters and a dose schedule.
//!
//! Doses combine by sequential carry-over. The titer reached just before a dose
//! is the starting state of the next segment and the new dose only adds
//! production, so trajectories are continuous at every dose time.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::VaxError;
use vaxrisk_core::{require_positive, ResultTable};

use crate::ode::rk4;
use crate::params::{BoostDecayParams, ImmuneParameters, MrnaParams};
use crate::schedule::{PreExistingImmunity, VaccinationSchedule};
use crate::susceptibility::HillSusceptibility;

/// Default maximal RK4 step (days) for the ODE model.
pub const DEFAULT_MAX_STEP: f64 = 0.25;

/// Models that turn a vaccination schedule into titers at arbitrary times.
pub trait AntibodyKinetics {
    /// Evaluates the titer at every entry of `times`, returned in the input order.
    ///
    /// `times` need not be sorted. `max_step` bounds the integration step of
    /// ODE-based models and is ignored by closed-form ones.
    fn titers(
        &self,
        schedule: &VaccinationSchedule,
        times: &[f64],
        max_step: f64,
    ) -> Result<Vec<f64>, VaxError>;
}

impl AntibodyKinetics for ImmuneParameters {
    fn titers(
        &self,
        schedule: &VaccinationSchedule,
        times: &[f64],
        max_step: f64,
    ) -> Result<Vec<f64>, VaxError> {
        self.validate()?;
        require_positive("max_step", max_step)?;
        for &time in times {
            assert!(time.is_finite(), "titer query times must be finite");
        }
        let order = ascending_order(times);
        let sorted: Vec<f64> = order.iter().map(|&idx| times[idx]).collect();
        let values = match self {
            ImmuneParameters::Mrna(params) => mrna_titers(params, schedule, &sorted, max_step),
            ImmuneParameters::BoostDecay(params) => boost_decay_titers(params, schedule, &sorted),
        };
        let mut out = vec![0.0; times.len()];
        for (position, &idx) in order.iter().enumerate() {
            out[idx] = values[position].max(0.0);
        }
        Ok(out)
    }
}

/// Titers sampled on caller-chosen times for one `(individual, schedule)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntibodyTrajectory {
    /// Query times in caller order.
    pub times: Vec<f64>,
    /// Titer at each time.
    pub titers: Vec<f64>,
}

impl AntibodyTrajectory {
    /// Evaluates `kinetics` for `schedule` at `times`.
    pub fn compute<K: AntibodyKinetics + ?Sized>(
        kinetics: &K,
        schedule: &VaccinationSchedule,
        times: &[f64],
        max_step: f64,
    ) -> Result<Self, VaxError> {
        let titers = kinetics.titers(schedule, times, max_step)?;
        Ok(Self {
            times: times.to_vec(),
            titers,
        })
    }

    /// Susceptibility at each sampled time.
    pub fn susceptibility(&self, map: &HillSusceptibility) -> Vec<f64> {
        map.susceptibility_vec(&self.titers)
    }

    /// Table with columns `time`, `titer` and `susceptibility`.
    pub fn to_table(&self, map: &HillSusceptibility) -> Result<ResultTable, VaxError> {
        ResultTable::from_columns(vec![
            ("time".to_string(), self.times.clone()),
            ("titer".to_string(), self.titers.clone()),
            ("susceptibility".to_string(), self.susceptibility(map)),
        ])
    }
}

fn ascending_order(times: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by(|&a, &b| times[a].partial_cmp(&times[b]).unwrap_or(Ordering::Equal));
    order
}

fn pre_existing_titer(pre: PreExistingImmunity, decay_rate: f64, time: f64) -> f64 {
    if time <= pre.time {
        pre.titer
    } else {
        pre.titer * (-decay_rate * (time - pre.time)).exp()
    }
}

/// mRNA driving production at time `t`, or `None` when no dose is active.
#[derive(Debug, Clone, Copy)]
struct Driver {
    log_dose: f64,
    dose_time: f64,
}

fn mrna_driver(params: &MrnaParams, schedule: &VaccinationSchedule, t: f64) -> Option<Driver> {
    let doses = schedule.doses();
    let latest = schedule.latest_dose_index(t)?;
    let active = if t - doses[latest].time >= params.delay_to_antibody_response {
        latest
    } else {
        latest.checked_sub(1)?
    };
    let dose = doses[active];
    Some(Driver {
        log_dose: (params.mrna_dose * dose.potency).ln(),
        dose_time: dose.time,
    })
}

fn production_rate(params: &MrnaParams, driver: Driver, t: f64) -> f64 {
    let log_mrna = driver.log_dose - params.mrna_decay_rate * (t - driver.dose_time);
    let exponent =
        -params.mrna_response_steepness * (log_mrna - params.half_maximal_response_mrna.ln());
    params.max_antibody_production_rate / (1.0 + exponent.exp())
}

fn advance_mrna(
    params: &MrnaParams,
    schedule: &VaccinationSchedule,
    from: f64,
    titer: f64,
    to: f64,
    max_step: f64,
) -> f64 {
    if to <= from {
        return titer;
    }
    let decay = params.antibody_decay_rate;
    match mrna_driver(params, schedule, 0.5 * (from + to)) {
        None => titer * (-decay * (to - from)).exp(),
        Some(driver) => rk4(
            |t, y| production_rate(params, driver, t) - decay * y,
            from,
            titer,
            to,
            max_step,
        ),
    }
}

fn mrna_titers(
    params: &MrnaParams,
    schedule: &VaccinationSchedule,
    sorted_times: &[f64],
    max_step: f64,
) -> Vec<f64> {
    let pre = schedule.pre_existing();
    let decay = params.antibody_decay_rate;
    let Some(first) = schedule.doses().first() else {
        return sorted_times
            .iter()
            .map(|&t| pre_existing_titer(pre, decay, t))
            .collect();
    };

    let mut breakpoints: Vec<f64> = schedule
        .doses()
        .iter()
        .flat_map(|dose| [dose.time, dose.time + params.delay_to_antibody_response])
        .collect();
    breakpoints.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    breakpoints.dedup();

    let mut current = first.time;
    let mut titer = pre_existing_titer(pre, decay, first.time);
    let mut next_break = 0;
    let mut out = Vec::with_capacity(sorted_times.len());
    for &query in sorted_times {
        if query < first.time {
            out.push(pre_existing_titer(pre, decay, query));
            continue;
        }
        while next_break < breakpoints.len() && breakpoints[next_break] <= query {
            let point = breakpoints[next_break];
            titer = advance_mrna(params, schedule, current, titer, point, max_step);
            current = current.max(point);
            next_break += 1;
        }
        titer = advance_mrna(params, schedule, current, titer, query, max_step);
        current = query;
        out.push(titer);
    }
    out
}

/// Titer and unrealised boost carried across dose boundaries.
#[derive(Debug, Clone, Copy)]
struct BoostState {
    titer: f64,
    pending: f64,
}

fn evolve_boost(params: &BoostDecayParams, state: BoostState, elapsed: f64) -> BoostState {
    let r = params.boost_rise_rate;
    let d = params.decay_rate;
    let floor = params.floor_titer;
    let decay = (-d * elapsed).exp();
    let rise = (-r * elapsed).exp();
    let realised = if (r - d).abs() <= 1e-9 * r {
        state.pending * r * elapsed * decay
    } else {
        state.pending * r / (r - d) * (decay - rise)
    };
    BoostState {
        titer: floor + (state.titer - floor) * decay + realised,
        pending: state.pending * rise,
    }
}

fn boost_decay_titers(
    params: &BoostDecayParams,
    schedule: &VaccinationSchedule,
    sorted_times: &[f64],
) -> Vec<f64> {
    let pre = schedule.pre_existing();
    let doses = schedule.doses();
    let Some(first) = doses.first() else {
        return sorted_times
            .iter()
            .map(|&t| pre_existing_titer(pre, params.decay_rate, t))
            .collect();
    };

    // State just after dose `applied - 1`, anchored at that dose time.
    let mut applied = 0;
    let mut anchor = first.time;
    let mut state = BoostState {
        titer: pre_existing_titer(pre, params.decay_rate, first.time),
        pending: 0.0,
    };
    let mut out = Vec::with_capacity(sorted_times.len());
    for &query in sorted_times {
        if query < first.time {
            out.push(pre_existing_titer(pre, params.decay_rate, query));
            continue;
        }
        while applied < doses.len() && doses[applied].time <= query {
            let dose = doses[applied];
            let mut before = evolve_boost(params, state, dose.time - anchor);
            before.pending += dose.potency * params.peak_boost
                / (1.0 + before.titer / params.boost_saturation);
            state = before;
            anchor = dose.time;
            applied += 1;
        }
        out.push(evolve_boost(params, state, query - anchor).titer);
    }
    out
}
