#![deny(missing_docs)]
#![doc = "Within-host antibody kinetics, titer-to-susceptibility mapping and cohort susceptibility profiles."]

pub mod cohort;
pub mod kinetics;
pub mod ode;
pub mod params;
pub mod periodic;
pub mod population;
pub mod profile;
pub mod schedule;
pub mod susceptibility;

pub use cohort::{percentile, within_host_summary, SUMMARY_COLUMNS};
pub use kinetics::{AntibodyKinetics, AntibodyTrajectory, DEFAULT_MAX_STEP};
pub use params::{BoostDecayParams, ImmuneParameters, MrnaParams};
pub use periodic::{PeriodicSchedule, DEFAULT_BURN_IN_PERIODS};
pub use population::{ParameterRow, PopulationImmunity, PopulationSampler, RandomEffects};
pub use profile::{cohort_titers, CohortConfig, VaccinatedProfile, VaccinationCampaign};
pub use schedule::{Dose, PreExistingImmunity, VaccinationSchedule};
pub use susceptibility::HillSusceptibility;
