//! Propagation, link budget, modulation/MCS selection, interference and MAC
//! activity: the pure compute pipeline behind the channel service's
//! `/compute/*` endpoints.

pub mod error;
pub mod interference;
pub mod linkbudget;
pub mod mac_models;
pub mod mcs_selector;
pub mod modulation;
pub mod propagation;

pub use error::ComputeError;
pub use interference::{aclr_db, aggregate_interference, Interferer, InterferenceResult, ReceiverContext};
pub use linkbudget::{snr_link, thermal_noise_dbm};
pub use mac_models::{csma_activity_prob, tdma_activity_prob, tdma_throughput_multiplier};
pub use mcs_selector::{McsSelection, McsSelector, DEFAULT_HYSTERESIS_DB};
pub use modulation::{ber_for_modulation, coding_gain_db, evaluate_mcs, ModulationResult, DEFAULT_BLOCK_BITS};
pub use propagation::{AnalyticEngine, GeometricEngine, PathResult, PropagationEngine};
pub use linkbudget::propagation_delay_ms;
