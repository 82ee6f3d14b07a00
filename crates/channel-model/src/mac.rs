//! CSMA/TDMA configuration blocks, carried per-interface on `RadioParams`.
//!
//! These are config structs only; the statistical models that consume them live
//! in `channel-compute`.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MacConfig {
    Csma(CsmaConfig),
    Tdma(TdmaConfig),
}

impl MacConfig {
    pub fn validate(&self, _iface_name: &str) -> Result<(), ModelError> {
        // CSMA and TDMA are represented as distinct enum variants, so the
        // mutual-exclusion invariant holds by construction once deserialized;
        // the only remaining check is internal field sanity.
        match self {
            MacConfig::Csma(c) => c.validate(),
            MacConfig::Tdma(t) => t.validate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsmaConfig {
    pub enabled: bool,
    #[serde(default = "default_carrier_sense_multiplier")]
    pub carrier_sense_range_multiplier: f64,
    #[serde(default = "default_traffic_load")]
    pub traffic_load: f64,
}

fn default_carrier_sense_multiplier() -> f64 {
    2.5
}

fn default_traffic_load() -> f64 {
    0.3
}

impl CsmaConfig {
    fn validate(&self) -> Result<(), ModelError> {
        if !(0.0..=1.0).contains(&self.traffic_load) {
            return Err(ModelError::InvalidValue {
                field: "csma.traffic_load".to_string(),
                reason: "must be in [0, 1]".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TdmaMode {
    Fixed,
    RoundRobin,
    Random,
    Distributed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdmaConfig {
    pub enabled: bool,
    pub num_slots: u32,
    pub frame_duration_ms: f64,
    pub slot_assignment_mode: TdmaMode,
    #[serde(default)]
    pub fixed_slot_map: Option<Vec<u32>>,
    #[serde(default)]
    pub slot_probability: Option<f64>,
}

impl TdmaConfig {
    fn validate(&self) -> Result<(), ModelError> {
        if self.num_slots == 0 {
            return Err(ModelError::InvalidValue {
                field: "tdma.num_slots".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        match self.slot_assignment_mode {
            TdmaMode::Fixed if self.fixed_slot_map.is_none() => Err(ModelError::MissingField(
                "tdma.fixed_slot_map".to_string(),
            )),
            TdmaMode::Random | TdmaMode::Distributed if self.slot_probability.is_none() => {
                Err(ModelError::MissingField("tdma.slot_probability".to_string()))
            }
            _ => Ok(()),
        }
    }
}
