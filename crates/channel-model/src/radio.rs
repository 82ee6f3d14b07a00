//! Per-interface radio parameters and antenna gain bookkeeping.

use crate::error::ModelError;
use crate::mac::MacConfig;
use crate::position::Position;
use serde::{Deserialize, Serialize};

/// Exactly one of a named pattern or an explicit gain must be present; this is a
/// hard invariant enforced by `AntennaConfig::validate`, not just by the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntennaConfig {
    #[serde(default)]
    pub antenna_pattern: Option<String>,
    #[serde(default)]
    pub antenna_gain_dbi: Option<f64>,
}

impl AntennaConfig {
    pub fn pattern(name: impl Into<String>) -> Self {
        Self {
            antenna_pattern: Some(name.into()),
            antenna_gain_dbi: None,
        }
    }

    pub fn gain_dbi(gain: f64) -> Self {
        Self {
            antenna_pattern: None,
            antenna_gain_dbi: Some(gain),
        }
    }

    /// Resolve to a concrete gain in dBi, validating mutual exclusion and pattern
    /// lookup on the way. `iface_name` is only used to annotate error messages.
    pub fn resolve_gain_dbi(&self, iface_name: &str) -> Result<f64, ModelError> {
        match (&self.antenna_pattern, self.antenna_gain_dbi) {
            (Some(pattern), None) => antenna_pattern_gain_dbi(pattern)
                .ok_or_else(|| ModelError::UnknownAntennaPattern(pattern.clone())),
            (None, Some(gain)) => Ok(gain),
            _ => Err(ModelError::AntennaMutualExclusion(iface_name.to_string())),
        }
    }
}

/// Fixed lookup table for named antenna patterns, per the spec's contract.
pub fn antenna_pattern_gain_dbi(pattern: &str) -> Option<f64> {
    match pattern {
        "iso" => Some(0.0),
        "dipole" => Some(1.76),
        "hw_dipole" => Some(2.16),
        "tr38901" => Some(8.0),
        _ => None,
    }
}

pub const DEFAULT_NOISE_FIGURE_DB: f64 = 7.0;
pub const DEFAULT_RX_SENSITIVITY_DBM: f64 = -80.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioParams {
    pub position: Position,
    pub frequency_hz: f64,
    pub bandwidth_hz: f64,
    pub tx_power_dbm: f64,
    #[serde(default = "default_noise_figure")]
    pub noise_figure_db: f64,
    #[serde(default = "default_rx_sensitivity")]
    pub rx_sensitivity_dbm: f64,
    pub antenna: AntennaConfig,
    #[serde(default)]
    pub polarization: Option<String>,
    #[serde(default)]
    pub mcs_table: Option<String>,
    #[serde(default)]
    pub mac: Option<MacConfig>,
}

fn default_noise_figure() -> f64 {
    DEFAULT_NOISE_FIGURE_DB
}

fn default_rx_sensitivity() -> f64 {
    DEFAULT_RX_SENSITIVITY_DBM
}

impl RadioParams {
    pub fn validate(&self, iface_name: &str) -> Result<(), ModelError> {
        self.antenna.resolve_gain_dbi(iface_name)?;
        if let Some(mac) = &self.mac {
            mac.validate(iface_name)?;
        }
        if self.bandwidth_hz <= 0.0 {
            return Err(ModelError::InvalidValue {
                field: format!("{iface_name}.bandwidth_hz"),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_lookup_matches_spec_table() {
        assert_eq!(antenna_pattern_gain_dbi("iso"), Some(0.0));
        assert_eq!(antenna_pattern_gain_dbi("dipole"), Some(1.76));
        assert_eq!(antenna_pattern_gain_dbi("hw_dipole"), Some(2.16));
        assert_eq!(antenna_pattern_gain_dbi("tr38901"), Some(8.0));
        assert_eq!(antenna_pattern_gain_dbi("nope"), None);
    }

    #[test]
    fn mutual_exclusion_rejects_both_set() {
        let cfg = AntennaConfig {
            antenna_pattern: Some("iso".to_string()),
            antenna_gain_dbi: Some(3.0),
        };
        assert!(matches!(
            cfg.resolve_gain_dbi("eth0"),
            Err(ModelError::AntennaMutualExclusion(_))
        ));
    }

    #[test]
    fn mutual_exclusion_rejects_neither_set() {
        let cfg = AntennaConfig {
            antenna_pattern: None,
            antenna_gain_dbi: None,
        };
        assert!(matches!(
            cfg.resolve_gain_dbi("eth0"),
            Err(ModelError::AntennaMutualExclusion(_))
        ));
    }

    #[test]
    fn resolves_gain_from_pattern() {
        let cfg = AntennaConfig::pattern("dipole");
        assert_eq!(cfg.resolve_gain_dbi("eth0").unwrap(), 1.76);
    }

    #[test]
    fn resolves_explicit_gain() {
        let cfg = AntennaConfig::gain_dbi(5.5);
        assert_eq!(cfg.resolve_gain_dbi("eth0").unwrap(), 5.5);
    }
}
