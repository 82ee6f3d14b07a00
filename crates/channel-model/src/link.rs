//! Directional link identity and the state/netem payloads that ride on it.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ordered pair over which one channel computation produces one netem programme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectionalLink {
    pub tx: NodeId,
    pub rx: NodeId,
}

impl DirectionalLink {
    pub fn new(tx: impl Into<NodeId>, rx: impl Into<NodeId>) -> Self {
        Self {
            tx: tx.into(),
            rx: rx.into(),
        }
    }

    pub fn reverse(&self) -> Self {
        Self {
            tx: self.rx.clone(),
            rx: self.tx.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Geometric,
    Analytic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Regime {
    NoiseLimited,
    InterferenceLimited,
    Mixed,
}

/// Per-direction computed channel state; lifetime is from first computation until
/// topology destroy or the next update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkState {
    pub snr_db: f64,
    pub sinr_db: Option<f64>,
    pub ber: f64,
    pub per: f64,
    pub modulation: String,
    pub code_rate: f64,
    pub mcs_index: Option<u32>,
    pub delay_ms: f64,
    pub jitter_ms: f64,
    pub loss_percent: f64,
    pub rate_mbps: f64,
    pub engine_used: EngineKind,
    pub regime: Regime,
    pub rms_delay_spread_ns: f64,
    pub path_loss_db: f64,
    /// Set when this link's state is a conservative safe default installed after
    /// a compute failure, per the controller's degraded-link failure semantics.
    pub degraded: bool,
}

/// The applied-form netem parameters. `jitter_ms` is deliberately decoupled from
/// `rms_delay_spread_ns` — see the spec's jitter-source-of-truth design note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetemParams {
    pub delay_ms: f64,
    pub jitter_ms: f64,
    pub loss_percent: f64,
    pub rate_mbps: f64,
}

impl NetemParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.delay_ms < 0.0 {
            return Err(ModelError::InvalidValue {
                field: "delay_ms".to_string(),
                reason: "must be >= 0".to_string(),
            });
        }
        if self.jitter_ms < 0.0 {
            return Err(ModelError::InvalidValue {
                field: "jitter_ms".to_string(),
                reason: "must be >= 0".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&self.loss_percent) {
            return Err(ModelError::InvalidValue {
                field: "loss_percent".to_string(),
                reason: "must be in [0, 100]".to_string(),
            });
        }
        if self.rate_mbps <= 0.0 {
            return Err(ModelError::InvalidValue {
                field: "rate_mbps".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// The conservative safe-default netem installed when a link is marked degraded.
    pub fn safe_default() -> Self {
        Self {
            delay_ms: 200.0,
            jitter_ms: 0.0,
            loss_percent: 50.0,
            rate_mbps: 1.0,
        }
    }

    pub fn from_link_state(state: &LinkState) -> Self {
        Self {
            delay_ms: state.delay_ms,
            jitter_ms: state.jitter_ms,
            loss_percent: state.loss_percent,
            rate_mbps: state.rate_mbps,
        }
    }
}

/// One interferer's contribution to a receiver's SINR, after ACLR filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterferenceTerm {
    pub source_node: NodeId,
    pub power_dbm: f64,
    pub tx_frequency_hz: f64,
    pub tx_bandwidth_hz: f64,
    pub frequency_separation_hz: f64,
    pub aclr_db: f64,
}

/// Process-wide `{node -> transmitting}` map with a monotonically increasing
/// generation counter; SINR computations capture a generation at start so
/// coalesced writes during a compute don't tear a single result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransmissionState {
    state: HashMap<NodeId, bool>,
    generation: u64,
}

impl TransmissionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default policy: a node not present in the map is assumed transmitting.
    pub fn is_transmitting(&self, node: &NodeId) -> bool {
        *self.state.get(node).unwrap_or(&true)
    }

    pub fn set(&mut self, node: NodeId, transmitting: bool) {
        self.state.insert(node, transmitting);
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn as_map(&self) -> &HashMap<NodeId, bool> {
        &self.state
    }
}
