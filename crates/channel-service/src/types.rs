use channel_model::{EngineKind, NodeId, Regime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineType {
    Auto,
    Geometric,
    Analytic,
}

impl Default for EngineType {
    fn default() -> Self {
        EngineType::Auto
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSceneRequest {
    pub scene_file: String,
    pub frequency_hz: f64,
    pub bandwidth_hz: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub scene_loaded: bool,
    pub engine_available: bool,
    pub engine_forced: Option<EngineType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeSingleRequest {
    pub node_tx: String,
    pub node_rx: String,
    pub tx: channel_model::RadioParams,
    pub rx: channel_model::RadioParams,
    #[serde(default)]
    pub engine_type: EngineType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeSingleResponse {
    pub path_loss_db: f64,
    pub snr_db: f64,
    pub ber: f64,
    pub per: f64,
    pub rate_mbps: f64,
    pub delay_ms: f64,
    pub jitter_ms: f64,
    pub rms_delay_spread_ns: f64,
    pub mcs_index: Option<u32>,
    pub engine_used: EngineKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeBatchRequest {
    pub links: Vec<ComputeSingleRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfererRequest {
    pub node: String,
    pub position: channel_model::Position,
    pub tx_power_dbm: f64,
    #[serde(default)]
    pub g_tx_dbi: f64,
    pub frequency_hz: f64,
    pub bandwidth_hz: f64,
    pub active_prob: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeSinrRequest {
    pub node_rx: String,
    pub node_tx: String,
    pub receiver: channel_model::RadioParams,
    pub desired_tx: channel_model::RadioParams,
    pub interferers: Vec<InterfererRequest>,
    #[serde(default)]
    pub engine_type: EngineType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterferenceTermView {
    pub source: NodeId,
    pub power_dbm: f64,
    pub aclr_db: f64,
    pub frequency_separation_hz: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeSinrResponse {
    pub snr_db: f64,
    pub sinr_db: f64,
    pub per: f64,
    pub rate_mbps: f64,
    pub mcs_index: Option<u32>,
    pub regime: Regime,
    pub interferer_terms: Vec<InterferenceTermView>,
    pub engine_used: EngineKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTransmissionStateRequest {
    pub node: String,
    pub transmitting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmissionStateResponse {
    pub state: std::collections::HashMap<String, bool>,
    pub generation: u64,
}
