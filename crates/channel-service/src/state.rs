use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::types::EngineType;
use channel_compute::{AnalyticEngine, GeometricEngine, McsSelector, PathResult};
use channel_model::{EngineKind, NodeId, TransmissionState};
use channel_observability::MetricsCollector;
use mcs_table::McsTable;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SceneInfo {
    pub scene_file: String,
    pub frequency_hz: f64,
    pub bandwidth_hz: f64,
}

pub struct AppState {
    pub config: ServiceConfig,
    pub scene: RwLock<Option<SceneInfo>>,
    pub analytic_engine: RwLock<AnalyticEngine>,
    pub geometric_engine: RwLock<GeometricEngine>,
    pub mcs_table: Arc<McsTable>,
    pub mcs_selector: Arc<McsSelector>,
    pub transmission_state: RwLock<TransmissionState>,
    pub metrics: Arc<MetricsCollector>,
    pub prometheus_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(config: ServiceConfig, prometheus_handle: PrometheusHandle) -> Self {
        let indoor_loss = config.indoor_loss_db;
        Self {
            analytic_engine: RwLock::new(AnalyticEngine::new(5.0e9).with_indoor_loss_db(indoor_loss)),
            geometric_engine: RwLock::new(GeometricEngine::new()),
            mcs_table: Arc::new(mcs_table::wifi6_default_table()),
            mcs_selector: Arc::new(McsSelector::new(channel_compute::DEFAULT_HYSTERESIS_DB)),
            transmission_state: RwLock::new(TransmissionState::new()),
            metrics: Arc::new(MetricsCollector::new(Uuid::new_v4())),
            config,
            scene: RwLock::new(None),
            prometheus_handle,
        }
    }

    /// Resolve which engine actually serves `requested`, honouring
    /// `--force-analytic`, and run `path_loss_fn` against it.
    pub async fn resolve_path_loss(
        &self,
        requested: EngineType,
        tx_node: &str,
        rx_node: &str,
        tx_pos: channel_model::Position,
        rx_pos: channel_model::Position,
    ) -> Result<(PathResult, EngineKind, bool), ServiceError> {
        if self.config.force_analytic && requested == EngineType::Geometric {
            return Err(ServiceError::BadRequest(
                "geometric engine requested but server is running with --force-analytic"
                    .to_string(),
            ));
        }

        let effective = if self.config.force_analytic {
            EngineType::Analytic
        } else if requested == EngineType::Auto {
            if self.geometric_engine.read().await.is_loaded() {
                EngineType::Geometric
            } else {
                EngineType::Analytic
            }
        } else {
            requested
        };

        match effective {
            EngineType::Geometric => {
                let engine = self.geometric_engine.read().await;
                let key = channel_compute::GeometricEngine::key(tx_node, rx_node);
                let result = engine.lookup(&key)?;
                Ok((result, EngineKind::Geometric, true))
            }
            EngineType::Analytic | EngineType::Auto => {
                let engine = self.analytic_engine.read().await;
                let result = engine.compute_path(tx_pos, rx_pos)?;
                Ok((result, EngineKind::Analytic, false))
            }
        }
    }

    pub async fn is_scene_loaded(&self) -> bool {
        self.scene.read().await.is_some()
    }

    pub fn mcs_selector_for(&self) -> Arc<McsSelector> {
        self.mcs_selector.clone()
    }

    pub fn node_id(s: &str) -> NodeId {
        NodeId::from(s)
    }
}
