use crate::error::ServiceError;
use crate::state::{AppState, SceneInfo};
use crate::types::*;
use axum::extract::State;
use axum::Json;
use channel_compute::{
    aggregate_interference, evaluate_mcs, propagation_delay_ms, snr_link, thermal_noise_dbm,
    Interferer, PropagationEngine, ReceiverContext,
};
use channel_model::NodeId;
use std::sync::Arc;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let scene_loaded = state.is_scene_loaded().await;
    let engine_available = state.geometric_engine.read().await.is_loaded() || scene_loaded;
    let engine_forced = if state.config.force_analytic {
        Some(EngineType::Analytic)
    } else {
        None
    };
    Json(HealthResponse {
        scene_loaded,
        engine_available,
        engine_forced,
    })
}

pub async fn load_scene(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoadSceneRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    {
        let mut scene = state.scene.write().await;
        if scene.is_some() {
            return Err(ServiceError::SceneReloadUnsupported);
        }
        *scene = Some(SceneInfo {
            scene_file: req.scene_file.clone(),
            frequency_hz: req.frequency_hz,
            bandwidth_hz: req.bandwidth_hz,
        });
    }
    state.analytic_engine.write().await.load_scene(&req.scene_file)?;
    let _ = state.geometric_engine.write().await.load_scene(&req.scene_file);
    tracing::info!(scene_file = %req.scene_file, "scene loaded");
    Ok(Json(serde_json::json!({ "status": "loaded" })))
}

async fn compute_single_inner(
    state: &AppState,
    req: &ComputeSingleRequest,
) -> Result<ComputeSingleResponse, ServiceError> {
    let (path_result, engine_used, antenna_gain_embedded) = state
        .resolve_path_loss(
            req.engine_type,
            &req.node_tx,
            &req.node_rx,
            req.tx.position,
            req.rx.position,
        )
        .await?;

    let g_tx = req.tx.antenna.resolve_gain_dbi(&req.node_tx)?;
    let g_rx = req.rx.antenna.resolve_gain_dbi(&req.node_rx)?;
    let (g_tx, g_rx) = if antenna_gain_embedded { (0.0, 0.0) } else { (g_tx, g_rx) };

    let (_, snr_db) = snr_link(
        req.tx.tx_power_dbm,
        g_tx,
        g_rx,
        path_result.path_loss_db,
        req.rx.bandwidth_hz,
        req.rx.noise_figure_db,
    );

    let table = state.mcs_table.as_ref();
    let selection = state.mcs_selector.select(
        &NodeId::from(req.node_tx.clone()),
        &NodeId::from(req.node_rx.clone()),
        snr_db,
        table,
    );
    let entry = table
        .get(selection.mcs_index)
        .ok_or_else(|| ServiceError::BadRequest("mcs table has no entries".to_string()))?;

    let modulation_result = evaluate_mcs(
        &entry.modulation,
        entry.code_rate,
        entry.fec_type,
        snr_db,
        req.rx.bandwidth_hz,
        channel_compute::DEFAULT_BLOCK_BITS,
    )?;

    let distance_m = req.tx.position.distance(&req.rx.position);

    Ok(ComputeSingleResponse {
        path_loss_db: path_result.path_loss_db,
        snr_db,
        ber: modulation_result.ber,
        per: modulation_result.per,
        rate_mbps: modulation_result.effective_rate_mbps,
        delay_ms: propagation_delay_ms(distance_m),
        jitter_ms: 0.0,
        rms_delay_spread_ns: path_result.rms_delay_spread_ns,
        mcs_index: Some(selection.mcs_index),
        engine_used,
    })
}

pub async fn compute_single(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ComputeSingleRequest>,
) -> Result<Json<ComputeSingleResponse>, ServiceError> {
    let response = compute_single_inner(&state, &req).await?;
    let link_id = format!("{}->{}", req.node_tx, req.node_rx);
    state.metrics.link(&link_id).record_compute(channel_observability::LinkChannelStats {
        link_id,
        snr_db: response.snr_db,
        sinr_db: None,
        ber: response.ber,
        per: response.per,
        mcs_index: response.mcs_index,
        rate_mbps: response.rate_mbps,
        engine_used: format!("{:?}", response.engine_used),
        regime: "n/a".to_string(),
        degraded: false,
        last_updated: chrono::Utc::now(),
    });
    Ok(Json(response))
}

pub async fn compute_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ComputeBatchRequest>,
) -> Result<Json<Vec<ComputeSingleResponse>>, ServiceError> {
    let mut out = Vec::with_capacity(req.links.len());
    for link in &req.links {
        out.push(compute_single_inner(&state, link).await?);
    }
    Ok(Json(out))
}

pub async fn compute_sinr(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ComputeSinrRequest>,
) -> Result<Json<ComputeSinrResponse>, ServiceError> {
    let (path_result, engine_used, antenna_gain_embedded) = state
        .resolve_path_loss(
            req.engine_type,
            &req.node_tx,
            &req.node_rx,
            req.desired_tx.position,
            req.receiver.position,
        )
        .await?;

    let g_tx = req.desired_tx.antenna.resolve_gain_dbi(&req.node_tx)?;
    let g_rx = req.receiver.antenna.resolve_gain_dbi(&req.node_rx)?;
    let (g_tx_eff, g_rx_eff) = if antenna_gain_embedded { (0.0, 0.0) } else { (g_tx, g_rx) };

    let (signal_dbm, snr_db) = snr_link(
        req.desired_tx.tx_power_dbm,
        g_tx_eff,
        g_rx_eff,
        path_result.path_loss_db,
        req.receiver.bandwidth_hz,
        req.receiver.noise_figure_db,
    );

    let noise_dbm = thermal_noise_dbm(req.receiver.bandwidth_hz, req.receiver.noise_figure_db);
    let receiver_ctx = ReceiverContext {
        position: req.receiver.position,
        g_rx_dbi: g_rx,
        frequency_hz: req.receiver.frequency_hz,
        bandwidth_hz: req.receiver.bandwidth_hz,
        noise_dbm,
        rx_sensitivity_dbm: req.receiver.rx_sensitivity_dbm,
    };

    let analytic_engine = state.analytic_engine.read().await.clone();
    let geometric_snapshot_unavailable = !antenna_gain_embedded;
    let interferers: Vec<Interferer> = req
        .interferers
        .iter()
        .map(|i| Interferer {
            node: NodeId::from(i.node.clone()),
            position: i.position,
            tx_power_dbm: i.tx_power_dbm,
            g_tx_dbi: i.g_tx_dbi,
            frequency_hz: i.frequency_hz,
            bandwidth_hz: i.bandwidth_hz,
            active_prob: i.active_prob,
        })
        .collect();

    let result = aggregate_interference(&receiver_ctx, signal_dbm, &interferers, antenna_gain_embedded, |tx, rx| {
        if geometric_snapshot_unavailable {
            analytic_engine
                .compute_path(tx, rx)
                .map(|p| p.path_loss_db)
                .unwrap_or(f64::INFINITY)
        } else {
            path_result.path_loss_db
        }
    });

    let table = state.mcs_table.as_ref();
    let selection = state.mcs_selector.select(
        &NodeId::from(req.node_tx.clone()),
        &NodeId::from(req.node_rx.clone()),
        result.sinr_db,
        table,
    );
    let entry = table
        .get(selection.mcs_index)
        .ok_or_else(|| ServiceError::BadRequest("mcs table has no entries".to_string()))?;
    let modulation_result = evaluate_mcs(
        &entry.modulation,
        entry.code_rate,
        entry.fec_type,
        result.sinr_db,
        req.receiver.bandwidth_hz,
        channel_compute::DEFAULT_BLOCK_BITS,
    )?;

    Ok(Json(ComputeSinrResponse {
        snr_db,
        sinr_db: result.sinr_db,
        per: modulation_result.per,
        rate_mbps: modulation_result.effective_rate_mbps,
        mcs_index: Some(selection.mcs_index),
        regime: result.regime,
        interferer_terms: result
            .terms
            .into_iter()
            .map(|t| InterferenceTermView {
                source: t.source_node,
                power_dbm: t.power_dbm,
                aclr_db: t.aclr_db,
                frequency_separation_hz: t.frequency_separation_hz,
            })
            .collect(),
        engine_used,
    }))
}

pub async fn get_transmission_state(
    State(state): State<Arc<AppState>>,
) -> Json<TransmissionStateResponse> {
    let ts = state.transmission_state.read().await;
    let state_map = ts
        .as_map()
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();
    Json(TransmissionStateResponse {
        state: state_map,
        generation: ts.generation(),
    })
}

pub async fn set_transmission_state(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetTransmissionStateRequest>,
) -> Json<TransmissionStateResponse> {
    let mut ts = state.transmission_state.write().await;
    ts.set(NodeId::from(req.node), req.transmitting);
    let state_map = ts
        .as_map()
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();
    Json(TransmissionStateResponse {
        state: state_map,
        generation: ts.generation(),
    })
}

pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> String {
    state.prometheus_handle.render()
}
