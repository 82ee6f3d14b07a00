//! The Channel Computation Service: an axum HTTP service composing the
//! propagation, link-budget, modulation/MCS and interference/MAC pipeline
//! from `channel-compute` behind a small wire schema.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod types;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(config: ServiceConfig) -> Router {
    // `install_recorder` installs the global recorder once per process; in
    // tests that build multiple routers, later calls are allowed to fail
    // (a recorder is already installed) since we only need the handle back.
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle());

    let enable_cors = config.enable_cors;
    let state = Arc::new(AppState::new(config, handle));

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/scene/load", post(handlers::load_scene))
        .route("/compute/single", post(handlers::compute_single))
        .route("/compute/batch", post(handlers::compute_batch))
        .route("/compute/sinr", post(handlers::compute_sinr))
        .route(
            "/api/transmission/state",
            get(handlers::get_transmission_state).post(handlers::set_transmission_state),
        )
        .route("/metrics", get(handlers::metrics_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let bind_address = config.bind_address.clone();
    let port = config.port;
    let router = build_router(config);
    let listener = tokio::net::TcpListener::bind(format!("{bind_address}:{port}")).await?;
    tracing::info!(%bind_address, port, "channel service listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_no_scene_loaded_initially() {
        let router = build_router(ServiceConfig::default());
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn compute_single_before_scene_load_is_bad_request() {
        let router = build_router(ServiceConfig::default());
        let body = serde_json::json!({
            "node_tx": "a",
            "node_rx": "b",
            "tx": {
                "position": {"x": 0.0, "y": 0.0, "z": 0.0},
                "frequency_hz": 5.18e9,
                "bandwidth_hz": 80e6,
                "tx_power_dbm": 20.0,
                "antenna": {"antenna_pattern": "iso", "antenna_gain_dbi": null},
                "polarization": null,
                "mcs_table": null,
                "mac": null
            },
            "rx": {
                "position": {"x": 20.0, "y": 0.0, "z": 0.0},
                "frequency_hz": 5.18e9,
                "bandwidth_hz": 80e6,
                "tx_power_dbm": 20.0,
                "antenna": {"antenna_pattern": "iso", "antenna_gain_dbi": null},
                "polarization": null,
                "mcs_table": null,
                "mac": null
            }
        });
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/compute/single")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scene_reload_is_conflict() {
        let router = build_router(ServiceConfig::default());
        let load_body = serde_json::json!({
            "scene_file": "scene.json",
            "frequency_hz": 5.18e9,
            "bandwidth_hz": 80e6,
        });
        let first = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scene/load")
                    .header("content-type", "application/json")
                    .body(Body::from(load_body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scene/load")
                    .header("content-type", "application/json")
                    .body(Body::from(load_body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }
}
