//! CLI command implementations, extracted from `main.rs` for testability.

use anyhow::{Context, Result};
use channel_model::Topology;
use channel_service::ServiceConfig;
use emulation_controller::{Controller, ControllerConfig, ContainerRuntime, NetnsRuntime, NodeHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

fn load_topology(path: &str) -> Result<Topology> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading topology file {path}"))?;
    let topology: Topology =
        serde_json::from_str(&raw).with_context(|| format!("parsing topology file {path}"))?;
    Ok(topology)
}

/// Implementation of the `validate` command: load and check invariants only.
pub fn cmd_validate(topology_path: String) -> Result<()> {
    let topology = load_topology(&topology_path)?;
    match topology.validate() {
        Ok(()) => {
            println!("topology is valid: {} node(s)", topology.nodes.len());
            Ok(())
        }
        Err(errors) => {
            println!("topology is invalid:");
            for e in &errors {
                println!("  - {e}");
            }
            anyhow::bail!("{} validation error(s)", errors.len());
        }
    }
}

/// Implementation of the `deploy` command: provision, compute/program, then
/// run until interrupted and tear down (mirrors the testbench's bring-up /
/// ctrl-c / shutdown lifecycle).
pub async fn cmd_deploy(topology_path: String, service_url: String) -> Result<()> {
    let topology = load_topology(&topology_path)?;
    topology
        .validate()
        .map_err(|errors| anyhow::anyhow!("topology invalid: {errors:?}"))?;

    let mut config = ControllerConfig::default();
    config.service_base_url = service_url;

    let runtime: Arc<dyn ContainerRuntime> = Arc::new(NetnsRuntime::new());
    let controller = Controller::new(config, runtime);

    let deployment_id = controller.deploy(topology).await?;
    info!(deployment = %deployment_id, "deployment running, press ctrl-c to tear down");

    signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("interrupted, tearing down");

    controller.destroy(deployment_id).await?;
    info!("deployment torn down");
    Ok(())
}

/// Implementation of the `destroy` command: re-derive the deterministic
/// namespace/interface handles a `deploy` of this topology would have
/// created, and tear them down without needing a live controller.
pub async fn cmd_destroy(topology_path: String) -> Result<()> {
    let topology = load_topology(&topology_path)?;
    let runtime = NetnsRuntime::new();

    for (node_name, node_decl) in &topology.nodes {
        let interfaces: HashMap<String, String> = node_decl
            .interfaces
            .keys()
            .map(|iface| (iface.clone(), format!("{node_name}-{iface}")))
            .collect();
        let handle = NodeHandle {
            namespace: format!("ce-{node_name}"),
            interfaces,
        };
        if let Err(e) = runtime.teardown_node(&handle).await {
            tracing::warn!(node = node_name, error = %e, "teardown failed");
        } else {
            info!(node = node_name, "torn down");
        }
    }
    Ok(())
}

/// Implementation of the `status` command: query the Channel Service's health.
pub async fn cmd_status(service_url: String) -> Result<()> {
    let resp = reqwest::get(format!("{service_url}/health"))
        .await
        .context("requesting /health")?;
    let body: serde_json::Value = resp.json().await.context("parsing /health response")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Implementation of the `channel-server` command: run the Channel Service.
pub async fn cmd_channel_server(bind_address: String, port: u16, force_analytic: bool) -> Result<()> {
    let config = ServiceConfig {
        bind_address,
        port,
        force_analytic,
        ..ServiceConfig::default()
    };
    info!(bind_address = %config.bind_address, port = config.port, "starting channel service");
    channel_service::serve(config).await.context("channel service exited")?;
    Ok(())
}
