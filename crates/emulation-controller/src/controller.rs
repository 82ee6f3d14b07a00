use crate::client::ChannelServiceClient;
use crate::config::ControllerConfig;
use crate::error::{ControllerError, Result};
use crate::pipeline::{bridge_destination_ip, compute_and_program_link, resolve_interfaces, shared_bridge_config};
use crate::runtime::ContainerRuntime;
use crate::state::{DeploymentState, DeploymentStatus, LinkStatus, TrackedLink};
use channel_model::{DirectionalLink, NodeId, Topology};
use channel_service::types::LoadSceneRequest;
use dashmap::DashMap;
use netem_programmer::{PointToPointProgrammer, ProgrammerConfig, SharedBridgeProgrammer};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Drives topology provisioning, the compute/program pipeline and teardown
/// for deployed topologies, analogous to a netns-based network orchestrator
/// but speaking to the Channel Service instead of a local impairment engine.
pub struct Controller {
    config: ControllerConfig,
    client: ChannelServiceClient,
    runtime: Arc<dyn ContainerRuntime>,
    p2p_programmer: PointToPointProgrammer,
    bridge_programmer: SharedBridgeProgrammer,
    deployments: DashMap<Uuid, Arc<RwLock<DeploymentState>>>,
    link_locks: DashMap<(NodeId, NodeId), Arc<Mutex<()>>>,
}

impl Controller {
    pub fn new(config: ControllerConfig, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let client = ChannelServiceClient::new(&config);
        Self {
            config,
            client,
            runtime,
            p2p_programmer: PointToPointProgrammer::new(ProgrammerConfig::default()),
            bridge_programmer: SharedBridgeProgrammer::new(ProgrammerConfig::default()),
            deployments: DashMap::new(),
            link_locks: DashMap::new(),
        }
    }

    fn link_lock(&self, link: &DirectionalLink) -> Arc<Mutex<()>> {
        self.link_locks
            .entry((link.tx.clone(), link.rx.clone()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Resolve, provision, bind the scene, and perform the initial compute +
    /// program pass for every directional link (spec §4.8 steps 1-7).
    pub async fn deploy(&self, topology: Topology) -> Result<Uuid> {
        topology.validate().map_err(ControllerError::InvalidTopology)?;

        let deployment_id = Uuid::new_v4();
        let mut state = DeploymentState::new(topology.clone());

        for (node_name, node_decl) in &topology.nodes {
            let ifaces: Vec<String> = node_decl.interfaces.keys().cloned().collect();
            let handle = self
                .runtime
                .provision_node(node_name, &ifaces)
                .await
                .map_err(|e| ControllerError::Provision(e.to_string()))?;
            state.nodes.insert(NodeId::from(node_name.clone()), handle);
        }

        if topology.is_shared_bridge() {
            if let channel_model::LinkMode::SharedBridge { shared_bridge } = &topology.link_mode {
                for node_name in &shared_bridge.nodes {
                    if let Some(handle) = state.nodes.get(&NodeId::from(node_name.clone())) {
                        let _ = self
                            .runtime
                            .connect_bridge(handle, &shared_bridge.interface_name, &shared_bridge.name)
                            .await;
                    }
                }
            }
        }

        let center_frequency = topology
            .nodes
            .values()
            .find_map(|n| {
                n.interfaces.values().find_map(|i| match i {
                    channel_model::InterfaceDecl::Wireless(r) => Some(r.frequency_hz),
                    _ => None,
                })
            })
            .unwrap_or(5.18e9);
        let bandwidth = topology
            .nodes
            .values()
            .find_map(|n| {
                n.interfaces.values().find_map(|i| match i {
                    channel_model::InterfaceDecl::Wireless(r) => Some(r.bandwidth_hz),
                    _ => None,
                })
            })
            .unwrap_or(80e6);

        self.client
            .load_scene(&LoadSceneRequest {
                scene_file: topology.scene.file.clone(),
                frequency_hz: center_frequency,
                bandwidth_hz: bandwidth,
            })
            .await
            .map_err(|e| ControllerError::SceneLoad(e.to_string()))?;

        let links = topology.enumerate_directional_links();
        for link in &links {
            if let Some((tx_iface, _)) = resolve_interfaces(&topology, link) {
                if let Some(node_handle) = state.nodes.get(&link.tx) {
                    let veth = node_handle
                        .interfaces
                        .get(tx_iface)
                        .cloned()
                        .unwrap_or_else(|| tx_iface.to_string());
                    state.links.insert(
                        link.clone(),
                        TrackedLink {
                            status: LinkStatus::Active,
                            iface_tx: veth,
                            ns_tx: node_handle.namespace.clone(),
                        },
                    );
                }
            }
        }

        state.status = DeploymentStatus::Running;
        let state = Arc::new(RwLock::new(state));
        self.deployments.insert(deployment_id, state.clone());

        let mut applied = 0u32;
        let mut degraded = 0u32;
        let mut suppressed = 0u32;
        for link in &links {
            let guard = self.link_lock(link);
            let _permit = guard.lock().await;
            let mut s = state.write().await;
            match compute_and_program_link(&mut s, &self.client, &self.p2p_programmer, &self.bridge_programmer, link).await {
                crate::pipeline::ComputeOutcome::Applied => applied += 1,
                crate::pipeline::ComputeOutcome::Suppressed => suppressed += 1,
                crate::pipeline::ComputeOutcome::Degraded => degraded += 1,
            }
        }
        tracing::info!(
            deployment = %deployment_id,
            links = links.len(),
            applied,
            degraded,
            suppressed,
            "deployment complete"
        );

        Ok(deployment_id)
    }

    /// Recompute only the directional links touching `node`, coalesced into
    /// one pass per call (spec §4.8 mobility semantics).
    pub async fn notify_position_changed(&self, deployment_id: Uuid, node: &str) -> Result<()> {
        let state = self
            .deployments
            .get(&deployment_id)
            .ok_or_else(|| ControllerError::UnknownDeployment(deployment_id.to_string()))?
            .clone();

        let affected: Vec<DirectionalLink> = {
            let s = state.read().await;
            s.links
                .keys()
                .filter(|l| l.tx.0 == node || l.rx.0 == node)
                .cloned()
                .collect()
        };

        for link in &affected {
            let guard = self.link_lock(link);
            let _permit = guard.lock().await;
            let mut s = state.write().await;
            compute_and_program_link(&mut s, &self.client, &self.p2p_programmer, &self.bridge_programmer, link).await;
        }
        Ok(())
    }

    /// Best-effort teardown: netem removal, then node teardown, matching the
    /// qdisc-then-veth-then-namespace ordering of the reference orchestrator.
    pub async fn destroy(&self, deployment_id: Uuid) -> Result<()> {
        let (_, state) = self
            .deployments
            .remove(&deployment_id)
            .ok_or_else(|| ControllerError::UnknownDeployment(deployment_id.to_string()))?;

        let s = state.read().await;
        for (link, tracked) in &s.links {
            let result = match shared_bridge_config(&s.topology) {
                Some(shared_bridge) => match bridge_destination_ip(shared_bridge, &link.rx.0) {
                    Some(dest) => {
                        self.bridge_programmer
                            .remove(link, &tracked.ns_tx, &tracked.iface_tx, dest)
                            .await
                    }
                    None => Ok(()),
                },
                None => self.p2p_programmer.remove(link, &tracked.ns_tx, &tracked.iface_tx).await,
            };
            if let Err(e) = result {
                tracing::warn!(tx = %link.tx, rx = %link.rx, error = %e, "qdisc teardown failed");
            }
        }
        for handle in s.nodes.values() {
            if let Err(e) = self.runtime.teardown_node(handle).await {
                tracing::warn!(namespace = %handle.namespace, error = %e, "node teardown failed");
            }
        }
        Ok(())
    }

    /// Tear down every tracked deployment; called on controller shutdown.
    pub async fn shutdown(&self) {
        let ids: Vec<Uuid> = self.deployments.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Err(e) = self.destroy(id).await {
                tracing::warn!(deployment = %id, error = %e, "deployment teardown failed during shutdown");
            }
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if !self.deployments.is_empty() {
            tracing::debug!(
                remaining = self.deployments.len(),
                "controller dropped with deployments still tracked; call shutdown() for graceful teardown"
            );
        }
    }
}
