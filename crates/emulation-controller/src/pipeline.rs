//! Compute-then-program pipeline for one directional link: resolve its
//! endpoint radios from the topology, call the Channel Service (`/compute/single`
//! or, for SINR-aware topologies, `/compute/sinr` with the active interferer
//! set), then hand the resulting netem parameters and selection metric to
//! whichever Netem Programmer actuates this link's interface.

use crate::client::ChannelServiceClient;
use crate::state::{DeploymentState, LinkStatus, TrackedLink};
use channel_compute::{csma_activity_prob, tdma_activity_prob, tdma_throughput_multiplier, propagation_delay_ms};
use channel_model::{
    DirectionalLink, InterfaceDecl, LinkMode, MacConfig, NetemParams, NodeDecl, RadioParams, SharedBridgeConfig,
    Topology,
};
use channel_service::types::{ComputeSingleRequest, ComputeSinrRequest, EngineType, InterfererRequest};
use netem_programmer::{PointToPointProgrammer, SharedBridgeProgrammer};
use std::net::{IpAddr, Ipv4Addr};

/// Looks up which interface on each endpoint of `link` carries this directional
/// link, per the configured link/shared-bridge mode.
pub fn resolve_interfaces<'a>(topology: &'a Topology, link: &DirectionalLink) -> Option<(&'a str, &'a str)> {
    match &topology.link_mode {
        LinkMode::PointToPoint { links } => links.iter().find_map(|l| {
            if l.node_a == link.tx.0 && l.node_b == link.rx.0 {
                Some((l.iface_a.as_str(), l.iface_b.as_str()))
            } else if l.node_b == link.tx.0 && l.node_a == link.rx.0 {
                Some((l.iface_b.as_str(), l.iface_a.as_str()))
            } else {
                None
            }
        }),
        LinkMode::SharedBridge { shared_bridge } => {
            if shared_bridge.nodes.contains(&link.tx.0) && shared_bridge.nodes.contains(&link.rx.0) {
                Some((shared_bridge.interface_name.as_str(), shared_bridge.interface_name.as_str()))
            } else {
                None
            }
        }
    }
}

pub fn shared_bridge_config(topology: &Topology) -> Option<&SharedBridgeConfig> {
    match &topology.link_mode {
        LinkMode::SharedBridge { shared_bridge } => Some(shared_bridge),
        LinkMode::PointToPoint { .. } => None,
    }
}

/// Deterministic destination address for a shared-bridge peer, derived from its
/// position in `shared_bridge.nodes` so every controller instance reading the
/// same topology assigns the same address without a separate allocator.
pub fn bridge_destination_ip(shared_bridge: &SharedBridgeConfig, node: &str) -> Option<IpAddr> {
    let idx = shared_bridge.nodes.iter().position(|n| n == node)?;
    let last_octet = u8::try_from(idx + 2).ok()?;
    Some(IpAddr::V4(Ipv4Addr::new(10, 200, 0, last_octet)))
}

fn radio_params(topology: &Topology, node: &str, iface: &str) -> Option<RadioParams> {
    let node_decl = topology.nodes.get(node)?;
    match node_decl.interfaces.get(iface)? {
        InterfaceDecl::Wireless(radio) => Some(radio.clone()),
        InterfaceDecl::Fixed(_) => None,
    }
}

fn first_wireless_radio(node_decl: &NodeDecl) -> Option<&RadioParams> {
    node_decl.interfaces.values().find_map(|i| match i {
        InterfaceDecl::Wireless(r) => Some(r),
        InterfaceDecl::Fixed(_) => None,
    })
}

/// Medium participants for the MAC throughput multiplier: the two endpoints for
/// a point-to-point link, or every node sharing the bridge interface.
fn medium_node_count(topology: &Topology) -> u32 {
    match &topology.link_mode {
        LinkMode::PointToPoint { .. } => 2,
        LinkMode::SharedBridge { shared_bridge } => shared_bridge.nodes.len() as u32,
    }
}

/// Activity probability for one interferer, per its own MAC block (spec §4.3/§4.5
/// C5). A node with no MAC configuration is assumed always active.
fn mac_activity_prob(interferer_radio: &RadioParams, rx_radio: &RadioParams, comm_range_m: f64) -> f64 {
    match &interferer_radio.mac {
        Some(MacConfig::Csma(cfg)) => {
            let distance_m = interferer_radio.position.distance(&rx_radio.position);
            csma_activity_prob(distance_m, comm_range_m, cfg)
        }
        Some(MacConfig::Tdma(cfg)) => {
            let interferer_slots = cfg.fixed_slot_map.clone().unwrap_or_default();
            let own_slots = match &rx_radio.mac {
                Some(MacConfig::Tdma(rx_cfg)) => rx_cfg.fixed_slot_map.clone().unwrap_or_default(),
                _ => Vec::new(),
            };
            tdma_activity_prob(cfg, &interferer_slots, &own_slots)
        }
        None => 1.0,
    }
}

/// Build the interferer set for a SINR-aware compute: every other node in the
/// topology currently transmitting (absent entries in `transmission_state`
/// default to transmitting), with its MAC-derived activity probability.
fn build_interferers(topology: &Topology, link: &DirectionalLink, tx_radio: &RadioParams, rx_radio: &RadioParams) -> Vec<InterfererRequest> {
    let comm_range_m = tx_radio.position.distance(&rx_radio.position);
    topology
        .nodes
        .iter()
        .filter(|(node_name, _)| node_name.as_str() != link.tx.0.as_str() && node_name.as_str() != link.rx.0.as_str())
        .filter(|(node_name, _)| topology.transmission_state.get(node_name.as_str()).copied().unwrap_or(true))
        .filter_map(|(node_name, node_decl)| {
            let radio = first_wireless_radio(node_decl)?;
            Some(InterfererRequest {
                node: node_name.clone(),
                position: radio.position,
                tx_power_dbm: radio.tx_power_dbm,
                g_tx_dbi: radio.antenna.resolve_gain_dbi(node_name).unwrap_or(0.0),
                frequency_hz: radio.frequency_hz,
                bandwidth_hz: radio.bandwidth_hz,
                active_prob: mac_activity_prob(radio, rx_radio, comm_range_m),
            })
        })
        .collect()
}

/// Scale `rate_mbps` by the transmitter's MAC throughput multiplier (spec §4.3/§4.5
/// C5), clamped to stay positive so `NetemParams::validate` never rejects it.
fn apply_mac_throughput_multiplier(rate_mbps: f64, tx_radio: &RadioParams, num_nodes: u32) -> f64 {
    let Some(MacConfig::Tdma(cfg)) = &tx_radio.mac else {
        return rate_mbps;
    };
    let own_slots = cfg.fixed_slot_map.clone().unwrap_or_default();
    let multiplier = tdma_throughput_multiplier(cfg, &own_slots, num_nodes);
    (rate_mbps * multiplier).max(0.01)
}

pub enum ComputeOutcome {
    Applied,
    Suppressed,
    Degraded,
}

struct LinkOutcome {
    netem: NetemParams,
    metric_db: f64,
    mcs_index: Option<u32>,
}

async fn compute_link_outcome(
    state: &mut DeploymentState,
    client: &ChannelServiceClient,
    link: &DirectionalLink,
    tx_radio: RadioParams,
    rx_radio: RadioParams,
) -> LinkOutcome {
    let node_count = medium_node_count(&state.topology);

    if state.topology.enable_sinr {
        let interferers = build_interferers(&state.topology, link, &tx_radio, &rx_radio);
        let request = ComputeSinrRequest {
            node_rx: link.rx.0.clone(),
            node_tx: link.tx.0.clone(),
            receiver: rx_radio.clone(),
            desired_tx: tx_radio.clone(),
            interferers,
            engine_type: EngineType::Auto,
        };

        match client.compute_sinr(&request).await {
            Ok(response) => {
                let distance_m = tx_radio.position.distance(&rx_radio.position);
                let rate_mbps = apply_mac_throughput_multiplier(response.rate_mbps, &tx_radio, node_count);
                LinkOutcome {
                    netem: NetemParams {
                        delay_ms: propagation_delay_ms(distance_m),
                        jitter_ms: 0.0,
                        loss_percent: per_to_loss_percent(response.per),
                        rate_mbps,
                    },
                    metric_db: response.sinr_db,
                    mcs_index: response.mcs_index,
                }
            }
            Err(e) => {
                tracing::warn!(tx = %link.tx, rx = %link.rx, error = %e, "sinr compute failed, installing safe default");
                state.mark_degraded(link);
                LinkOutcome {
                    netem: NetemParams::safe_default(),
                    metric_db: 0.0,
                    mcs_index: None,
                }
            }
        }
    } else {
        let request = ComputeSingleRequest {
            node_tx: link.tx.0.clone(),
            node_rx: link.rx.0.clone(),
            tx: tx_radio.clone(),
            rx: rx_radio,
            engine_type: EngineType::Auto,
        };

        match client.compute_single(&request).await {
            Ok(response) => {
                let rate_mbps = apply_mac_throughput_multiplier(response.rate_mbps, &tx_radio, node_count);
                LinkOutcome {
                    netem: NetemParams {
                        delay_ms: response.delay_ms,
                        jitter_ms: response.jitter_ms,
                        loss_percent: per_to_loss_percent(response.per),
                        rate_mbps,
                    },
                    metric_db: response.snr_db,
                    mcs_index: response.mcs_index,
                }
            }
            Err(e) => {
                tracing::warn!(tx = %link.tx, rx = %link.rx, error = %e, "compute failed, installing safe default");
                state.mark_degraded(link);
                LinkOutcome {
                    netem: NetemParams::safe_default(),
                    metric_db: 0.0,
                    mcs_index: None,
                }
            }
        }
    }
}

/// Compute one directional link's channel state and program it, marking the
/// link `degraded` with a safe-default netem on compute failure rather than
/// propagating the error (spec failure-semantics §4.8).
pub async fn compute_and_program_link(
    state: &mut DeploymentState,
    client: &ChannelServiceClient,
    p2p_programmer: &PointToPointProgrammer,
    bridge_programmer: &SharedBridgeProgrammer,
    link: &DirectionalLink,
) -> ComputeOutcome {
    let Some((tx_iface, rx_iface)) = resolve_interfaces(&state.topology, link) else {
        state.mark_unmanaged(link);
        return ComputeOutcome::Degraded;
    };

    let (tx_radio, rx_radio) = match (
        radio_params(&state.topology, &link.tx.0, tx_iface),
        radio_params(&state.topology, &link.rx.0, rx_iface),
    ) {
        (Some(tx), Some(rx)) => (tx, rx),
        _ => {
            state.mark_unmanaged(link);
            return ComputeOutcome::Degraded;
        }
    };

    let outcome = compute_link_outcome(state, client, link, tx_radio, rx_radio).await;

    let Some(tracked) = state.links.get(link) else {
        return ComputeOutcome::Degraded;
    };
    let ns = tracked.ns_tx.clone();
    let iface = tracked.iface_tx.clone();

    let apply_result = if let Some(shared_bridge) = shared_bridge_config(&state.topology) {
        let Some(dest) = bridge_destination_ip(shared_bridge, &link.rx.0) else {
            state.mark_unmanaged(link);
            return ComputeOutcome::Degraded;
        };
        bridge_programmer
            .apply(link, &ns, &iface, dest, outcome.metric_db, outcome.mcs_index, outcome.netem)
            .await
    } else {
        p2p_programmer
            .apply(link, &ns, &iface, outcome.metric_db, outcome.mcs_index, outcome.netem)
            .await
    };

    match apply_result {
        Ok(true) => {
            state.links.insert(
                link.clone(),
                TrackedLink {
                    status: LinkStatus::Active,
                    iface_tx: iface,
                    ns_tx: ns,
                },
            );
            ComputeOutcome::Applied
        }
        Ok(false) => ComputeOutcome::Suppressed,
        Err(e) => {
            tracing::error!(tx = %link.tx, rx = %link.rx, error = %e, "netem programming failed");
            state.mark_unmanaged(link);
            ComputeOutcome::Degraded
        }
    }
}

fn per_to_loss_percent(per: f64) -> f64 {
    (per * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_model::{AntennaConfig, LinkDecl, NodeDecl, Position, SceneDecl};
    use std::collections::HashMap;

    fn radio() -> InterfaceDecl {
        InterfaceDecl::Wireless(RadioParams {
            position: Position::origin(),
            frequency_hz: 5.18e9,
            bandwidth_hz: 80e6,
            tx_power_dbm: 20.0,
            noise_figure_db: 7.0,
            rx_sensitivity_dbm: -80.0,
            antenna: AntennaConfig::pattern("iso"),
            polarization: None,
            mcs_table: None,
            mac: None,
        })
    }

    fn topology() -> Topology {
        let mut nodes = HashMap::new();
        nodes.insert(
            "n1".to_string(),
            NodeDecl {
                interfaces: HashMap::from([("wlan0".to_string(), radio())]),
            },
        );
        nodes.insert(
            "n2".to_string(),
            NodeDecl {
                interfaces: HashMap::from([("wlan1".to_string(), radio())]),
            },
        );
        Topology {
            scene: SceneDecl {
                file: "scene.json".to_string(),
            },
            nodes,
            link_mode: LinkMode::PointToPoint {
                links: vec![LinkDecl {
                    node_a: "n1".to_string(),
                    iface_a: "wlan0".to_string(),
                    node_b: "n2".to_string(),
                    iface_b: "wlan1".to_string(),
                }],
            },
            enable_sinr: false,
            transmission_state: HashMap::new(),
        }
    }

    fn bridge_topology() -> Topology {
        let mut nodes = HashMap::new();
        for n in ["a", "b", "c"] {
            nodes.insert(
                n.to_string(),
                NodeDecl {
                    interfaces: HashMap::from([("br0".to_string(), radio())]),
                },
            );
        }
        Topology {
            scene: SceneDecl {
                file: "scene.json".to_string(),
            },
            nodes,
            link_mode: LinkMode::SharedBridge {
                shared_bridge: SharedBridgeConfig {
                    enabled: true,
                    name: "br0".to_string(),
                    nodes: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                    interface_name: "br0".to_string(),
                },
            },
            enable_sinr: true,
            transmission_state: HashMap::new(),
        }
    }

    #[test]
    fn resolves_interfaces_for_either_direction() {
        let topo = topology();
        let forward = resolve_interfaces(&topo, &DirectionalLink::new("n1", "n2")).unwrap();
        assert_eq!(forward, ("wlan0", "wlan1"));
        let reverse = resolve_interfaces(&topo, &DirectionalLink::new("n2", "n1")).unwrap();
        assert_eq!(reverse, ("wlan1", "wlan0"));
    }

    #[test]
    fn unconfigured_link_resolves_to_none() {
        let topo = topology();
        assert!(resolve_interfaces(&topo, &DirectionalLink::new("n1", "ghost")).is_none());
    }

    #[test]
    fn per_converts_to_percent_and_clamps() {
        assert_eq!(per_to_loss_percent(0.5), 50.0);
        assert_eq!(per_to_loss_percent(2.0), 100.0);
    }

    #[test]
    fn bridge_destination_ip_is_stable_and_dense() {
        let topo = bridge_topology();
        let shared_bridge = shared_bridge_config(&topo).unwrap();
        let ip_a = bridge_destination_ip(shared_bridge, "a").unwrap();
        let ip_b = bridge_destination_ip(shared_bridge, "b").unwrap();
        assert_eq!(ip_a, IpAddr::V4(Ipv4Addr::new(10, 200, 0, 2)));
        assert_eq!(ip_b, IpAddr::V4(Ipv4Addr::new(10, 200, 0, 3)));
        assert!(bridge_destination_ip(shared_bridge, "ghost").is_none());
    }

    #[test]
    fn medium_node_count_matches_bridge_participant_count() {
        assert_eq!(medium_node_count(&topology()), 2);
        assert_eq!(medium_node_count(&bridge_topology()), 3);
    }

    #[test]
    fn build_interferers_excludes_endpoints_and_silenced_nodes() {
        let mut topo = bridge_topology();
        topo.transmission_state.insert("c".to_string(), false);
        let link = DirectionalLink::new("a", "b");
        let tx_radio = radio_params(&topo, "a", "br0").unwrap();
        let rx_radio = radio_params(&topo, "b", "br0").unwrap();
        let interferers = build_interferers(&topo, &link, &tx_radio, &rx_radio);
        assert!(interferers.is_empty());
    }

    #[test]
    fn no_mac_config_defaults_to_always_active() {
        let r = radio_params(&topology(), "n1", "wlan0").unwrap();
        assert_eq!(mac_activity_prob(&r, &r, 10.0), 1.0);
    }

    #[test]
    fn no_tdma_mac_leaves_rate_unchanged() {
        let r = radio_params(&topology(), "n1", "wlan0").unwrap();
        assert_eq!(apply_mac_throughput_multiplier(10.0, &r, 2), 10.0);
    }
}
