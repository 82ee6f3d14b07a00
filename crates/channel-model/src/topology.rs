//! Topology declaration (the external, serde-facing schema from spec §6) plus
//! the validation and directional-link enumeration that the controller drives.

use crate::error::ModelError;
use crate::link::{DirectionalLink, NetemParams, NodeId};
use crate::radio::RadioParams;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDecl {
    pub file: String,
}

/// An interface is either wireless (driven by the channel compute pipeline) or a
/// fixed-netem passthrough (no channel computation, applied verbatim).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterfaceDecl {
    Wireless(RadioParams),
    Fixed(NetemParams),
}

impl InterfaceDecl {
    pub fn validate(&self, name: &str) -> Result<(), ModelError> {
        match self {
            InterfaceDecl::Wireless(radio) => radio.validate(name),
            InterfaceDecl::Fixed(netem) => netem.validate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDecl {
    pub interfaces: HashMap<String, InterfaceDecl>,
}

/// One undirected configured link: a pair of `{node, interface}` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDecl {
    pub node_a: String,
    pub iface_a: String,
    pub node_b: String,
    pub iface_b: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedBridgeConfig {
    pub enabled: bool,
    pub name: String,
    pub nodes: Vec<String>,
    pub interface_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkMode {
    PointToPoint { links: Vec<LinkDecl> },
    SharedBridge { shared_bridge: SharedBridgeConfig },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub scene: SceneDecl,
    pub nodes: HashMap<String, NodeDecl>,
    #[serde(flatten)]
    pub link_mode: LinkMode,
    #[serde(default)]
    pub enable_sinr: bool,
    #[serde(default)]
    pub transmission_state: HashMap<String, bool>,
}

impl Topology {
    /// Validate mutual-exclusion invariants and referential integrity, before any
    /// side effect (provisioning, scene load, ...). Returns every violation found
    /// rather than stopping at the first, so operators see the whole picture.
    pub fn validate(&self) -> Result<(), Vec<ModelError>> {
        let mut errors = Vec::new();

        for (node_name, node) in &self.nodes {
            for (iface_name, iface) in &node.interfaces {
                let full_name = format!("{node_name}.{iface_name}");
                if let Err(e) = iface.validate(&full_name) {
                    errors.push(e);
                }
            }
        }

        match &self.link_mode {
            LinkMode::PointToPoint { links } => {
                for link in links {
                    self.check_endpoint(&link.node_a, &link.iface_a, &mut errors);
                    self.check_endpoint(&link.node_b, &link.iface_b, &mut errors);
                }
            }
            LinkMode::SharedBridge { shared_bridge } => {
                for node_name in &shared_bridge.nodes {
                    self.check_endpoint(node_name, &shared_bridge.interface_name, &mut errors);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_endpoint(&self, node: &str, iface: &str, errors: &mut Vec<ModelError>) {
        match self.nodes.get(node) {
            None => errors.push(ModelError::UnknownNode(node.to_string())),
            Some(n) => {
                if !n.interfaces.contains_key(iface) {
                    errors.push(ModelError::UnknownInterface {
                        node: node.to_string(),
                        iface: iface.to_string(),
                    });
                }
            }
        }
    }

    /// Enumerate every directional link this topology implies. Point-to-point
    /// links yield both directions of each configured pair; shared-bridge yields
    /// the full directed mesh over bridge participants (spec §4.8 step 4).
    pub fn enumerate_directional_links(&self) -> Vec<DirectionalLink> {
        match &self.link_mode {
            LinkMode::PointToPoint { links } => links
                .iter()
                .flat_map(|l| {
                    vec![
                        DirectionalLink::new(l.node_a.clone(), l.node_b.clone()),
                        DirectionalLink::new(l.node_b.clone(), l.node_a.clone()),
                    ]
                })
                .collect(),
            LinkMode::SharedBridge { shared_bridge } => {
                let mut out = Vec::new();
                for tx in &shared_bridge.nodes {
                    for rx in &shared_bridge.nodes {
                        if tx != rx {
                            out.push(DirectionalLink::new(tx.clone(), rx.clone()));
                        }
                    }
                }
                out
            }
        }
    }

    pub fn is_shared_bridge(&self) -> bool {
        matches!(self.link_mode, LinkMode::SharedBridge { .. })
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().map(|s| NodeId::from(s.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::AntennaConfig;

    fn wireless_iface() -> InterfaceDecl {
        InterfaceDecl::Wireless(RadioParams {
            position: crate::position::Position::origin(),
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

    fn two_node_p2p() -> Topology {
        let mut nodes = HashMap::new();
        nodes.insert(
            "n1".to_string(),
            NodeDecl {
                interfaces: HashMap::from([("wlan0".to_string(), wireless_iface())]),
            },
        );
        nodes.insert(
            "n2".to_string(),
            NodeDecl {
                interfaces: HashMap::from([("wlan0".to_string(), wireless_iface())]),
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
                    iface_b: "wlan0".to_string(),
                }],
            },
            enable_sinr: false,
            transmission_state: HashMap::new(),
        }
    }

    #[test]
    fn valid_p2p_topology_passes() {
        assert!(two_node_p2p().validate().is_ok());
    }

    #[test]
    fn p2p_enumerates_both_directions() {
        let links = two_node_p2p().enumerate_directional_links();
        assert_eq!(links.len(), 2);
        assert!(links.contains(&DirectionalLink::new("n1", "n2")));
        assert!(links.contains(&DirectionalLink::new("n2", "n1")));
    }

    #[test]
    fn rejects_link_to_unknown_node() {
        let mut topo = two_node_p2p();
        topo.link_mode = LinkMode::PointToPoint {
            links: vec![LinkDecl {
                node_a: "n1".to_string(),
                iface_a: "wlan0".to_string(),
                node_b: "ghost".to_string(),
                iface_b: "wlan0".to_string(),
            }],
        };
        let errors = topo.validate().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ModelError::UnknownNode(n) if n == "ghost")));
    }

    #[test]
    fn rejects_unknown_interface() {
        let mut topo = two_node_p2p();
        topo.link_mode = LinkMode::PointToPoint {
            links: vec![LinkDecl {
                node_a: "n1".to_string(),
                iface_a: "eth9".to_string(),
                node_b: "n2".to_string(),
                iface_b: "wlan0".to_string(),
            }],
        };
        let errors = topo.validate().unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ModelError::UnknownInterface { iface, .. } if iface == "eth9"
        )));
    }

    #[test]
    fn shared_bridge_enumerates_full_directed_mesh() {
        let mut nodes = HashMap::new();
        for n in ["a", "b", "c"] {
            nodes.insert(
                n.to_string(),
                NodeDecl {
                    interfaces: HashMap::from([("br0".to_string(), wireless_iface())]),
                },
            );
        }
        let topo = Topology {
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
        };
        assert!(topo.validate().is_ok());
        let links = topo.enumerate_directional_links();
        assert_eq!(links.len(), 6); // 3 nodes * 2 directions each
        assert!(topo.is_shared_bridge());
    }
}
