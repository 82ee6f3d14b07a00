//! Per-deployment state tracking, mirroring the active-links/link-resources
//! bookkeeping a netns-based orchestrator keeps for robust teardown.

use crate::runtime::NodeHandle;
use channel_model::{DirectionalLink, NodeId, Topology};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Active,
    Degraded,
    Unmanaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Provisioning,
    Running,
    Partial,
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct TrackedLink {
    pub status: LinkStatus,
    pub iface_tx: String,
    pub ns_tx: String,
}

pub struct DeploymentState {
    pub topology: Topology,
    pub status: DeploymentStatus,
    pub nodes: HashMap<NodeId, NodeHandle>,
    pub links: HashMap<DirectionalLink, TrackedLink>,
}

impl DeploymentState {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            status: DeploymentStatus::Provisioning,
            nodes: HashMap::new(),
            links: HashMap::new(),
        }
    }

    pub fn mark_degraded(&mut self, link: &DirectionalLink) {
        if let Some(tracked) = self.links.get_mut(link) {
            tracked.status = LinkStatus::Degraded;
        }
    }

    pub fn mark_unmanaged(&mut self, link: &DirectionalLink) {
        if let Some(tracked) = self.links.get_mut(link) {
            tracked.status = LinkStatus::Unmanaged;
        }
    }

    pub fn degraded_links(&self) -> Vec<&DirectionalLink> {
        self.links
            .iter()
            .filter(|(_, t)| t.status == LinkStatus::Degraded)
            .map(|(l, _)| l)
            .collect()
    }
}
