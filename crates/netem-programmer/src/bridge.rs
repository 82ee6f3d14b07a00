//! Shared-bridge classful actuator: one HTB root on the shared egress
//! interface, one child class + netem qdisc + destination filter per
//! peer sharing that interface. Generalises the single-class pattern
//! in `netns-testbench::bench::apply_profile_to_iface` to N destinations.

use crate::config::ProgrammerConfig;
use crate::error::ProgrammerError;
use crate::shell::{netem_args, run_tc};
use channel_model::{DirectionalLink, NetemParams};
use dashmap::DashMap;
use std::net::IpAddr;
use std::time::Instant;

#[derive(Debug, Clone)]
struct AppliedState {
    metric_db: f64,
    mcs_index: Option<u32>,
    applied_at: Instant,
}

/// Tracks the dense class-id index assigned to each destination sharing
/// one bridge interface, so handles stay stable across repeated applies.
pub struct SharedBridgeProgrammer {
    /// (ns, iface) -> next free destination index.
    next_index: DashMap<(String, String), u16>,
    /// (ns, iface, dest) -> assigned destination index.
    index_of: DashMap<(String, String, IpAddr), u16>,
    last: DashMap<DirectionalLink, AppliedState>,
    root_initialized: DashMap<(String, String), ()>,
    config: ProgrammerConfig,
}

impl SharedBridgeProgrammer {
    pub fn new(config: ProgrammerConfig) -> Self {
        Self {
            next_index: DashMap::new(),
            index_of: DashMap::new(),
            last: DashMap::new(),
            root_initialized: DashMap::new(),
            config,
        }
    }

    fn class_index(&self, ns: &str, iface: &str, dest: IpAddr) -> u16 {
        let key = (ns.to_string(), iface.to_string(), dest);
        if let Some(existing) = self.index_of.get(&key) {
            return *existing;
        }
        // Destination class-ids start at 11: class 10 is the HTB default class
        // installed by `ensure_root` and must never be reassigned to a peer.
        let counter_key = (ns.to_string(), iface.to_string());
        let mut counter = self.next_index.entry(counter_key).or_insert(11);
        let assigned = *counter;
        *counter += 1;
        self.index_of.insert(key, assigned);
        assigned
    }

    async fn ensure_root(&self, ns: &str, iface: &str, default_rate_mbps: f64) -> Result<(), ProgrammerError> {
        let key = (ns.to_string(), iface.to_string());
        if self.root_initialized.contains_key(&key) {
            return Ok(());
        }
        let root_args = vec![
            "qdisc".to_string(),
            "replace".to_string(),
            "dev".to_string(),
            iface.to_string(),
            "root".to_string(),
            "handle".to_string(),
            "1:".to_string(),
            "htb".to_string(),
            "default".to_string(),
            "10".to_string(),
        ];
        run_tc(ns, iface, &root_args).await?;

        let default_rate_kbit = ((default_rate_mbps.max(1.0)) * 1000.0) as u64;
        let class_args = vec![
            "class".to_string(),
            "replace".to_string(),
            "dev".to_string(),
            iface.to_string(),
            "parent".to_string(),
            "1:".to_string(),
            "classid".to_string(),
            "1:10".to_string(),
            "htb".to_string(),
            "rate".to_string(),
            format!("{default_rate_kbit}kbit"),
            "ceil".to_string(),
            format!("{default_rate_kbit}kbit"),
        ];
        run_tc(ns, iface, &class_args).await?;

        self.root_initialized.insert(key, ());
        Ok(())
    }

    /// Apply netem for one destination on a shared bridge interface,
    /// creating its HTB class/filter on first use and reusing the same
    /// class-id handle thereafter. Returns `true` if `tc` state changed.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply(
        &self,
        link: &DirectionalLink,
        ns: &str,
        iface: &str,
        dest: IpAddr,
        metric_db: f64,
        mcs_index: Option<u32>,
        netem: NetemParams,
    ) -> Result<bool, ProgrammerError> {
        if let Some(prev) = self.last.get(link) {
            let elapsed_ms = prev.applied_at.elapsed().as_millis() as u64;
            let metric_delta = (metric_db - prev.metric_db).abs();
            let mcs_changed = mcs_index != prev.mcs_index;
            if self.config.should_suppress(elapsed_ms, metric_delta, mcs_changed) {
                return Ok(false);
            }
        }

        let rate_for_default = if netem.rate_mbps > 0.0 { netem.rate_mbps } else { 1000.0 };
        self.ensure_root(ns, iface, rate_for_default).await?;

        let idx = self.class_index(ns, iface, dest);
        let classid = format!("1:{idx}");
        let handle = format!("{idx}:");
        let rate_kbit = ((netem.rate_mbps.max(1.0)) * 1000.0) as u64;

        let class_args = vec![
            "class".to_string(),
            "replace".to_string(),
            "dev".to_string(),
            iface.to_string(),
            "parent".to_string(),
            "1:".to_string(),
            "classid".to_string(),
            classid.clone(),
            "htb".to_string(),
            "rate".to_string(),
            format!("{rate_kbit}kbit"),
            "ceil".to_string(),
            format!("{rate_kbit}kbit"),
        ];
        run_tc(ns, iface, &class_args).await?;

        let mut netem_qdisc_args = vec![
            "qdisc".to_string(),
            "replace".to_string(),
            "dev".to_string(),
            iface.to_string(),
            "parent".to_string(),
            classid.clone(),
            "handle".to_string(),
            handle,
        ];
        netem_qdisc_args.extend(netem_args(
            netem.delay_ms,
            netem.jitter_ms,
            netem.loss_percent,
            netem.rate_mbps,
        ));
        run_tc(ns, iface, &netem_qdisc_args).await?;

        let filter_args = vec![
            "filter".to_string(),
            "replace".to_string(),
            "dev".to_string(),
            iface.to_string(),
            "protocol".to_string(),
            "ip".to_string(),
            "parent".to_string(),
            "1:".to_string(),
            "prio".to_string(),
            "1".to_string(),
            "u32".to_string(),
            "match".to_string(),
            "ip".to_string(),
            "dst".to_string(),
            format!("{dest}/32"),
            "flowid".to_string(),
            classid,
        ];
        run_tc(ns, iface, &filter_args).await?;

        self.last.insert(
            link.clone(),
            AppliedState {
                metric_db,
                mcs_index,
                applied_at: Instant::now(),
            },
        );
        tracing::info!(tx = %link.tx, rx = %link.rx, iface, %dest, "shared-bridge netem applied");
        Ok(true)
    }

    /// Idempotent teardown of one destination's class and netem qdisc. The HTB
    /// root and default class are left in place since other destinations on
    /// the same interface may still depend on them.
    pub async fn remove(&self, link: &DirectionalLink, ns: &str, iface: &str, dest: IpAddr) -> Result<(), ProgrammerError> {
        let idx = self.class_index(ns, iface, dest);
        let classid = format!("1:{idx}");
        let handle = format!("{idx}:");

        let qdisc_args = vec![
            "qdisc".to_string(),
            "del".to_string(),
            "dev".to_string(),
            iface.to_string(),
            "parent".to_string(),
            classid.clone(),
            "handle".to_string(),
            handle,
        ];
        let qdisc_result = run_tc(ns, iface, &qdisc_args).await;

        let class_args = vec![
            "class".to_string(),
            "del".to_string(),
            "dev".to_string(),
            iface.to_string(),
            "classid".to_string(),
            classid,
        ];
        let class_result = run_tc(ns, iface, &class_args).await;

        self.last.remove(link);
        qdisc_result.and(class_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_index_is_stable_and_dense_per_destination() {
        let programmer = SharedBridgeProgrammer::new(ProgrammerConfig::default());
        let d1: IpAddr = "10.0.0.1".parse().unwrap();
        let d2: IpAddr = "10.0.0.2".parse().unwrap();
        let i1 = programmer.class_index("ns0", "br0", d1);
        let i2 = programmer.class_index("ns0", "br0", d2);
        let i1_again = programmer.class_index("ns0", "br0", d1);
        assert_eq!(i1, 11);
        assert_eq!(i2, 12);
        assert_eq!(i1, i1_again);
    }

    #[test]
    fn class_index_is_scoped_per_interface() {
        let programmer = SharedBridgeProgrammer::new(ProgrammerConfig::default());
        let d1: IpAddr = "10.0.0.1".parse().unwrap();
        let on_br0 = programmer.class_index("ns0", "br0", d1);
        let on_br1 = programmer.class_index("ns0", "br1", d1);
        assert_eq!(on_br0, 11);
        assert_eq!(on_br1, 11);
    }

    #[test]
    fn destination_index_never_collides_with_the_default_class() {
        let programmer = SharedBridgeProgrammer::new(ProgrammerConfig::default());
        let d1: IpAddr = "10.0.0.1".parse().unwrap();
        assert_ne!(programmer.class_index("ns0", "br0", d1), 10);
    }
}
