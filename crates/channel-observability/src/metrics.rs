//! Per-directional-link channel metrics, collected from both the compute
//! pipeline (SNR/SINR/MCS) and the netem programmer (applied parameters).

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Most recent compute result for one directional link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkChannelStats {
    pub link_id: String,
    pub snr_db: f64,
    pub sinr_db: Option<f64>,
    pub ber: f64,
    pub per: f64,
    pub mcs_index: Option<u32>,
    pub rate_mbps: f64,
    pub engine_used: String,
    pub regime: String,
    pub degraded: bool,
    pub last_updated: DateTime<Utc>,
}

impl LinkChannelStats {
    pub fn new(link_id: String) -> Self {
        Self {
            link_id,
            snr_db: 0.0,
            sinr_db: None,
            ber: 0.0,
            per: 0.0,
            mcs_index: None,
            rate_mbps: 0.0,
            engine_used: "unknown".to_string(),
            regime: "unknown".to_string(),
            degraded: false,
            last_updated: Utc::now(),
        }
    }
}

/// Most recently applied netem parameters for one directional link, as
/// reported back by the programmer after actuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedNetemStats {
    pub delay_ms: f64,
    pub jitter_ms: f64,
    pub loss_percent: f64,
    pub rate_mbps: f64,
    pub last_changed: DateTime<Utc>,
}

impl AppliedNetemStats {
    pub fn new() -> Self {
        Self {
            delay_ms: 0.0,
            jitter_ms: 0.0,
            loss_percent: 0.0,
            rate_mbps: 0.0,
            last_changed: Utc::now(),
        }
    }
}

impl Default for AppliedNetemStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Combined channel + programmer view of one link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkPerformance {
    pub channel_stats: LinkChannelStats,
    pub applied_netem: AppliedNetemStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentMetrics {
    pub deployment_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub active_links: usize,
    pub degraded_links: usize,
    pub total_computes: u64,
    pub total_programs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub deployment_metrics: DeploymentMetrics,
    pub link_performance: Vec<LinkPerformance>,
}

/// Per-link collector: a read-mostly lock around the latest stats plus
/// atomic counters for the things that get bumped on every request.
pub struct LinkMetricsCollector {
    channel_stats: Arc<parking_lot::RwLock<LinkChannelStats>>,
    applied_netem: Arc<parking_lot::RwLock<AppliedNetemStats>>,
    compute_count: AtomicU64,
    program_count: AtomicU64,
}

impl LinkMetricsCollector {
    pub fn new(link_id: String) -> Self {
        Self {
            channel_stats: Arc::new(parking_lot::RwLock::new(LinkChannelStats::new(link_id))),
            applied_netem: Arc::new(parking_lot::RwLock::new(AppliedNetemStats::new())),
            compute_count: AtomicU64::new(0),
            program_count: AtomicU64::new(0),
        }
    }

    pub fn record_compute(&self, stats: LinkChannelStats) {
        metrics::gauge!("channel_snr_db", "link_id" => stats.link_id.clone()).set(stats.snr_db);
        metrics::gauge!("channel_per", "link_id" => stats.link_id.clone()).set(stats.per);
        metrics::gauge!("channel_rate_mbps", "link_id" => stats.link_id.clone()).set(stats.rate_mbps);
        *self.channel_stats.write() = stats;
        self.compute_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_program(&self, applied: AppliedNetemStats) {
        *self.applied_netem.write() = applied;
        self.program_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn performance(&self) -> LinkPerformance {
        LinkPerformance {
            channel_stats: self.channel_stats.read().clone(),
            applied_netem: self.applied_netem.read().clone(),
        }
    }

    pub fn compute_count(&self) -> u64 {
        self.compute_count.load(Ordering::Relaxed)
    }

    pub fn program_count(&self) -> u64 {
        self.program_count.load(Ordering::Relaxed)
    }
}

/// Process-wide metrics collector, one entry per directional link (keyed by
/// `"tx->rx"`).
pub struct MetricsCollector {
    deployment_id: Uuid,
    start_time: DateTime<Utc>,
    links: DashMap<String, Arc<LinkMetricsCollector>>,
}

impl MetricsCollector {
    pub fn new(deployment_id: Uuid) -> Self {
        Self {
            deployment_id,
            start_time: Utc::now(),
            links: DashMap::new(),
        }
    }

    pub fn link(&self, link_id: &str) -> Arc<LinkMetricsCollector> {
        self.links
            .entry(link_id.to_string())
            .or_insert_with(|| Arc::new(LinkMetricsCollector::new(link_id.to_string())))
            .clone()
    }

    pub fn remove_link(&self, link_id: &str) {
        self.links.remove(link_id);
    }

    pub fn take_snapshot(&self) -> MetricsSnapshot {
        let link_performance: Vec<LinkPerformance> =
            self.links.iter().map(|entry| entry.value().performance()).collect();
        let degraded_links = link_performance
            .iter()
            .filter(|p| p.channel_stats.degraded)
            .count();
        let total_computes = self.links.iter().map(|e| e.value().compute_count()).sum();
        let total_programs = self.links.iter().map(|e| e.value().program_count()).sum();

        MetricsSnapshot {
            timestamp: Utc::now(),
            deployment_metrics: DeploymentMetrics {
                deployment_id: self.deployment_id,
                start_time: self.start_time,
                active_links: link_performance.len(),
                degraded_links,
                total_computes,
                total_programs,
            },
            link_performance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_link_starts_with_zero_counters() {
        let collector = LinkMetricsCollector::new("a->b".to_string());
        assert_eq!(collector.compute_count(), 0);
        assert_eq!(collector.program_count(), 0);
    }

    #[test]
    fn recording_a_compute_bumps_its_counter() {
        let collector = LinkMetricsCollector::new("a->b".to_string());
        let mut stats = LinkChannelStats::new("a->b".to_string());
        stats.snr_db = 18.0;
        collector.record_compute(stats);
        assert_eq!(collector.compute_count(), 1);
        assert_eq!(collector.performance().channel_stats.snr_db, 18.0);
    }

    #[test]
    fn snapshot_counts_degraded_links() {
        let metrics = MetricsCollector::new(Uuid::new_v4());
        let link = metrics.link("a->b");
        let mut stats = LinkChannelStats::new("a->b".to_string());
        stats.degraded = true;
        link.record_compute(stats);

        let snapshot = metrics.take_snapshot();
        assert_eq!(snapshot.deployment_metrics.active_links, 1);
        assert_eq!(snapshot.deployment_metrics.degraded_links, 1);
    }

    #[test]
    fn removed_link_drops_out_of_snapshot() {
        let metrics = MetricsCollector::new(Uuid::new_v4());
        metrics.link("a->b");
        metrics.remove_link("a->b");
        let snapshot = metrics.take_snapshot();
        assert_eq!(snapshot.deployment_metrics.active_links, 0);
    }
}
