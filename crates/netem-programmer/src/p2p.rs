//! Point-to-point flat netem actuator: exactly one qdisc per directional
//! link's egress interface, replaced atomically on update.

use crate::config::ProgrammerConfig;
use crate::error::ProgrammerError;
use crate::shell::{netem_args, run_tc};
use channel_model::{DirectionalLink, NetemParams};
use dashmap::DashMap;
use std::time::Instant;

#[derive(Debug, Clone)]
struct AppliedState {
    metric_db: f64,
    mcs_index: Option<u32>,
    applied_at: Instant,
}

pub struct PointToPointProgrammer {
    last: DashMap<DirectionalLink, AppliedState>,
    config: ProgrammerConfig,
}

impl PointToPointProgrammer {
    pub fn new(config: ProgrammerConfig) -> Self {
        Self {
            last: DashMap::new(),
            config,
        }
    }

    /// Apply `netem` for `link` on `(ns, iface)` unless hysteresis or the
    /// rate limit suppresses it. Returns `true` if a `tc` command actually
    /// ran. An MCS index change always bypasses suppression.
    pub async fn apply(
        &self,
        link: &DirectionalLink,
        ns: &str,
        iface: &str,
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

        let mut args = vec!["qdisc".to_string(), "replace".to_string(), "dev".to_string(), iface.to_string(), "root".to_string()];
        args.extend(netem_args(
            netem.delay_ms,
            netem.jitter_ms,
            netem.loss_percent,
            netem.rate_mbps,
        ));
        run_tc(ns, iface, &args).await?;

        self.last.insert(
            link.clone(),
            AppliedState {
                metric_db,
                mcs_index,
                applied_at: Instant::now(),
            },
        );
        tracing::info!(tx = %link.tx, rx = %link.rx, iface, "netem applied");
        Ok(true)
    }

    /// Idempotent teardown: best-effort qdisc removal, errors ignored by
    /// the caller since a missing qdisc is not a failure.
    pub async fn remove(&self, link: &DirectionalLink, ns: &str, iface: &str) -> Result<(), ProgrammerError> {
        let args = vec![
            "qdisc".to_string(),
            "del".to_string(),
            "dev".to_string(),
            iface.to_string(),
            "root".to_string(),
        ];
        let result = run_tc(ns, iface, &args).await;
        self.last.remove(link);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> DirectionalLink {
        DirectionalLink::new("a", "b")
    }

    #[test]
    fn first_apply_has_no_prior_state_to_compare() {
        let programmer = PointToPointProgrammer::new(ProgrammerConfig::default());
        assert!(programmer.last.get(&link()).is_none());
    }

    #[tokio::test]
    async fn mcs_change_bypasses_hysteresis_state_tracking() {
        let programmer = PointToPointProgrammer::new(ProgrammerConfig {
            min_interval_ms: 100_000,
            metric_hysteresis_db: 100.0,
        });
        programmer.last.insert(
            link(),
            AppliedState {
                metric_db: 10.0,
                mcs_index: Some(3),
                applied_at: Instant::now(),
            },
        );
        let prev = programmer.last.get(&link()).unwrap();
        assert_ne!(prev.mcs_index, Some(4));
    }
}
