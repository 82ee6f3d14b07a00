#[derive(Debug, Clone, Copy)]
pub struct ProgrammerConfig {
    pub min_interval_ms: u64,
    pub metric_hysteresis_db: f64,
}

impl Default for ProgrammerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 100,
            metric_hysteresis_db: 2.0,
        }
    }
}

impl ProgrammerConfig {
    /// Whether to skip an apply given the elapsed time and metric delta since
    /// the last one. An MCS index change always bypasses suppression; absent
    /// that, skip if the wall-time delta is under the rate limit *or* the
    /// metric moved by less than the hysteresis band.
    pub fn should_suppress(&self, elapsed_ms: u64, metric_delta: f64, mcs_changed: bool) -> bool {
        if mcs_changed {
            return false;
        }
        elapsed_ms < self.min_interval_ms || metric_delta < self.metric_hysteresis_db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcs_change_never_suppresses() {
        let config = ProgrammerConfig::default();
        assert!(!config.should_suppress(0, 0.0, true));
    }

    #[test]
    fn rate_limit_alone_suppresses() {
        let config = ProgrammerConfig::default();
        assert!(config.should_suppress(10, 100.0, false));
    }

    #[test]
    fn hysteresis_alone_suppresses_even_after_min_interval() {
        let config = ProgrammerConfig::default();
        assert!(config.should_suppress(1_000, 0.1, false));
    }

    #[test]
    fn large_metric_change_after_min_interval_applies() {
        let config = ProgrammerConfig::default();
        assert!(!config.should_suppress(1_000, 100.0, false));
    }
}
