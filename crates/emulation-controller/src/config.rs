use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Base URL of the Channel Service this controller drives.
    pub service_base_url: String,
    /// Deadline for a single compute call before the link is marked degraded.
    pub compute_timeout: Duration,
    /// Mobility poll interval for transmission-state auto-detection.
    pub mobility_poll_interval: Duration,
    /// Capacity of the bounded mpsc channels connecting pipeline stages.
    pub channel_capacity: usize,
    /// TX-rate threshold (kbps) crossed to flip auto-detected transmission state.
    pub tx_rate_threshold_kbps: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            service_base_url: "http://127.0.0.1:8070".to_string(),
            compute_timeout: Duration::from_secs(3),
            mobility_poll_interval: Duration::from_millis(100),
            channel_capacity: 256,
            tx_rate_threshold_kbps: 100.0,
        }
    }
}
