//! Metrics collection and export for the channel emulator: per-link SNR/PER/MCS
//! stats plus applied-netem stats, exportable as Prometheus text, JSON or CSV.

pub mod error;
pub mod exporter;
pub mod metrics;

pub use error::{ObservabilityError, Result};
pub use exporter::{CsvExporter, JsonExporter, MetricsExporter, PrometheusExporter};
pub use metrics::{
    AppliedNetemStats, DeploymentMetrics, LinkChannelStats, LinkMetricsCollector, LinkPerformance,
    MetricsCollector, MetricsSnapshot,
};
