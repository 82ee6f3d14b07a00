//! Metrics exporters for different output formats.

use crate::error::Result;
use crate::metrics::MetricsSnapshot;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait MetricsExporter {
    async fn export(&self, snapshot: &MetricsSnapshot) -> Result<String>;

    async fn export_to_file(&self, snapshot: &MetricsSnapshot, path: &Path) -> Result<()> {
        let rendered = self.export(snapshot).await?;
        let mut file = File::create(path).await?;
        file.write_all(rendered.as_bytes()).await?;
        Ok(())
    }
}

pub struct PrometheusExporter {
    namespace: String,
}

impl PrometheusExporter {
    pub fn new() -> Self {
        Self {
            namespace: "channel_emu".to_string(),
        }
    }

    pub fn with_namespace(namespace: String) -> Self {
        Self { namespace }
    }

    fn line(&self, name: &str, value: f64, labels: &[(&str, &str)], help: &str) -> String {
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = labels.iter().map(|(k, v)| format!("{k}=\"{v}\"")).collect();
            format!("{{{}}}", parts.join(","))
        };
        format!(
            "# HELP {ns}{name} {help}\n# TYPE {ns}{name} gauge\n{ns}{name}{label_str} {value}\n",
            ns = self.namespace
        )
    }
}

impl Default for PrometheusExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsExporter for PrometheusExporter {
    async fn export(&self, snapshot: &MetricsSnapshot) -> Result<String> {
        let mut output = String::new();
        let dep = &snapshot.deployment_metrics;
        output.push_str(&self.line(
            "_active_links",
            dep.active_links as f64,
            &[],
            "Number of active directional links",
        ));
        output.push_str(&self.line(
            "_degraded_links",
            dep.degraded_links as f64,
            &[],
            "Number of links running on safe-default netem",
        ));
        for link in &snapshot.link_performance {
            let labels = [("link_id", link.channel_stats.link_id.as_str())];
            output.push_str(&self.line("_snr_db", link.channel_stats.snr_db, &labels, "Link SNR"));
            output.push_str(&self.line("_per", link.channel_stats.per, &labels, "Packet error rate"));
            output.push_str(&self.line(
                "_rate_mbps",
                link.channel_stats.rate_mbps,
                &labels,
                "Effective channel rate",
            ));
        }
        Ok(output)
    }
}

pub struct JsonExporter;

#[async_trait]
impl MetricsExporter for JsonExporter {
    async fn export(&self, snapshot: &MetricsSnapshot) -> Result<String> {
        Ok(serde_json::to_string_pretty(snapshot)?)
    }
}

pub struct CsvExporter;

#[async_trait]
impl MetricsExporter for CsvExporter {
    async fn export(&self, snapshot: &MetricsSnapshot) -> Result<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record([
            "link_id",
            "snr_db",
            "sinr_db",
            "per",
            "mcs_index",
            "rate_mbps",
            "degraded",
        ])?;
        for link in &snapshot.link_performance {
            let stats = &link.channel_stats;
            writer.write_record(&[
                stats.link_id.clone(),
                stats.snr_db.to_string(),
                stats.sinr_db.map(|v| v.to_string()).unwrap_or_default(),
                stats.per.to_string(),
                stats.mcs_index.map(|v| v.to_string()).unwrap_or_default(),
                stats.rate_mbps.to_string(),
                stats.degraded.to_string(),
            ])?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCollector;
    use uuid::Uuid;

    #[tokio::test]
    async fn prometheus_export_includes_namespace() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        collector.link("a->b");
        let snapshot = collector.take_snapshot();
        let exporter = PrometheusExporter::new();
        let rendered = exporter.export(&snapshot).await.unwrap();
        assert!(rendered.contains("channel_emu_active_links"));
    }

    #[tokio::test]
    async fn json_export_round_trips_link_count() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        collector.link("a->b");
        let snapshot = collector.take_snapshot();
        let rendered = JsonExporter.export(&snapshot).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["deployment_metrics"]["active_links"], 1);
    }

    #[tokio::test]
    async fn csv_export_has_header_and_one_row_per_link() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        collector.link("a->b");
        collector.link("b->a");
        let snapshot = collector.take_snapshot();
        let rendered = CsvExporter.export(&snapshot).await.unwrap();
        assert_eq!(rendered.lines().count(), 3);
    }

    #[tokio::test]
    async fn export_to_file_writes_rendered_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let collector = MetricsCollector::new(Uuid::new_v4());
        let snapshot = collector.take_snapshot();
        JsonExporter.export_to_file(&snapshot, &path).await.unwrap();
        assert!(path.exists());
    }
}
