use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub enable_cors: bool,
    /// When set, `geometric` compute requests are rejected with `400` and
    /// `auto` always resolves to the analytic engine.
    pub force_analytic: bool,
    pub indoor_loss_db: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8070,
            enable_cors: true,
            force_analytic: false,
            indoor_loss_db: 10.0,
        }
    }
}
