use thiserror::Error;

/// Configuration errors surfaced by topology resolution, before any side effect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("interface '{0}' must set exactly one of antenna_pattern or antenna_gain_dbi")]
    AntennaMutualExclusion(String),

    #[error("unknown antenna pattern '{0}'")]
    UnknownAntennaPattern(String),

    #[error("interface '{0}' has both csma and tdma configured; they are mutually exclusive")]
    MacMutualExclusion(String),

    #[error("node '{0}' referenced by a link does not exist")]
    UnknownNode(String),

    #[error("interface '{iface}' on node '{node}' does not exist")]
    UnknownInterface { node: String, iface: String },

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
