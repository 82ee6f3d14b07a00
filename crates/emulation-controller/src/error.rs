use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("topology validation failed: {0:?}")]
    InvalidTopology(Vec<channel_model::ModelError>),

    #[error("runtime provisioning failed: {0}")]
    Provision(String),

    #[error("scene load failed: {0}")]
    SceneLoad(String),

    #[error("channel service request failed: {0}")]
    Service(#[from] reqwest::Error),

    #[error("netem programming failed: {0}")]
    Program(#[from] netem_programmer::ProgrammerError),

    #[error("unknown deployment: {0}")]
    UnknownDeployment(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
