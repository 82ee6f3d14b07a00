use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("no scene loaded for this engine")]
    SceneNotLoaded,

    #[error("scene reload is not supported once a scene is loaded")]
    SceneReloadUnsupported,

    #[error("propagation engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("compute timed out")]
    ComputeTimeout,

    #[error("unknown modulation '{0}'")]
    UnknownModulation(String),

    #[error(transparent)]
    Model(#[from] channel_model::ModelError),
}
