use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgrammerError {
    #[error("failed to spawn tc: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("tc exited with failure on ns {ns} iface {iface}: {stderr}")]
    TcFailed {
        ns: String,
        iface: String,
        stderr: String,
    },
}
