//! Actuates computed channel state as Linux `tc`/`netem` disciplines inside
//! container network namespaces, following the shell-out idiom used for
//! cellular-profile actuation in the teacher's testbench.

mod bridge;
mod config;
mod error;
mod p2p;
mod shell;

pub use bridge::SharedBridgeProgrammer;
pub use config::ProgrammerConfig;
pub use error::ProgrammerError;
pub use p2p::PointToPointProgrammer;
pub use shell::{netem_args, run_tc};
