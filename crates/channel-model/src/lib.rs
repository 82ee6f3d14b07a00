//! Core data model for the wireless channel emulator.
//!
//! This crate has no I/O and no async: it is the shared vocabulary between the
//! channel compute pipeline, the netem programmer and the emulation controller.

pub mod error;
pub mod link;
pub mod mac;
pub mod position;
pub mod radio;
pub mod topology;

pub use error::ModelError;
pub use link::{
    DirectionalLink, EngineKind, InterferenceTerm, LinkState, NetemParams, NodeId, Regime,
    TransmissionState,
};
pub use mac::{CsmaConfig, MacConfig, TdmaConfig, TdmaMode};
pub use position::Position;
pub use radio::{AntennaConfig, RadioParams};
pub use topology::{InterfaceDecl, LinkDecl, LinkMode, NodeDecl, SceneDecl, SharedBridgeConfig, Topology};
