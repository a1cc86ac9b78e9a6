//! Machine descriptor - the in-memory shape of a virtual machine.

use crate::config::{Drive, Image, NetDev};
use crate::error::{Result, VmError};
use crate::launcher::Launcher;
use crate::process::QemuProcess;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A QEMU virtual machine description.
///
/// Sizing is fixed at construction; devices are attached incrementally and
/// never removed. Nothing here touches the filesystem: paths and addresses
/// are only recorded for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    cores: u32,
    memory_mb: u64,
    #[serde(default)]
    cdrom: Option<PathBuf>,
    #[serde(default)]
    drives: Vec<Drive>,
    #[serde(default)]
    network_interfaces: Vec<NetDev>,
    #[serde(default)]
    display: Option<String>,
    #[serde(default)]
    control_socket: Option<PathBuf>,
}

impl Machine {
    /// Create a machine with `cores` vCPUs and `memory_mb` megabytes of RAM.
    ///
    /// Values are taken as given; see [`Machine::validate`].
    pub fn new(cores: u32, memory_mb: u64) -> Self {
        Self {
            cores,
            memory_mb,
            cdrom: None,
            drives: Vec::new(),
            network_interfaces: Vec::new(),
            display: None,
            control_socket: None,
        }
    }

    /// Attach a disk image as the CD-ROM, replacing any previous one.
    pub fn attach_cdrom(&mut self, path: impl Into<PathBuf>) {
        self.cdrom = Some(path.into());
    }

    /// Append a hard drive.
    pub fn attach_drive(&mut self, drive: Drive) {
        self.drives.push(drive);
    }

    /// Append a hard drive backed by `image`.
    pub fn attach_drive_from_image(&mut self, image: &Image) {
        self.drives.push(Drive::from(image));
    }

    /// Append a network interface.
    pub fn attach_network_interface(&mut self, netdev: NetDev) {
        self.network_interfaces.push(netdev);
    }

    /// Expose a VNC server on `address:port`, replacing any previous one.
    pub fn attach_display(&mut self, address: &str, port: u16) {
        self.display = Some(format!("{address}:{port}"));
    }

    /// Redirect the QMP monitor to a unix socket, replacing any previous one.
    pub fn attach_control_socket(&mut self, path: impl Into<PathBuf>) {
        self.control_socket = Some(path.into());
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    pub fn memory_mb(&self) -> u64 {
        self.memory_mb
    }

    pub fn cdrom(&self) -> Option<&Path> {
        self.cdrom.as_deref()
    }

    pub fn drives(&self) -> &[Drive] {
        &self.drives
    }

    pub fn network_interfaces(&self) -> &[NetDev] {
        &self.network_interfaces
    }

    /// Display endpoint as `address:port`.
    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn control_socket(&self) -> Option<&Path> {
        self.control_socket.as_deref()
    }

    /// Check the description for values QEMU would reject.
    ///
    /// [`Launcher::launch`] does not call this; invalid machines are passed
    /// through to the hypervisor as-is.
    ///
    /// # Errors
    /// Returns [`VmError::Config`] for zero cores, zero memory or duplicate
    /// network interface ids.
    pub fn validate(&self) -> Result<()> {
        if self.cores == 0 {
            return Err(VmError::Config("cores must be > 0".into()));
        }

        if self.memory_mb == 0 {
            return Err(VmError::Config("memory_mb must be > 0".into()));
        }

        let mut ids = HashSet::new();
        for netdev in &self.network_interfaces {
            if !ids.insert(netdev.id.as_str()) {
                return Err(VmError::Config(format!(
                    "duplicate network interface id: {}",
                    netdev.id
                )));
            }
        }

        Ok(())
    }

    /// Launch this machine with `qemu-system-<arch>`.
    ///
    /// Shorthand for `Launcher::new(arch).kvm(kvm).launch(self)`.
    ///
    /// # Errors
    /// See [`Launcher::launch`].
    pub async fn start(&self, arch: &str, kvm: bool) -> Result<QemuProcess> {
        Launcher::new(arch).kvm(kvm).launch(self).await
    }
}
