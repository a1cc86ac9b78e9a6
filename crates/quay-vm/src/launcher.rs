//! Command line rendering and process launch for QEMU machines.

use crate::error::{ExitError, Result, VmError};
use crate::machine::Machine;
use crate::process::QemuProcess;
use nix::unistd::setsid;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::oneshot;

/// Default prefix of the hypervisor binary; the architecture is appended.
pub const DEFAULT_BINARY_PREFIX: &str = "qemu-system";

/// How long [`Launcher::launch`] waits for an immediate failure.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(50);

/// Guest NIC model bound to every network backend.
const NET_DEVICE_MODEL: &str = "virtio-net";

/// Renders a [`Machine`] into a QEMU invocation and starts it.
///
/// # Example
///
/// ```no_run
/// use quay_vm::{Drive, Launcher, Machine, NetDev};
///
/// # async fn example() -> quay_vm::Result<()> {
/// let mut machine = Machine::new(2, 1024);
/// machine.attach_drive(Drive::new("/var/lib/quay/debian.qcow2", "qcow2"));
/// machine.attach_network_interface(NetDev::user("net0"));
///
/// let process = Launcher::new("x86_64").kvm(true).launch(&machine).await?;
/// println!("QEMU running as pid {}", process.pid());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Launcher {
    arch: String,
    kvm: bool,
    binary_prefix: String,
    grace_period: Duration,
}

impl Launcher {
    /// Create a launcher for `qemu-system-<arch>`.
    pub fn new(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            kvm: false,
            binary_prefix: DEFAULT_BINARY_PREFIX.to_string(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Enable KVM hardware acceleration.
    pub fn kvm(mut self, enabled: bool) -> Self {
        self.kvm = enabled;
        self
    }

    /// Override the binary prefix (default `qemu-system`).
    ///
    /// May be an absolute path prefix such as `/opt/qemu/bin/qemu-system`.
    pub fn binary_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.binary_prefix = prefix.into();
        self
    }

    /// Override the grace period used to detect immediate failures.
    pub fn grace_period(mut self, period: Duration) -> Self {
        self.grace_period = period;
        self
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Name of the binary that will be executed.
    pub fn binary(&self) -> String {
        format!("{}-{}", self.binary_prefix, self.arch)
    }

    /// Render the argument list for `machine`.
    ///
    /// Output order is fixed: sizing, acceleration, CD-ROM, drives, network,
    /// display, control socket.
    pub fn render(&self, machine: &Machine) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-smp".into(),
            machine.cores().to_string().into(),
            "-m".into(),
            machine.memory_mb().to_string().into(),
        ];

        if self.kvm {
            args.push("-enable-kvm".into());
        }

        // Paths are pushed as raw OS strings; they need not be UTF-8.
        if let Some(cdrom) = machine.cdrom().filter(|p| !p.as_os_str().is_empty()) {
            args.push("-cdrom".into());
            args.push(cdrom.as_os_str().to_owned());
        }

        for drive in machine.drives() {
            let mut value = OsString::from("file=");
            value.push(drive.path.as_os_str());
            value.push(format!(",format={}", drive.format));
            args.push("-drive".into());
            args.push(value);
        }

        if machine.network_interfaces().is_empty() {
            args.push("-net".into());
            args.push("none".into());
        }

        for netdev in machine.network_interfaces() {
            let mut backend = format!("{},id={}", netdev.kind, netdev.id);
            if let Some(if_name) = non_empty(&netdev.if_name) {
                backend.push_str(&format!(",ifname={if_name}"));
            }
            args.push("-netdev".into());
            args.push(backend.into());

            let mut device = format!("{NET_DEVICE_MODEL},netdev={}", netdev.id);
            if let Some(mac) = non_empty(&netdev.mac) {
                device.push_str(&format!(",mac={mac}"));
            }
            args.push("-device".into());
            args.push(device.into());
        }

        if let Some(display) = machine.display().filter(|d| !d.is_empty()) {
            args.push("-vnc".into());
            args.push(display.into());
        }

        if let Some(socket) = machine
            .control_socket()
            .filter(|p| !p.as_os_str().is_empty())
        {
            let mut value = OsString::from("unix:");
            value.push(socket.as_os_str());
            value.push(",server,nowait");
            args.push("-qmp".into());
            args.push(value);
        }

        args
    }

    /// Start `machine` as a detached QEMU process.
    ///
    /// The child runs in its own session so it survives the caller's
    /// terminal. After spawning, this waits for the grace period and reports
    /// the process as failed if it already exited abnormally. Crashes after
    /// the grace period are not observed.
    ///
    /// # Errors
    /// - [`VmError::Spawn`] if the binary could not be executed.
    /// - [`VmError::EarlyExit`] if the process exited with a failure status
    ///   within the grace period.
    pub async fn launch(&self, machine: &Machine) -> Result<QemuProcess> {
        let binary = self.binary();
        let args = self.render(machine);
        tracing::debug!(binary = %binary, ?args, "Launching QEMU");

        let mut command = Command::new(&binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            command.pre_exec(|| {
                setsid()?;
                Ok(())
            });
        }

        let mut child = command.spawn().map_err(|source| VmError::Spawn {
            binary: binary.clone(),
            source,
        })?;

        let (tx, mut rx) = oneshot::channel::<ExitError>();

        // Reaps the child; only a failed exit is reported.
        let pid = child.id();
        tokio::spawn(async move {
            let failure = match child.wait().await {
                Ok(status) if status.success() => return,
                Ok(status) => ExitError::Status(status),
                Err(e) => ExitError::Wait(e),
            };
            let _ = tx.send(failure);
        });

        tokio::time::sleep(self.grace_period).await;

        if let Ok(source) = rx.try_recv() {
            return Err(VmError::EarlyExit { binary, source });
        }

        let pid = match pid {
            Some(pid) => pid,
            None => {
                return Err(VmError::EarlyExit {
                    binary,
                    source: ExitError::Wait(std::io::Error::other(
                        "process exited before its pid was read",
                    )),
                })
            }
        };

        tracing::info!(pid, binary = %binary, "QEMU process started");
        Ok(QemuProcess::new(pid, binary, self.arch.clone()))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
