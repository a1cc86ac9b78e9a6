//! Handle to a launched QEMU process.

use crate::error::{Result, VmError};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// A QEMU process that survived the launch grace period.
///
/// The process runs in its own session and is not killed when this handle
/// is dropped. Reaping is done by the runtime task started at launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QemuProcess {
    pid: u32,
    binary: String,
    arch: String,
}

impl QemuProcess {
    pub(crate) fn new(pid: u32, binary: String, arch: String) -> Self {
        Self { pid, binary, arch }
    }

    /// Process id of the hypervisor.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Binary that was executed, e.g. `qemu-system-x86_64`.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Send `signal` to the process.
    ///
    /// # Errors
    /// Returns [`VmError::Signal`] if the signal could not be delivered,
    /// typically because the process is gone.
    pub fn signal(&self, signal: Signal) -> Result<()> {
        tracing::debug!(pid = self.pid, ?signal, "Signaling QEMU process");
        kill(self.nix_pid(), signal).map_err(|source| VmError::Signal {
            pid: self.pid,
            source,
        })
    }

    /// Ask QEMU to shut down (SIGTERM).
    pub fn terminate(&self) -> Result<()> {
        self.signal(Signal::SIGTERM)
    }

    /// Force kill the process (SIGKILL).
    pub fn kill(&self) -> Result<()> {
        tracing::warn!(pid = self.pid, binary = %self.binary, "Force killing QEMU process");
        self.signal(Signal::SIGKILL)
    }

    /// Whether the process still exists.
    ///
    /// A zombie that has not been reaped yet still counts as alive.
    pub fn is_alive(&self) -> bool {
        kill(self.nix_pid(), None).is_ok()
    }

    fn nix_pid(&self) -> Pid {
        Pid::from_raw(self.pid as i32)
    }
}

impl std::fmt::Display for QemuProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (pid {})", self.binary, self.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let process = QemuProcess::new(4242, "qemu-system-x86_64".into(), "x86_64".into());
        assert_eq!(process.to_string(), "qemu-system-x86_64 (pid 4242)");
        assert_eq!(process.arch(), "x86_64");
    }

    #[test]
    fn test_current_process_is_alive() {
        let process = QemuProcess::new(std::process::id(), "self".into(), "x86_64".into());
        assert!(process.is_alive());
    }
}
