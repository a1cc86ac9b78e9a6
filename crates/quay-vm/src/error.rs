//! Error types for quay-vm.

use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for quay-vm operations.
pub type Result<T> = std::result::Result<T, VmError>;

/// Errors that can occur while launching or controlling a QEMU process.
#[derive(Debug, Error)]
pub enum VmError {
    /// The hypervisor process could not be created
    #[error("failed to spawn '{binary}': {source}")]
    Spawn {
        /// Binary that was executed, e.g. `qemu-system-x86_64`
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The process started but exited abnormally within the grace period
    #[error("'{binary}': {source}")]
    EarlyExit {
        /// Binary that was executed, e.g. `qemu-system-x86_64`
        binary: String,
        #[source]
        source: ExitError,
    },

    /// Delivering a signal to the process failed
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        /// Target process id
        pid: u32,
        #[source]
        source: nix::Error,
    },

    /// Machine description rejected by [`Machine::validate`](crate::Machine::validate)
    #[error("configuration error: {0}")]
    Config(String),
}

/// Why a launched process was considered failed.
#[derive(Debug, Error)]
pub enum ExitError {
    /// Non-zero exit code or termination by signal
    #[error("{0}")]
    Status(ExitStatus),

    /// Waiting on the child failed
    #[error("wait failed: {0}")]
    Wait(#[source] std::io::Error),
}
