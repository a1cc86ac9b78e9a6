//! # quay-vm
//!
//! QEMU virtual machine descriptions and a detached launcher.
//!
//! ## Quick Start
//!
//! ```no_run
//! use quay_vm::{Image, Machine, NetDev};
//!
//! # async fn example() -> quay_vm::Result<()> {
//! let mut machine = Machine::new(2, 1024);
//! machine.attach_drive_from_image(&Image::new("/var/lib/quay/debian.qcow2", "qcow2"));
//! machine.attach_network_interface(NetDev::tap("net0", "tap0"));
//! machine.attach_display("127.0.0.1", 5900);
//! machine.attach_control_socket("/run/quay/debian.qmp");
//!
//! // Runs `qemu-system-x86_64 -smp 2 -m 1024 -enable-kvm ...` in its own session
//! let process = machine.start("x86_64", true).await?;
//!
//! // Later
//! process.terminate()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Machine Description**: CPU, memory, CD-ROM, drives, network, VNC and QMP
//! - **Deterministic Rendering**: the same machine always yields the same command line
//! - **Detached Launch**: QEMU runs in a new session and outlives the caller
//! - **Early Failure Detection**: processes dying within the grace period are reported

mod config;
mod error;
mod launcher;
mod machine;
mod process;

pub use config::{Drive, Image, NetDev};
pub use error::{ExitError, Result, VmError};
pub use launcher::{Launcher, DEFAULT_BINARY_PREFIX, DEFAULT_GRACE_PERIOD};
pub use machine::Machine;
pub use nix::sys::signal::Signal;
pub use process::QemuProcess;
