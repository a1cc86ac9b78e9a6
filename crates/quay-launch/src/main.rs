//! quay-launch entry point.
//!
//! Reads a machine description (JSON) and starts it under QEMU. The VM runs
//! in its own session, so this process exits as soon as the launch is
//! confirmed and leaves the VM running.
//!
//! ```text
//! QUAY_MACHINE=debian.json QUAY_ARCH=x86_64 quay-launch
//! ```

mod config;

use anyhow::Context;
use config::LaunchConfig;
use quay_vm::Machine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the pid
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("quay_launch=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = LaunchConfig::from_env();
    tracing::info!(?config, "Configuration loaded");
    config.validate()?;

    let machine = load_machine(&config)?;
    machine.validate()?;

    let launcher = config.launcher();
    tracing::info!(
        binary = %launcher.binary(),
        cores = machine.cores(),
        memory_mb = machine.memory_mb(),
        drives = machine.drives().len(),
        interfaces = machine.network_interfaces().len(),
        "Launching machine"
    );

    let process = match launcher.launch(&machine).await {
        Ok(process) => process,
        Err(e) => {
            tracing::error!(error = %e, "Launch failed");
            return Err(e.into());
        }
    };

    tracing::info!(pid = process.pid(), "Machine running");
    println!("{}", process.pid());
    Ok(())
}

fn load_machine(config: &LaunchConfig) -> anyhow::Result<Machine> {
    let raw = std::fs::read_to_string(&config.machine_path)
        .with_context(|| format!("reading {}", config.machine_path.display()))?;
    let machine = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", config.machine_path.display()))?;
    Ok(machine)
}
