//! Configuration for the launcher binary.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use quay_vm::{Launcher, DEFAULT_BINARY_PREFIX, DEFAULT_GRACE_PERIOD};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for `quay-launch`.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// JSON file describing the machine.
    pub machine_path: PathBuf,

    /// Target architecture appended to the binary prefix.
    pub arch: String,

    /// Enable KVM acceleration (default: true).
    pub kvm: bool,

    /// Hypervisor binary prefix (default: `qemu-system`).
    pub binary_prefix: String,

    /// How long to watch for an immediate failure.
    pub grace_period: Duration,
}

/// Configuration validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("machine file not found: {0}")]
    MissingMachine(PathBuf),

    #[error("architecture must not be empty")]
    EmptyArch,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            machine_path: PathBuf::from("machine.json"),
            arch: "x86_64".into(),
            kvm: true,
            binary_prefix: DEFAULT_BINARY_PREFIX.into(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl LaunchConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `QUAY_MACHINE` | `machine.json` |
    /// | `QUAY_ARCH` | `x86_64` |
    /// | `QUAY_KVM` | `true` |
    /// | `QUAY_BINARY_PREFIX` | `qemu-system` |
    /// | `QUAY_GRACE_MS` | `50` |
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            machine_path: std::env::var("QUAY_MACHINE")
                .map(PathBuf::from)
                .unwrap_or(default.machine_path),
            arch: std::env::var("QUAY_ARCH").unwrap_or(default.arch),
            kvm: std::env::var("QUAY_KVM")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(default.kvm),
            binary_prefix: std::env::var("QUAY_BINARY_PREFIX").unwrap_or(default.binary_prefix),
            grace_period: std::env::var("QUAY_GRACE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.grace_period),
        }
    }

    /// Check that the machine file exists and the architecture is set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arch.is_empty() {
            return Err(ConfigError::EmptyArch);
        }

        if !self.machine_path.exists() {
            return Err(ConfigError::MissingMachine(self.machine_path.clone()));
        }

        Ok(())
    }

    /// Build the launcher described by this configuration.
    pub fn launcher(&self) -> Launcher {
        Launcher::new(self.arch.clone())
            .kvm(self.kvm)
            .binary_prefix(self.binary_prefix.clone())
            .grace_period(self.grace_period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LaunchConfig::default();
        assert_eq!(config.machine_path, PathBuf::from("machine.json"));
        assert_eq!(config.arch, "x86_64");
        assert!(config.kvm);
        assert_eq!(config.grace_period, Duration::from_millis(50));
        assert_eq!(config.launcher().binary(), "qemu-system-x86_64");
    }

    #[test]
    fn test_from_env_uses_defaults() {
        std::env::remove_var("QUAY_MACHINE");
        std::env::remove_var("QUAY_ARCH");
        std::env::remove_var("QUAY_KVM");
        std::env::remove_var("QUAY_BINARY_PREFIX");
        std::env::remove_var("QUAY_GRACE_MS");

        let config = LaunchConfig::from_env();
        let default = LaunchConfig::default();

        assert_eq!(config.machine_path, default.machine_path);
        assert_eq!(config.arch, default.arch);
        assert_eq!(config.kvm, default.kvm);
        assert_eq!(config.binary_prefix, default.binary_prefix);
        assert_eq!(config.grace_period, default.grace_period);
    }

    #[test]
    fn test_validate() {
        let mut config = LaunchConfig {
            machine_path: PathBuf::from("/nonexistent/machine.json"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingMachine(_))
        ));

        config.arch = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyArch)));
    }
}
