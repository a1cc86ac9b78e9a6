//! Device configuration types attached to a [`Machine`](crate::Machine).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A hard drive backed by an image file on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    /// Path to the image file
    pub path: PathBuf,
    /// QEMU image format, e.g. `qcow2` or `raw`
    pub format: String,
}

impl Drive {
    /// Create a drive from an image path and format.
    pub fn new(path: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: format.into(),
        }
    }
}

/// A disk image as described by an image provider.
///
/// Only the location and format are consumed here; creating or inspecting
/// images is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Path to the image file
    pub path: PathBuf,
    /// QEMU image format
    pub format: String,
}

impl Image {
    /// Describe an existing image.
    pub fn new(path: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: format.into(),
        }
    }
}

impl From<&Image> for Drive {
    fn from(image: &Image) -> Self {
        Drive::new(image.path.clone(), image.format.clone())
    }
}

/// A network interface: a host-side backend plus the guest NIC bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDev {
    /// Backend type (`user`, `tap`, `bridge`, ...)
    pub kind: String,
    /// Backend id, referenced by the guest device
    pub id: String,
    /// Host interface name (tap devices)
    #[serde(default)]
    pub if_name: Option<String>,
    /// Guest MAC address
    #[serde(default)]
    pub mac: Option<String>,
}

impl NetDev {
    /// Create a backend of the given kind.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            if_name: None,
            mac: None,
        }
    }

    /// User-mode (SLIRP) networking.
    pub fn user(id: impl Into<String>) -> Self {
        Self::new("user", id)
    }

    /// TAP networking bound to an existing host interface.
    pub fn tap(id: impl Into<String>, if_name: impl Into<String>) -> Self {
        Self::new("tap", id).with_if_name(if_name)
    }

    /// Set the host interface name.
    pub fn with_if_name(mut self, if_name: impl Into<String>) -> Self {
        self.if_name = Some(if_name.into());
        self
    }

    /// Set the guest MAC address.
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_from_image() {
        let image = Image::new("/var/lib/quay/debian.qcow2", "qcow2");
        let drive = Drive::from(&image);
        assert_eq!(drive.path, PathBuf::from("/var/lib/quay/debian.qcow2"));
        assert_eq!(drive.format, "qcow2");
    }

    #[test]
    fn test_netdev_tap() {
        let netdev = NetDev::tap("net0", "tap0").with_mac("52:54:00:12:34:56");
        assert_eq!(netdev.kind, "tap");
        assert_eq!(netdev.id, "net0");
        assert_eq!(netdev.if_name.as_deref(), Some("tap0"));
        assert_eq!(netdev.mac.as_deref(), Some("52:54:00:12:34:56"));
    }

    #[test]
    fn test_netdev_deserialize_optional_fields() {
        let netdev: NetDev = serde_json::from_str(r#"{"kind":"user","id":"net0"}"#).unwrap();
        assert_eq!(netdev, NetDev::user("net0"));
    }
}
