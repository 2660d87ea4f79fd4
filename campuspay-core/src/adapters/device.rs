//! Device information providers

use std::fs;
use std::path::PathBuf;

use crate::ports::DeviceInfoProvider;

/// Reads identifiers from the host operating system
///
/// On Linux the values come from `machine-id`, `/etc/os-release` and the DMI
/// tables under `/sys/class/dmi/id`. Other platforms report what the
/// environment exposes and leave the rest absent.
#[derive(Debug, Clone)]
pub struct HostDevice {
    root: PathBuf,
}

impl Default for HostDevice {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve system files under `root` instead of `/`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, relative: &str) -> Option<String> {
        let content = fs::read_to_string(self.root.join(relative)).ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn os_release(&self, field: &str) -> Option<String> {
        let content = fs::read_to_string(self.root.join("etc/os-release")).ok()?;
        parse_os_release(&content, field)
    }
}

/// Extract `FIELD=value` from os-release content, unquoting the value
fn parse_os_release(content: &str, field: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        if key.trim() != field {
            return None;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

impl DeviceInfoProvider for HostDevice {
    fn platform_id(&self) -> Option<String> {
        self.read("etc/machine-id")
            .or_else(|| self.read("var/lib/dbus/machine-id"))
    }

    fn build_id(&self) -> Option<String> {
        self.os_release("BUILD_ID")
    }

    fn model(&self) -> Option<String> {
        self.read("sys/class/dmi/id/product_name")
    }

    fn manufacturer(&self) -> Option<String> {
        self.read("sys/class/dmi/id/sys_vendor")
    }

    fn os_version(&self) -> Option<String> {
        self.os_release("VERSION_ID")
    }
}

/// Fixed device values
#[derive(Debug, Clone, Default)]
pub struct StaticDevice {
    pub platform_id: Option<String>,
    pub build_id: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub os_version: Option<String>,
}

impl DeviceInfoProvider for StaticDevice {
    fn platform_id(&self) -> Option<String> {
        self.platform_id.clone()
    }

    fn build_id(&self) -> Option<String> {
        self.build_id.clone()
    }

    fn model(&self) -> Option<String> {
        self.model.clone()
    }

    fn manufacturer(&self) -> Option<String> {
        self.manufacturer.clone()
    }

    fn os_version(&self) -> Option<String> {
        self.os_version.clone()
    }
}
