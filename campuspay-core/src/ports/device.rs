//! Device information port

use crate::domain::{or_unknown, DeviceIdentity, DeviceInfo};

/// Read-only access to host platform identifiers
///
/// Each accessor returns `None` when the platform cannot provide the value.
pub trait DeviceInfoProvider: Send + Sync {
    /// Stable per-installation identifier, sent with payments
    fn platform_id(&self) -> Option<String>;

    /// Internal OS build identifier
    fn build_id(&self) -> Option<String>;

    fn model(&self) -> Option<String>;

    fn manufacturer(&self) -> Option<String>;

    fn os_version(&self) -> Option<String>;

    fn identity(&self) -> DeviceIdentity {
        DeviceIdentity {
            platform_id: or_unknown(self.platform_id()),
        }
    }

    /// Snapshot of the device. Never fails; missing values read `"unknown"`.
    fn snapshot(&self) -> DeviceInfo {
        DeviceInfo {
            device_id: or_unknown(self.build_id()),
            model: or_unknown(self.model()),
            manufacturer: or_unknown(self.manufacturer()),
            os_version: or_unknown(self.os_version()),
        }
    }
}
