//! Device identity models

use serde::{Deserialize, Serialize};

/// Placeholder used for any platform value that cannot be read
pub const UNKNOWN: &str = "unknown";

/// Correlation identity sent with payments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub platform_id: String,
}

/// Snapshot of the host device, every field defaulting to `"unknown"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_id: String,
    pub model: String,
    pub manufacturer: String,
    pub os_version: String,
}

impl DeviceInfo {
    pub fn unknown() -> Self {
        Self {
            device_id: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            manufacturer: UNKNOWN.to_string(),
            os_version: UNKNOWN.to_string(),
        }
    }
}

/// Fall back to `"unknown"` for missing or blank values
pub fn or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_unknown() {
        assert_eq!(or_unknown(None), "unknown");
        assert_eq!(or_unknown(Some("  ".to_string())), "unknown");
        assert_eq!(or_unknown(Some(" Pixel 8\n".to_string())), "Pixel 8");
    }

    #[test]
    fn test_device_info_wire_names() {
        let value = serde_json::to_value(DeviceInfo::unknown()).unwrap();
        assert_eq!(value["deviceId"], "unknown");
        assert_eq!(value["osVersion"], "unknown");
    }
}
