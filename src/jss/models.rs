use serde::Deserialize;
use serde_json::Value;

/// The response to `GET /JSSResource/mobiledevices`.
#[derive(Debug, Deserialize)]
pub struct MobileDeviceList {
    pub mobile_devices: Vec<MobileDeviceSummary>,
}

/// A device as it appears within the full device list.
/// Only the keys we make use of are listed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MobileDeviceSummary {
    pub id: i32,
    pub serial_number: String,
    // Unnamed or unassigned devices may omit these entirely.
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(rename = "modelDisplay")]
    pub model_display: String,
    pub wifi_mac_address: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// The response to `GET /JSSResource/mobiledevices/id/{id}`.
#[derive(Debug, Deserialize)]
pub struct MobileDeviceEnvelope {
    pub mobile_device: MobileDeviceDetail,
}

/// The full record of a single device.
///
/// Jamf returns a large, version-dependent document, so we keep it
/// untyped and look fields up by path instead.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct MobileDeviceDetail(Value);

impl MobileDeviceDetail {
    pub fn new(value: Value) -> Self {
        MobileDeviceDetail(value)
    }

    /// Looks up a field by its slash-separated path, such as `general/os_version`.
    ///
    /// Scalars are returned as text, with `null` being empty.
    /// Returns `None` if the path does not exist or refers to an object or array.
    pub fn field(&self, path: &str) -> Option<String> {
        let pointer = format!("/{}", path.trim_start_matches('/'));
        match self.0.pointer(&pointer)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Null => Some(String::new()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}
