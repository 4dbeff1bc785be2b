use crate::capacity::human_readable;
use crate::jss::{MobileDeviceDetail, MobileDeviceSummary};
use thiserror::Error;

// Paths within a device's full record.
const OS_VERSION: &str = "general/os_version";
const IP_ADDRESS: &str = "general/ip_address";
const BLUETOOTH_MAC: &str = "general/bluetooth_mac_address";
const CAPACITY: &str = "general/capacity";
const EMAIL: &str = "location/email_address";
const ASSET_TAG: &str = "general/asset_tag";

/// Capacities are shown with two decimal places, e.g. "16.00 GB".
const CAPACITY_PRECISION: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("device {id} is missing {path}")]
    MissingField { id: i32, path: &'static str },
    #[error("device {id} has a capacity of {value:?}, which is not a byte count")]
    InvalidCapacity { id: i32, value: String },
}

/// A single device, as it should appear within the inventory table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: i32,
    pub serial: String,
    pub name: String,
    pub model: String,
    pub ios_version: String,
    pub ip_address: String,
    pub mac_address: String,
    pub bluetooth_mac: String,
    pub capacity: String,
    pub username: String,
    pub email: String,
    pub asset_tag: String,
}

impl DeviceRecord {
    /// Combines a device's list entry with its full record.
    pub fn from_jss(
        summary: &MobileDeviceSummary,
        detail: &MobileDeviceDetail,
    ) -> Result<Self, RecordError> {
        let id = summary.id;
        let field = |path: &'static str| {
            detail
                .field(path)
                .ok_or(RecordError::MissingField { id, path })
        };

        let raw_capacity = field(CAPACITY)?;
        let capacity_bytes = raw_capacity
            .trim()
            .parse::<u64>()
            .map_err(|_| RecordError::InvalidCapacity {
                id,
                value: raw_capacity.clone(),
            })?;

        Ok(DeviceRecord {
            id,
            serial: summary.serial_number.clone(),
            name: summary.device_name.clone().unwrap_or_default(),
            model: summary.model_display.clone(),
            ios_version: field(OS_VERSION)?,
            ip_address: field(IP_ADDRESS)?,
            mac_address: summary.wifi_mac_address.clone(),
            bluetooth_mac: field(BLUETOOTH_MAC)?,
            capacity: human_readable(capacity_bytes, CAPACITY_PRECISION),
            username: summary.username.clone().unwrap_or_default(),
            email: field(EMAIL)?,
            asset_tag: field(ASSET_TAG)?,
        })
    }
}
