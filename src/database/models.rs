use super::escape::{escape_text, unescape_text};
use super::schema::casperimport;
use crate::device::DeviceRecord;
use diesel::prelude::*;

/// Every non-key column of an inventory row, as written to the store.
///
/// Used both as the UPDATE changeset and, together with the id,
/// as the INSERT values.
#[derive(AsChangeset, Insertable)]
#[diesel(table_name = casperimport)]
pub struct DeviceChanges<'a> {
    pub serial: &'a str,
    pub name: String,
    pub model: &'a str,
    pub ios_version: &'a str,
    pub ip_address: &'a str,
    pub mac_address: &'a str,
    pub bluetooth_mac: &'a str,
    pub capacity: &'a str,
    pub username: String,
    pub email: &'a str,
    pub asset_tag: &'a str,
}

impl<'a> From<&'a DeviceRecord> for DeviceChanges<'a> {
    fn from(record: &'a DeviceRecord) -> Self {
        DeviceChanges {
            serial: &record.serial,
            // Free-text fields may contain anything a user typed.
            name: escape_text(&record.name),
            model: &record.model,
            ios_version: &record.ios_version,
            ip_address: &record.ip_address,
            mac_address: &record.mac_address,
            bluetooth_mac: &record.bluetooth_mac,
            capacity: &record.capacity,
            username: escape_text(&record.username),
            email: &record.email,
            asset_tag: &record.asset_tag,
        }
    }
}

/// An inventory row as read back from the store.
///
/// Columns are nullable, as rows may predate us.
#[derive(Queryable, Selectable)]
#[diesel(table_name = casperimport)]
pub struct DeviceRow {
    pub id: i32,
    pub serial: Option<String>,
    pub name: Option<String>,
    pub model: Option<String>,
    pub ios_version: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub bluetooth_mac: Option<String>,
    pub capacity: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub asset_tag: Option<String>,
}

impl From<DeviceRow> for DeviceRecord {
    fn from(row: DeviceRow) -> Self {
        DeviceRecord {
            id: row.id,
            serial: row.serial.unwrap_or_default(),
            name: unescape_text(&row.name.unwrap_or_default()),
            model: row.model.unwrap_or_default(),
            ios_version: row.ios_version.unwrap_or_default(),
            ip_address: row.ip_address.unwrap_or_default(),
            mac_address: row.mac_address.unwrap_or_default(),
            bluetooth_mac: row.bluetooth_mac.unwrap_or_default(),
            capacity: row.capacity.unwrap_or_default(),
            username: unescape_text(&row.username.unwrap_or_default()),
            email: row.email.unwrap_or_default(),
            asset_tag: row.asset_tag.unwrap_or_default(),
        }
    }
}
