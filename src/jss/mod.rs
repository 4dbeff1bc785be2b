mod client;
mod models;

pub use client::{JssClient, JssError};
pub use models::{MobileDeviceDetail, MobileDeviceSummary};
