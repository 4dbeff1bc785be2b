//! Pulls mobile device inventory from a JSS (Jamf Pro) into a relational table.
//!
//! Every run re-reads the full device list and upserts each device by id.
//! The upsert tolerates other processes writing the same devices at the same time.

pub mod capacity;
pub mod cli;
pub mod config;
pub mod database;
pub mod device;
pub mod jss;
pub mod sync;
