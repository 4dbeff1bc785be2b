use crate::config::{DbPrefs, JssPrefs, PrefsError, Settings, load_prefs};
use crate::database::{
    AnyConnection, StoreError, UpsertOutcome, create_inventory_table, upsert_device,
};
use crate::device::{DeviceRecord, RecordError};
use crate::jss::{JssClient, JssError, MobileDeviceSummary};
use diesel::Connection;
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Prefs(#[from] PrefsError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Jss(#[from] JssError),
    #[error("unable to fetch device {id} from JSS: {source}")]
    DeviceFetch { id: i32, source: JssError },
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("database task failed: {0}")]
    Task(#[from] JoinError),
}

impl From<diesel::result::Error> for SyncError {
    fn from(err: diesel::result::Error) -> Self {
        SyncError::Store(StoreError::Query(err))
    }
}

impl SyncError {
    /// Whether this error concerns a single device, rather than our
    /// connection to the JSS as a whole.
    fn is_device_specific(&self) -> bool {
        match self {
            SyncError::Record(_) => true,
            // Anything else (refused credentials, an unreachable server)
            // would fail every remaining device in the same way.
            SyncError::DeviceFetch { source, .. } => matches!(source, JssError::Status { .. }),
            _ => false,
        }
    }
}

/// Totals for a completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Performs a full run: loads preferences, connects to both sides,
/// and brings the inventory table up to date with the JSS.
pub async fn run(settings: &Settings) -> Result<SyncSummary, SyncError> {
    let db_prefs: DbPrefs = load_prefs(&settings.db_prefs_path)?;

    info!("Attempting to connect to database...");
    let conn = task::spawn_blocking(move || AnyConnection::open(&db_prefs)).await??;
    debug!(backend = conn.backend_name(), "connected to database");

    info!("Attempting to connect to JSS...");
    let jss_prefs: JssPrefs = load_prefs(&settings.jss_prefs_path)?;
    let jss = JssClient::new(&jss_prefs)?;

    sync_inventory(conn, &jss, settings.keep_going).await
}

/// Pulls every device from the JSS and upserts it into our table.
///
/// All devices are written within a single transaction, so a failed run
/// leaves the table as it was. Devices that can't be fetched or parsed abort
/// the run, unless `keep_going` is set, in which case they're skipped.
/// Losing our connection to the JSS always aborts the run.
///
/// Database work runs on the blocking thread pool.
pub async fn sync_inventory(
    mut conn: AnyConnection,
    jss: &JssClient,
    keep_going: bool,
) -> Result<SyncSummary, SyncError> {
    info!("Attempting to create database table...");
    let conn = task::spawn_blocking(move || {
        create_inventory_table(&mut conn)?;
        Ok::<_, StoreError>(conn)
    })
    .await??;

    info!("Attempting to access JSS device list...");
    let devices = jss.list_mobile_devices().await?;
    debug!(count = devices.len(), "received device list");

    info!("Parsing device list and adding to database.");
    let mut skipped = 0;
    let mut records = Vec::with_capacity(devices.len());
    for device in &devices {
        match fetch_record(jss, device).await {
            Ok(record) => records.push(record),
            Err(err) if keep_going && err.is_device_specific() => {
                warn!(id = device.id, "skipping device: {err}");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    let mut summary = task::spawn_blocking(move || write_inventory(conn, &records)).await??;
    summary.skipped = skipped;

    info!(
        inserted = summary.inserted,
        updated = summary.updated,
        skipped = summary.skipped,
        "Done."
    );
    Ok(summary)
}

/// Upserts every record within a single transaction.
fn write_inventory(
    mut conn: AnyConnection,
    records: &[DeviceRecord],
) -> Result<SyncSummary, SyncError> {
    conn.transaction::<_, SyncError, _>(|conn| {
        let mut summary = SyncSummary::default();
        for record in records {
            match upsert_device(conn, record)? {
                UpsertOutcome::Inserted => summary.inserted += 1,
                UpsertOutcome::Updated => summary.updated += 1,
            }
            debug!(id = record.id, serial = %record.serial, "stored device");
        }

        info!("Committing database transactions...");
        Ok(summary)
    })
}

async fn fetch_record(
    jss: &JssClient,
    device: &MobileDeviceSummary,
) -> Result<DeviceRecord, SyncError> {
    let detail = jss
        .mobile_device(device.id)
        .await
        .map_err(|source| SyncError::DeviceFetch {
            id: device.id,
            source,
        })?;
    Ok(DeviceRecord::from_jss(device, &detail)?)
}
