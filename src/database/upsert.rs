use super::models::{DeviceChanges, DeviceRow};
use super::schema::casperimport;
use super::{AnyConnection, StoreError};
use crate::device::DeviceRecord;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Identical to the table earlier releases created, so existing tables are reused as-is.
pub const CREATE_INVENTORY_TABLE: &str = "CREATE TABLE IF NOT EXISTS casperimport(\
id INT PRIMARY KEY NOT NULL, serial TEXT, name TEXT, model TEXT, ios_version TEXT, \
ipaddress TEXT, macaddress TEXT, bluetooth TEXT, capacity TEXT, username TEXT, \
email TEXT, asset_tag TEXT);";

/// How many times we'll lose an insert race for a single device before giving up.
/// Rows are never deleted, so losing once means the next UPDATE will find the row.
pub const MAX_UPSERT_ATTEMPTS: u32 = 8;

/// What an upsert did to the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Ensures our inventory table exists. Safe to call on every run.
pub fn create_inventory_table(conn: &mut AnyConnection) -> Result<(), StoreError> {
    conn.batch_execute(CREATE_INVENTORY_TABLE)?;
    Ok(())
}

/// Makes the row for `record.id` match `record`, inserting it if necessary.
///
/// We first attempt to UPDATE the existing row. If there is none, we INSERT.
/// Should another process insert the same id between those two statements,
/// our INSERT fails with a unique violation and we simply try again,
/// at which point the UPDATE will find their row.
///
/// The INSERT runs within a nested transaction (a savepoint, if the caller
/// has a transaction open) so that a failed insert does not abort the
/// caller's transaction on PostgreSQL.
pub fn upsert_device(
    conn: &mut AnyConnection,
    record: &DeviceRecord,
) -> Result<UpsertOutcome, StoreError> {
    let changes = DeviceChanges::from(record);

    for attempt in 1..=MAX_UPSERT_ATTEMPTS {
        let updated = diesel::update(casperimport::table.find(record.id))
            .set(&changes)
            .execute(conn)?;
        if updated > 0 {
            return Ok(UpsertOutcome::Updated);
        }

        // Not there yet, so let's try to insert it.
        let inserted = conn.transaction(|conn| {
            diesel::insert_into(casperimport::table)
                .values((casperimport::id.eq(record.id), &changes))
                .execute(conn)
        });

        match inserted {
            Ok(_) => return Ok(UpsertOutcome::Inserted),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                // Someone beat us to it. Loop around and update their row instead.
                debug!(id = record.id, attempt, "lost insert race, retrying update");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(StoreError::Contention {
        id: record.id,
        attempts: MAX_UPSERT_ATTEMPTS,
    })
}

/// Reads a device back from the table, reversing any text escaping.
pub fn fetch_device(
    conn: &mut AnyConnection,
    id: i32,
) -> Result<Option<DeviceRecord>, StoreError> {
    let row = casperimport::table
        .find(id)
        .select(DeviceRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(DeviceRecord::from))
}

/// The number of devices currently in the table.
pub fn count_devices(conn: &mut AnyConnection) -> Result<i64, StoreError> {
    Ok(casperimport::table.count().get_result(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn record(id: i32, name: &str) -> DeviceRecord {
        DeviceRecord {
            id,
            serial: format!("SN{id}"),
            name: name.to_string(),
            model: "iPad Air (5th Generation)".to_string(),
            ios_version: "17.4".to_string(),
            ip_address: "10.0.0.12".to_string(),
            mac_address: "aa:bb:cc:dd:ee:01".to_string(),
            bluetooth_mac: "aa:bb:cc:dd:ee:02".to_string(),
            capacity: "16.00 GB".to_string(),
            username: "jappleseed".to_string(),
            email: "jappleseed@example.com".to_string(),
            asset_tag: format!("TAG-{id}"),
        }
    }

    /// A fresh SQLite database with our table in place.
    fn database() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().expect("should be able to create temp dir");
        let path = dir
            .path()
            .join("inventory.sqlite")
            .to_string_lossy()
            .into_owned();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        create_inventory_table(&mut conn).unwrap();
        (dir, path)
    }

    #[test]
    fn insert_then_rename() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();

        let first = record(1, "iPad-A");
        assert_eq!(
            upsert_device(&mut conn, &first).unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(count_devices(&mut conn).unwrap(), 1);
        let stored = fetch_device(&mut conn, 1).unwrap().unwrap();
        assert_eq!(stored.serial, "SN1");

        let renamed = record(1, "iPad-A-renamed");
        assert_eq!(
            upsert_device(&mut conn, &renamed).unwrap(),
            UpsertOutcome::Updated
        );
        assert_eq!(count_devices(&mut conn).unwrap(), 1);
        assert_eq!(fetch_device(&mut conn, 1).unwrap().unwrap(), renamed);
    }

    #[test]
    fn upserting_twice_is_idempotent() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        let device = record(7, "Cart 3 #7");

        upsert_device(&mut conn, &device).unwrap();
        let once = fetch_device(&mut conn, 7).unwrap();
        upsert_device(&mut conn, &device).unwrap();
        let twice = fetch_device(&mut conn, 7).unwrap();

        assert_eq!(once, twice);
        assert_eq!(count_devices(&mut conn).unwrap(), 1);
    }

    #[test]
    fn other_devices_are_untouched() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        let a = record(1, "A");
        let b = record(2, "B");

        upsert_device(&mut conn, &a).unwrap();
        upsert_device(&mut conn, &b).unwrap();
        upsert_device(&mut conn, &record(1, "A, again")).unwrap();

        assert_eq!(fetch_device(&mut conn, 2).unwrap().unwrap(), b);
        assert_eq!(count_devices(&mut conn).unwrap(), 2);
    }

    #[test]
    fn non_ascii_text_round_trips() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        let mut device = record(3, "Zoë's iPad 📱");
        device.username = "山田太郎".to_string();

        upsert_device(&mut conn, &device).unwrap();

        let stored = fetch_device(&mut conn, 3).unwrap().unwrap();
        assert_eq!(stored.name, "Zoë's iPad 📱");
        assert_eq!(stored.username, "山田太郎");
    }

    #[test]
    fn stored_text_is_escaped() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        upsert_device(&mut conn, &record(4, "Zoë")).unwrap();

        let raw: Option<String> = casperimport::table
            .find(4)
            .select(casperimport::name)
            .first(&mut conn)
            .unwrap();
        assert_eq!(raw.as_deref(), Some("Zo\\xeb"));
    }

    #[test]
    fn missing_device_reads_as_none() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        assert_eq!(fetch_device(&mut conn, 42).unwrap(), None);
    }

    #[test]
    fn table_creation_is_idempotent() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        upsert_device(&mut conn, &record(1, "kept")).unwrap();

        create_inventory_table(&mut conn).unwrap();

        assert_eq!(fetch_device(&mut conn, 1).unwrap().unwrap().name, "kept");
    }

    #[test]
    fn upsert_inside_outer_transaction() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        upsert_device(&mut conn, &record(1, "existing")).unwrap();

        conn.transaction::<_, StoreError, _>(|conn| {
            upsert_device(conn, &record(1, "existing, updated"))?;
            upsert_device(conn, &record(2, "new"))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(count_devices(&mut conn).unwrap(), 2);
        assert_eq!(
            fetch_device(&mut conn, 1).unwrap().unwrap().name,
            "existing, updated"
        );
    }

    diesel::table! {
        lost_races (attempt) {
            attempt -> Integer,
        }
    }

    /// Makes the first UPDATE skip the existing row, as if another writer
    /// inserted it between our UPDATE and INSERT.
    const LOSE_FIRST_RACE: &str = "\
CREATE TABLE lost_races(attempt INTEGER PRIMARY KEY);
CREATE TRIGGER lose_first_race BEFORE UPDATE ON casperimport
WHEN (SELECT COUNT(*) FROM lost_races) = 0
BEGIN
    INSERT INTO lost_races VALUES (1);
    SELECT RAISE(IGNORE);
END;";

    #[test]
    fn lost_insert_race_falls_back_to_update() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        upsert_device(&mut conn, &record(5, "theirs")).unwrap();
        conn.batch_execute(LOSE_FIRST_RACE).unwrap();

        let ours = record(5, "ours");
        assert_eq!(
            upsert_device(&mut conn, &ours).unwrap(),
            UpsertOutcome::Updated
        );

        let races: i64 = lost_races::table.count().get_result(&mut conn).unwrap();
        assert_eq!(races, 1);
        assert_eq!(count_devices(&mut conn).unwrap(), 1);
        assert_eq!(fetch_device(&mut conn, 5).unwrap().unwrap(), ours);
    }

    #[test]
    fn endless_contention_gives_up() {
        let (_dir, path) = database();
        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        upsert_device(&mut conn, &record(6, "theirs")).unwrap();
        conn.batch_execute(
            "CREATE TRIGGER always_lose BEFORE UPDATE ON casperimport \
             BEGIN SELECT RAISE(IGNORE); END;",
        )
        .unwrap();

        let result = upsert_device(&mut conn, &record(6, "ours"));
        assert!(matches!(
            result,
            Err(StoreError::Contention {
                id: 6,
                attempts: MAX_UPSERT_ATTEMPTS
            })
        ));

        // Their row is left as it was.
        assert_eq!(fetch_device(&mut conn, 6).unwrap().unwrap().name, "theirs");
        assert_eq!(count_devices(&mut conn).unwrap(), 1);
    }

    #[test]
    fn concurrent_first_upserts_leave_one_row() {
        const WRITERS: usize = 8;
        let (_dir, path) = database();
        let barrier = Arc::new(Barrier::new(WRITERS));

        let handles: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut conn = AnyConnection::open_sqlite(&path).unwrap();
                    let device = record(2, &format!("writer {writer}"));
                    barrier.wait();
                    upsert_device(&mut conn, &device)
                })
            })
            .collect();

        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();

        let inserted = outcomes
            .iter()
            .filter(|outcome| **outcome == UpsertOutcome::Inserted)
            .count();
        assert_eq!(inserted, 1);

        let mut conn = AnyConnection::open_sqlite(&path).unwrap();
        assert_eq!(count_devices(&mut conn).unwrap(), 1);
        let stored = fetch_device(&mut conn, 2).unwrap().unwrap();
        assert!(stored.name.starts_with("writer "));
    }
}
