//! Database initialization and key-value stores
//!
//! Everything the shortener persists is a whole JSON document stored under a
//! single well-known key. The [`KeyValueStore`] trait is the boundary; the
//! embedded redb file is the durable implementation and [`MemoryStore`] is
//! the in-process one used by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::StoreError;

/// Table holding every persisted document
///
/// Key: document name (see the `*_KEY` constants)
/// Value: JSON text of the whole document
///
/// Example:
/// - Key: "links"
/// - Value: '{"abc123":{"id":1705501234567,"originalUrl":"https://example.com",...}}'
pub const TABLE_BLOBS: TableDefinition<&str, &str> = TableDefinition::new("blobs_v1");

/// Document with every link record, keyed by shortcode
pub const LINKS_KEY: &str = "links";

/// Document with the capped activity log
pub const ACTIVITY_KEY: &str = "activity_log";

/// Document with the signed-in demo user
pub const SESSION_KEY: &str = "session";

/// Durable string-keyed store of whole documents
///
/// Writes replace the stored value atomically from the caller's point of view.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Initializes the embedded database and creates the blob table
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "snaplink.db")
///
/// # Returns
///
/// * `Ok(Database)` - Database with the `blobs_v1` table in place
/// * `Err(redb::Error)` - The file could not be opened or the table created
///
/// # Example
///
/// ```no_run
/// # use snaplink::database::init_db;
/// let db = init_db("snaplink.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        // Open (or create if not exists) the document table
        write_txn.open_table(TABLE_BLOBS)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// [`KeyValueStore`] backed by an embedded redb file
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens (or creates) the database file and its table
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path of the redb file, created when missing
    ///
    /// # Returns
    ///
    /// * `Ok(RedbStore)` - Store ready for `load`/`save`/`remove`
    /// * `Err(StoreError::Database)` - The file is locked, corrupt or unwritable
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_db(db_path)?))
    }

    fn read(&self, key: &str) -> Result<Option<String>, redb::Error> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_BLOBS)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<(), redb::Error> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE_BLOBS)?;
            match value {
                Some(value) => {
                    table.insert(key, value)?;
                }
                None => {
                    table.remove(key)?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl KeyValueStore for RedbStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read(key)?)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.write(key, Some(value))?)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Ok(self.write(key, None)?)
    }
}

/// In-process [`KeyValueStore`]
///
/// `reject_writes(true)` makes every later `save`/`remove` fail, which is how
/// tests exercise the storage-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn check_writable(&self, key: &str) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected(key.to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}
