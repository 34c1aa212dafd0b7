//! Document Storage
//! Mission: Persist users, houses and selections as JSON documents in SQLite
//!
//! - One connection, shared by the three store facades behind a mutex
//! - Key fields are real columns (indexed, constrained); everything else
//!   lives in `doc_json`
//! - Write results mirror the acknowledgement documents clients already read
//!   (`insertedId`, `matchedCount`, `deletedCount`, ...)

pub mod houses;
pub mod selections;
pub mod users;

pub use houses::{House, HouseUpdate, ListingStore};
pub use selections::{CreateOutcome, DeleteOutcome, NewSelection, Selection, SelectionStore};
pub use users::UserStore;

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS users (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    doc_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS houses (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT UNIQUE NOT NULL,
    doc_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- At most one selection per (email, house); the per-email cap is enforced
-- by the conditional insert in selections.rs
CREATE TABLE IF NOT EXISTS selections (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT UNIQUE NOT NULL,
    email TEXT NOT NULL,
    house_id TEXT NOT NULL,
    doc_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (email, house_id)
);

CREATE INDEX IF NOT EXISTS idx_selections_email
    ON selections(email, seq);
"#;

/// Shared handle to the document database
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply the schema
    pub fn open(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        let db = Self::init(conn)?;
        info!("📊 Document store initialized at: {}", db_path);
        Ok(db)
    }

    /// Private in-memory database, used by tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize database schema")?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap_or_default();

        if !matches!(journal_mode.to_lowercase().as_str(), "wal" | "memory") {
            warn!("WAL mode not active, journal_mode = {}", journal_mode);
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.clone())
    }

    pub fn listings(&self) -> ListingStore {
        ListingStore::new(self.clone())
    }

    pub fn selections(&self) -> SelectionStore {
        SelectionStore::new(self.clone())
    }
}

/// Acknowledgement of a single-document insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertResult {
    pub fn new(inserted_id: String) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// Acknowledgement of a single-document update or upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

impl UpdateResult {
    /// No document matched the filter
    pub fn unmatched() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 0,
            upserted_id: None,
        }
    }

    /// One document matched; `modified` says whether any value changed
    pub fn matched(modified: bool) -> Self {
        Self {
            matched_count: 1,
            modified_count: u64::from(modified),
            ..Self::unmatched()
        }
    }

    pub fn upserted(id: String) -> Self {
        Self {
            upserted_count: 1,
            upserted_id: Some(id),
            ..Self::unmatched()
        }
    }
}

/// Acknowledgement of a single-document delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: usize) -> Self {
        Self {
            acknowledged: true,
            deleted_count: deleted_count as u64,
        }
    }
}

/// Fresh store-assigned document id (32 lowercase hex chars)
pub(crate) fn new_object_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn encode_doc(doc: &Map<String, Value>) -> Result<String> {
    serde_json::to_string(doc).context("Failed to encode document")
}

pub(crate) fn decode_doc(doc_json: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(doc_json).context("Stored document is not a JSON object")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[test]
    fn test_object_ids_are_unique_hex() {
        let a = new_object_id();
        let b = new_object_id();

        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_result_documents_use_camel_case() {
        assert_eq!(
            serde_json::to_value(InsertResult::new("abc".into())).unwrap(),
            json!({"acknowledged": true, "insertedId": "abc"})
        );
        assert_eq!(
            serde_json::to_value(UpdateResult::matched(false)).unwrap(),
            json!({
                "acknowledged": true,
                "matchedCount": 1,
                "modifiedCount": 0,
                "upsertedCount": 0,
                "upsertedId": null
            })
        );
        assert_eq!(
            serde_json::to_value(DeleteResult::new(1)).unwrap(),
            json!({"acknowledged": true, "deletedCount": 1})
        );
    }

    #[test]
    fn test_file_database_persists_across_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();

        let inserted = {
            let db = Database::open(db_path).unwrap();
            let fields = json!({"name": "Lake House", "price": 1200});
            db.listings()
                .create(fields.as_object().cloned().unwrap())
                .unwrap()
        };

        let db = Database::open(db_path).unwrap();
        let houses = db.listings().list_all().unwrap();
        assert_eq!(houses.len(), 1);
        assert_eq!(houses[0].id, inserted.inserted_id);
        assert_eq!(houses[0].fields["name"], "Lake House");
    }

    #[test]
    fn test_stores_share_one_database() {
        let db = Database::in_memory().unwrap();
        db.users()
            .upsert_by_email("a@b.c", Map::new())
            .unwrap();

        assert_eq!(db.users().list_all().unwrap().len(), 1);
        assert!(db.listings().list_all().unwrap().is_empty());
        assert!(db.selections().list_for_user("a@b.c").unwrap().is_empty());
    }
}
