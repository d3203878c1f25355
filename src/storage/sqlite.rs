//! SQLite content store

use super::traits::{ContentId, ContentStore, OpenStore, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed content store
///
/// One database file with a blob table keyed by content id and a small
/// roots table of named head pointers. Thread-safe via internal mutex
/// on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Immutable content-addressed blobs
            CREATE TABLE IF NOT EXISTS blobs (
                content_id TEXT PRIMARY KEY,
                body BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Mutable named head pointers
            CREATE TABLE IF NOT EXISTS roots (
                name TEXT PRIMARY KEY,
                content_id TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl ContentStore for SqliteStore {
    fn put(&self, bytes: &[u8]) -> StorageResult<ContentId> {
        let id = ContentId::from_bytes(bytes);
        let conn = self.conn.lock().unwrap();
        // Same id means identical bytes, so an existing row needs no update
        conn.execute(
            "INSERT OR IGNORE INTO blobs (content_id, body, created_at) VALUES (?1, ?2, ?3)",
            params![id.as_str(), bytes, Utc::now().to_rfc3339()],
        )?;
        Ok(id)
    }

    fn get(&self, id: &ContentId) -> StorageResult<Vec<u8>> {
        let conn = self.conn.lock().unwrap();
        let body: Option<Vec<u8>> = conn
            .query_row(
                "SELECT body FROM blobs WHERE content_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let body = body.ok_or_else(|| StorageError::ContentNotFound(id.to_string()))?;
        // The file can be edited out from under us; recheck the hash
        if ContentId::from_bytes(&body) != *id {
            return Err(StorageError::Corrupt(format!(
                "stored bytes for {id} no longer match their content id"
            )));
        }
        Ok(body)
    }

    fn has(&self, id: &ContentId) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blobs WHERE content_id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_ids(&self) -> StorageResult<Vec<ContentId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT content_id FROM blobs ORDER BY content_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().map(ContentId::from_hex).collect())
    }

    fn set_root(&self, name: &str, id: &ContentId) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO roots (name, content_id, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                content_id = excluded.content_id,
                updated_at = excluded.updated_at",
            params![name, id.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn get_root(&self, name: &str) -> StorageResult<Option<ContentId>> {
        let conn = self.conn.lock().unwrap();
        let id: Option<String> = conn
            .query_row(
                "SELECT content_id FROM roots WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(ContentId::from_hex))
    }

    fn list_roots(&self) -> StorageResult<Vec<(String, ContentId)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT name, content_id FROM roots ORDER BY name")?;
        let roots = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(roots
            .into_iter()
            .map(|(name, id)| (name, ContentId::from_hex(id)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.put(b"blob body").unwrap();
        assert!(store.has(&id).unwrap());
        assert_eq!(store.get(&id).unwrap(), b"blob body");

        let missing = ContentId::from_bytes(b"missing");
        assert!(matches!(
            store.get(&missing),
            Err(StorageError::ContentNotFound(_))
        ));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("content.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            let id = store.put(b"persistent blob").unwrap();
            store.set_root("head", &id).unwrap();
            id
        };

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(&id).unwrap(), b"persistent blob");
        assert_eq!(store.get_root("head").unwrap(), Some(id));
    }

    #[test]
    fn root_updates_replace_previous_target() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.put(b"one").unwrap();
        let second = store.put(b"two").unwrap();

        store.set_root("head", &first).unwrap();
        store.set_root("head", &second).unwrap();
        assert_eq!(store.get_root("head").unwrap(), Some(second));
        assert_eq!(store.list_roots().unwrap().len(), 1);
    }

    #[test]
    fn list_ids_is_sorted() {
        let store = SqliteStore::open_in_memory().unwrap();
        for body in [&b"a"[..], b"b", b"c", b"d"] {
            store.put(body).unwrap();
        }
        let ids = store.list_ids().unwrap();
        assert_eq!(ids.len(), 4);
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn duplicate_put_keeps_one_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.put(b"same").unwrap();
        let b = store.put(b"same").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.list_ids().unwrap().len(), 1);
    }
}
