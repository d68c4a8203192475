//! SQLite store for saved positions and last-used settings.

use crate::domain::error::PosCheckError;
use crate::domain::saved_position::{NewPosition, SavedPosition};
use crate::domain::validation::PositionInput;
use crate::ports::position_store_port::PositionStorePort;
use chrono::{DateTime, TimeZone, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;

const SETTINGS_KEY: &str = "last_position";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> PosCheckError {
    PosCheckError::Storage {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> PosCheckError {
    PosCheckError::StorageQuery {
        reason: e.to_string(),
    }
}

fn millis_to_utc(ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, ms))
}

impl SqliteAdapter {
    /// Opens the database file and creates the schema if needed.
    pub fn open(db_path: &Path, pool_size: u32) -> Result<Self, PosCheckError> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(pool_error)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, PosCheckError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, PosCheckError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), PosCheckError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS saved_positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                entry_price REAL NOT NULL,
                target1 REAL NOT NULL,
                target2 REAL,
                stop_price REAL NOT NULL,
                leverage REAL NOT NULL,
                open_time_ms INTEGER NOT NULL,
                saved_at_ms INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(query_error)?;
        Ok(())
    }
}

impl PositionStorePort for SqliteAdapter {
    fn load_settings(&self) -> Result<Option<PositionInput>, PosCheckError> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;

        match value {
            None => Ok(None),
            Some(json) => match serde_json::from_str(&json) {
                Ok(settings) => Ok(Some(settings)),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable stored settings: {}", e);
                    Ok(None)
                }
            },
        }
    }

    fn save_settings(&self, settings: &PositionInput) -> Result<(), PosCheckError> {
        let json = serde_json::to_string(settings).map_err(|e| PosCheckError::Storage {
            reason: format!("failed to serialize settings: {}", e),
        })?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![SETTINGS_KEY, json],
        )
        .map_err(query_error)?;
        Ok(())
    }

    fn list_positions(&self) -> Result<Vec<SavedPosition>, PosCheckError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, symbol, entry_price, target1, target2, stop_price, leverage,
                        open_time_ms, saved_at_ms
                 FROM saved_positions
                 ORDER BY id ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                Ok(SavedPosition {
                    id: id as u64,
                    name: row.get(1)?,
                    symbol: row.get(2)?,
                    entry_price: row.get(3)?,
                    target1: row.get(4)?,
                    target2: row.get(5)?,
                    stop_price: row.get(6)?,
                    leverage: row.get(7)?,
                    open_time: millis_to_utc(row.get(8)?)?,
                    saved_at: millis_to_utc(row.get(9)?)?,
                })
            })
            .map_err(query_error)?;

        let mut positions = Vec::new();
        for row in rows {
            positions.push(row.map_err(query_error)?);
        }
        tracing::info!("Loaded {} saved positions", positions.len());
        Ok(positions)
    }

    fn add_position(&self, position: NewPosition) -> Result<SavedPosition, PosCheckError> {
        let conn = self.conn()?;
        let p = &position.position;
        conn.execute(
            "INSERT INTO saved_positions
                (name, symbol, entry_price, target1, target2, stop_price, leverage,
                 open_time_ms, saved_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                position.name,
                p.symbol,
                p.entry_price,
                p.target1,
                p.target2,
                p.stop_price,
                p.leverage,
                p.open_time.timestamp_millis(),
                position.saved_at.timestamp_millis(),
            ],
        )
        .map_err(query_error)?;

        let id = conn.last_insert_rowid() as u64;
        let saved = position.into_saved(id);
        tracing::info!("Saved position {} ({})", saved.id, saved.name);
        Ok(saved)
    }

    fn delete_position(&self, id: u64) -> Result<bool, PosCheckError> {
        let conn = self.conn()?;
        let deleted = conn
            .execute(
                "DELETE FROM saved_positions WHERE id = ?1",
                params![id as i64],
            )
            .map_err(query_error)?;
        if deleted > 0 {
            tracing::info!("Deleted position {}", id);
        }
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::PositionSpec;
    use chrono::FixedOffset;
    use tempfile::TempDir;

    fn new_position(symbol: &str, target2: Option<f64>) -> NewPosition {
        NewPosition::new(
            PositionSpec {
                symbol: symbol.into(),
                entry_price: 0.5,
                target1: 0.45,
                target2,
                stop_price: 0.55,
                leverage: 20.0,
                open_time: Utc.with_ymd_and_hms(2024, 9, 1, 0, 30, 0).unwrap(),
            },
            Some(format!("{} short", symbol)),
            Utc.with_ymd_and_hms(2024, 9, 1, 1, 0, 0).unwrap(),
            FixedOffset::east_opt(0).unwrap(),
        )
    }

    #[test]
    fn add_and_list_round_trip() {
        let store = SqliteAdapter::in_memory().unwrap();
        let a = store.add_position(new_position("XRPUSDT", None)).unwrap();
        let b = store.add_position(new_position("ADAUSDT", Some(0.4))).unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.list_positions().unwrap(), vec![a, b.clone()]);
        assert_eq!(store.get_position(2).unwrap(), Some(b));
    }

    #[test]
    fn delete_removes_only_matching_id() {
        let store = SqliteAdapter::in_memory().unwrap();
        store.add_position(new_position("XRPUSDT", None)).unwrap();
        store.add_position(new_position("ADAUSDT", None)).unwrap();

        assert!(store.delete_position(1).unwrap());
        assert!(!store.delete_position(1).unwrap());
        let remaining = store.list_positions().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].symbol, "ADAUSDT");
    }

    #[test]
    fn autoincrement_does_not_reuse_ids() {
        let store = SqliteAdapter::in_memory().unwrap();
        store.add_position(new_position("XRPUSDT", None)).unwrap();
        store.delete_position(1).unwrap();
        let next = store.add_position(new_position("ADAUSDT", None)).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn settings_upsert() {
        let store = SqliteAdapter::in_memory().unwrap();
        assert_eq!(store.load_settings().unwrap(), None);

        let mut settings = PositionInput {
            symbol: "DOGEUSDT".into(),
            leverage: "3".into(),
            ..PositionInput::default()
        };
        store.save_settings(&settings).unwrap();
        settings.leverage = "4".into();
        store.save_settings(&settings).unwrap();

        assert_eq!(store.load_settings().unwrap(), Some(settings));
    }

    #[test]
    fn open_persists_to_file() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("poscheck.db");

        {
            let store = SqliteAdapter::open(&db, 2).unwrap();
            store.add_position(new_position("XRPUSDT", None)).unwrap();
        }
        let reopened = SqliteAdapter::open(&db, 2).unwrap();
        assert_eq!(reopened.list_positions().unwrap().len(), 1);
    }
}
