//! Persistent food record store
//!
//! Records live in an embedded SQLite database. A single connection is shared
//! behind a mutex and every statement runs on the blocking thread pool, so
//! callers on the async runtime are never stalled by disk I/O. Multi-row
//! writes run in one transaction: they either land completely or not at all.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::food::{FoodId, FoodInfo, StorageInfo};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS foods (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        food_item TEXT NOT NULL DEFAULT '',
        barcode_number TEXT NOT NULL DEFAULT '',
        nutrition_facts TEXT NOT NULL DEFAULT '{}',
        storage TEXT NOT NULL DEFAULT '',
        room_temp_window TEXT NOT NULL DEFAULT '',
        room_temp_expiration TEXT NOT NULL DEFAULT '',
        fridge_window TEXT NOT NULL DEFAULT '',
        fridge_expiration TEXT NOT NULL DEFAULT '',
        food_emoji TEXT NOT NULL DEFAULT '',
        cost TEXT NOT NULL DEFAULT '',
        image_url TEXT NOT NULL DEFAULT '',
        created_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_foods_user_id ON foods(user_id);
"#;

const SELECT_FOOD: &str = "SELECT id, user_id, food_item, barcode_number, nutrition_facts, \
     storage, room_temp_window, room_temp_expiration, fridge_window, fridge_expiration, \
     food_emoji, cost, image_url, created_at FROM foods";

const INSERT_FOOD: &str = "INSERT INTO foods (user_id, food_item, barcode_number, \
     nutrition_facts, storage, room_temp_window, room_temp_expiration, fridge_window, \
     fridge_expiration, food_emoji, cost, image_url, created_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

const UPDATE_FOOD: &str = "UPDATE foods SET user_id = ?2, food_item = ?3, barcode_number = ?4, \
     nutrition_facts = ?5, storage = ?6, room_temp_window = ?7, room_temp_expiration = ?8, \
     fridge_window = ?9, fridge_expiration = ?10, food_emoji = ?11, cost = ?12, \
     image_url = ?13 WHERE id = ?1";

/// Column holding the JSON-encoded nutrition facts
const NUTRITION_FACTS_COLUMN: usize = 4;

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("failed to encode nutrition facts: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("database connection lock poisoned")]
    Poisoned,
}

/// SQLite-backed store of scanned foods
pub struct FoodStore {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl FoodStore {
    /// Open the database at `path`, creating the file and schema if missing
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let db_path = path.clone();
        let (conn, records) = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(SCHEMA)?;
            let records: i64 = conn.query_row("SELECT COUNT(*) FROM foods", [], |row| row.get(0))?;
            Ok::<_, rusqlite::Error>((conn, records))
        })
        .await?
        .map_err(|source| StoreError::Open {
            path: path.clone(),
            source,
        })?;

        info!(
            "Opened food store {} with {} records",
            path.display(),
            records
        );

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await?
    }

    /// Store a new record, assigning its id and timestamp
    pub async fn create_food(&self, food: FoodInfo) -> Result<FoodInfo, StoreError> {
        let mut created = self.create_foods(vec![food]).await?;
        Ok(created.remove(0))
    }

    /// Store several records in one transaction
    pub async fn create_foods(&self, foods: Vec<FoodInfo>) -> Result<Vec<FoodInfo>, StoreError> {
        let created = self
            .with_conn(move |conn| {
                let now = Utc::now();
                let tx = conn.transaction()?;
                let mut created = Vec::with_capacity(foods.len());
                {
                    let mut insert = tx.prepare_cached(INSERT_FOOD)?;
                    for mut food in foods {
                        food.created_at = Some(now);
                        let facts = serde_json::to_string(&food.nutrition_facts)?;
                        insert.execute(params![
                            food.user_id,
                            food.food_item,
                            food.barcode_number,
                            facts,
                            food.storage,
                            food.room_temp.food_safety_window,
                            food.room_temp.expiration,
                            food.fridge.food_safety_window,
                            food.fridge.expiration,
                            food.food_emoji,
                            food.cost,
                            food.image_url,
                            food.created_at,
                        ])?;
                        food.id = tx.last_insert_rowid() as FoodId;
                        created.push(food);
                    }
                }
                tx.commit()?;
                Ok(created)
            })
            .await?;

        debug!("Stored {} food records", created.len());
        Ok(created)
    }

    /// Fetch one record owned by `user_id`
    pub async fn get_food(&self, user_id: &str, id: FoodId) -> Result<Option<FoodInfo>, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let sql = format!("{} WHERE user_id = ?1 AND id = ?2", SELECT_FOOD);
            let food = conn
                .query_row(&sql, params![user_id, id as i64], food_from_row)
                .optional()?;
            Ok(food)
        })
        .await
    }

    /// All records owned by `user_id`, ordered by id
    pub async fn list_foods(&self, user_id: &str) -> Result<Vec<FoodInfo>, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let sql = format!("{} WHERE user_id = ?1 ORDER BY id", SELECT_FOOD);
            let mut stmt = conn.prepare_cached(&sql)?;
            let foods = stmt
                .query_map(params![user_id], food_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(foods)
        })
        .await
    }

    /// Replace an existing record; returns false if the id is unknown
    pub async fn update_food(&self, food: FoodInfo) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let facts = serde_json::to_string(&food.nutrition_facts)?;
            let changed = conn.execute(
                UPDATE_FOOD,
                params![
                    food.id as i64,
                    food.user_id,
                    food.food_item,
                    food.barcode_number,
                    facts,
                    food.storage,
                    food.room_temp.food_safety_window,
                    food.room_temp.expiration,
                    food.fridge.food_safety_window,
                    food.fridge.expiration,
                    food.food_emoji,
                    food.cost,
                    food.image_url,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    /// Delete a record by id; returns whether it existed
    pub async fn delete_food(&self, id: FoodId) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let deleted = conn.execute("DELETE FROM foods WHERE id = ?1", params![id as i64])?;
            Ok(deleted > 0)
        })
        .await
    }
}

fn food_from_row(row: &Row<'_>) -> rusqlite::Result<FoodInfo> {
    let facts: String = row.get(NUTRITION_FACTS_COLUMN)?;
    let nutrition_facts = serde_json::from_str(&facts).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(NUTRITION_FACTS_COLUMN, Type::Text, Box::new(e))
    })?;

    Ok(FoodInfo {
        id: row.get::<_, i64>(0)? as FoodId,
        user_id: row.get(1)?,
        food_item: row.get(2)?,
        barcode_number: row.get(3)?,
        nutrition_facts,
        storage: row.get(5)?,
        room_temp: StorageInfo {
            food_safety_window: row.get(6)?,
            expiration: row.get(7)?,
        },
        fridge: StorageInfo {
            food_safety_window: row.get(8)?,
            expiration: row.get(9)?,
        },
        food_emoji: row.get(10)?,
        cost: row.get(11)?,
        image_url: row.get(12)?,
        created_at: row.get(13)?,
    })
}
