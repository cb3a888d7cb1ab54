// Local persistence: two tables, seeded at startup
//
// - languages: immutable reference data (bulk-seeded, read-only afterwards)
// - user_preferences: a single fixed-identity row, replaced wholesale

pub mod languages;
pub mod preferences;

pub use languages::Language;
pub use preferences::UserPreferences;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::info;

use crate::error::Result;

pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Open (creating if missing) the database file and ensure the schema.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("Opened store at {}", path.display());
        Ok(store)
    }

    /// In-memory database, used by tests. Single connection: each sqlite
    /// in-memory connection is its own database.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS languages (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                native_name TEXT NOT NULL,
                supports_text INTEGER NOT NULL DEFAULT 1,
                supports_voice INTEGER NOT NULL DEFAULT 0,
                supports_camera INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_preferences (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                default_source_language TEXT NOT NULL,
                default_target_language TEXT NOT NULL,
                theme TEXT NOT NULL,
                auto_detect_language INTEGER NOT NULL,
                tts_enabled INTEGER NOT NULL,
                camera_auto_translate INTEGER NOT NULL,
                font_size TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
