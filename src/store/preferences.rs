//! User preferences: exactly one row at all times.
//!
//! Created with defaults on first read, replaced wholesale on save.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::error::Result;

const PREFERENCES_ROW_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserPreferences {
    pub default_source_language: String,
    pub default_target_language: String,
    /// light, dark, system
    pub theme: String,
    pub auto_detect_language: bool,
    pub tts_enabled: bool,
    pub camera_auto_translate: bool,
    /// small, medium, large
    pub font_size: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_source_language: "en".to_string(),
            default_target_language: "vi".to_string(),
            theme: "light".to_string(),
            auto_detect_language: true,
            tts_enabled: true,
            camera_auto_translate: true,
            font_size: "medium".to_string(),
        }
    }
}

/// Read the preferences row, creating it with defaults if absent.
pub async fn get_or_init(pool: &Pool<Sqlite>) -> Result<UserPreferences> {
    let existing = sqlx::query_as::<_, UserPreferences>(
        "SELECT default_source_language, default_target_language, theme, \
                auto_detect_language, tts_enabled, camera_auto_translate, font_size \
         FROM user_preferences WHERE id = ?",
    )
    .bind(PREFERENCES_ROW_ID)
    .fetch_optional(pool)
    .await?;

    match existing {
        Some(preferences) => Ok(preferences),
        None => {
            debug!("No preferences row, initializing defaults");
            let defaults = UserPreferences::default();
            save(pool, &defaults).await?;
            Ok(defaults)
        }
    }
}

/// Replace the preferences row wholesale.
pub async fn save(pool: &Pool<Sqlite>, preferences: &UserPreferences) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO user_preferences
            (id, default_source_language, default_target_language, theme,
             auto_detect_language, tts_enabled, camera_auto_translate, font_size)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(PREFERENCES_ROW_ID)
    .bind(&preferences.default_source_language)
    .bind(&preferences.default_target_language)
    .bind(&preferences.theme)
    .bind(preferences.auto_detect_language)
    .bind(preferences.tts_enabled)
    .bind(preferences.camera_auto_translate)
    .bind(&preferences.font_size)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[tokio::test]
    async fn test_first_read_creates_defaults() {
        let store = Store::open_in_memory().await.unwrap();

        let preferences = get_or_init(store.pool()).await.unwrap();
        assert_eq!(preferences, UserPreferences::default());

        // The row now exists and reads back identically
        let again = get_or_init(store.pool()).await.unwrap();
        assert_eq!(again, preferences);
    }

    #[tokio::test]
    async fn test_save_replaces_wholesale() {
        let store = Store::open_in_memory().await.unwrap();
        get_or_init(store.pool()).await.unwrap();

        let updated = UserPreferences {
            default_source_language: "ja".to_string(),
            default_target_language: "en".to_string(),
            theme: "dark".to_string(),
            auto_detect_language: false,
            tts_enabled: false,
            camera_auto_translate: false,
            font_size: "large".to_string(),
        };
        save(store.pool(), &updated).await.unwrap();

        let read_back = get_or_init(store.pool()).await.unwrap();
        assert_eq!(read_back, updated);
    }

    #[tokio::test]
    async fn test_single_row_invariant() {
        let store = Store::open_in_memory().await.unwrap();
        get_or_init(store.pool()).await.unwrap();

        let mut updated = UserPreferences::default();
        updated.theme = "system".to_string();
        save(store.pool(), &updated).await.unwrap();
        save(store.pool(), &updated).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_preferences")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
