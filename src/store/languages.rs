//! Supported-language reference data.
//!
//! Seeded once at startup with replace-on-conflict semantics; never
//! individually mutated afterwards. Reads are exact-match lookups or a
//! full-table scan for the selection UI.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Language {
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub supports_text: bool,
    pub supports_voice: bool,
    pub supports_camera: bool,
}

impl Language {
    fn entry(code: &str, name: &str, native_name: &str, supports_voice: bool) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            native_name: native_name.to_string(),
            supports_text: true,
            supports_voice,
            supports_camera: true,
        }
    }
}

/// The full supported-language table.
pub fn seed_set() -> Vec<Language> {
    vec![
        Language::entry("af", "Afrikaans", "Afrikaans", false),
        Language::entry("ar", "Arabic", "العربية", false),
        Language::entry("bg", "Bulgarian", "Български", false),
        Language::entry("bn", "Bengali", "বাংলা", false),
        Language::entry("ca", "Catalan", "Català", false),
        Language::entry("zh", "Chinese", "中文", true),
        Language::entry("zh-CN", "Chinese (Simplified)", "简体中文", false),
        Language::entry("zh-TW", "Chinese (Traditional)", "繁體中文", false),
        Language::entry("hr", "Croatian", "Hrvatski", false),
        Language::entry("cs", "Czech", "Čeština", false),
        Language::entry("da", "Danish", "Dansk", false),
        Language::entry("nl", "Dutch", "Nederlands", false),
        Language::entry("en", "English", "English", true),
        Language::entry("et", "Estonian", "Eesti", false),
        Language::entry("fi", "Finnish", "Suomi", false),
        Language::entry("fr", "French", "Français", true),
        Language::entry("gl", "Galician", "Galego", false),
        Language::entry("ka", "Georgian", "ქართული", false),
        Language::entry("de", "German", "Deutsch", true),
        Language::entry("el", "Greek", "Ελληνικά", false),
        Language::entry("gu", "Gujarati", "ગુજરાતી", false),
        Language::entry("ht", "Haitian Creole", "Kreyòl Ayisyen", false),
        Language::entry("he", "Hebrew", "עברית", false),
        Language::entry("hi", "Hindi", "हिन्दी", false),
        Language::entry("hu", "Hungarian", "Magyar", false),
        Language::entry("is", "Icelandic", "Íslenska", false),
        Language::entry("id", "Indonesian", "Bahasa Indonesia", false),
        Language::entry("ga", "Irish", "Gaeilge", false),
        Language::entry("it", "Italian", "Italiano", true),
        Language::entry("ja", "Japanese", "日本語", true),
        Language::entry("kn", "Kannada", "ಕನ್ನಡ", false),
        Language::entry("ko", "Korean", "한국어", true),
        Language::entry("lv", "Latvian", "Latviešu", false),
        Language::entry("lt", "Lithuanian", "Lietuvių", false),
        Language::entry("mk", "Macedonian", "Македонски", false),
        Language::entry("ms", "Malay", "Bahasa Melayu", false),
        Language::entry("ml", "Malayalam", "മലയാളം", false),
        Language::entry("mt", "Maltese", "Malti", false),
        Language::entry("mr", "Marathi", "मराठी", false),
        Language::entry("no", "Norwegian", "Norsk", false),
        Language::entry("fa", "Persian", "فارسی", false),
        Language::entry("pl", "Polish", "Polski", false),
        Language::entry("pt", "Portuguese", "Português", false),
        Language::entry("pa", "Punjabi", "ਪੰਜਾਬੀ", false),
        Language::entry("ro", "Romanian", "Română", false),
        Language::entry("ru", "Russian", "Русский", false),
        Language::entry("sr", "Serbian", "Српски", false),
        Language::entry("sk", "Slovak", "Slovenčina", false),
        Language::entry("sl", "Slovenian", "Slovenščina", false),
        Language::entry("es", "Spanish", "Español", true),
        Language::entry("sw", "Swahili", "Kiswahili", false),
        Language::entry("sv", "Swedish", "Svenska", false),
        Language::entry("ta", "Tamil", "தமிழ்", false),
        Language::entry("te", "Telugu", "తెలుగు", false),
        Language::entry("th", "Thai", "ไทย", false),
        Language::entry("tr", "Turkish", "Türkçe", false),
        Language::entry("uk", "Ukrainian", "Українська", false),
        Language::entry("ur", "Urdu", "اردو", false),
        Language::entry("vi", "Vietnamese", "Tiếng Việt", true),
        Language::entry("cy", "Welsh", "Cymraeg", false),
    ]
}

/// Bulk-seed the table, replacing any stale rows.
pub async fn initialize(pool: &Pool<Sqlite>) -> Result<()> {
    let languages = seed_set();
    let count = languages.len();

    for language in languages {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO languages
                (code, name, native_name, supports_text, supports_voice, supports_camera)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&language.code)
        .bind(&language.name)
        .bind(&language.native_name)
        .bind(language.supports_text)
        .bind(language.supports_voice)
        .bind(language.supports_camera)
        .execute(pool)
        .await?;
    }

    info!("Seeded {} supported languages", count);
    Ok(())
}

pub async fn all_languages(pool: &Pool<Sqlite>) -> Result<Vec<Language>> {
    let languages = sqlx::query_as::<_, Language>(
        "SELECT code, name, native_name, supports_text, supports_voice, supports_camera \
         FROM languages ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(languages)
}

pub async fn language_by_code(pool: &Pool<Sqlite>, code: &str) -> Result<Option<Language>> {
    let language = sqlx::query_as::<_, Language>(
        "SELECT code, name, native_name, supports_text, supports_voice, supports_camera \
         FROM languages WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(language)
}

/// Maintenance only: empty the table.
pub async fn clear(pool: &Pool<Sqlite>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM languages").execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[tokio::test]
    async fn test_seed_and_read_back() {
        let store = Store::open_in_memory().await.unwrap();
        initialize(store.pool()).await.unwrap();

        let all = all_languages(store.pool()).await.unwrap();
        assert_eq!(all.len(), seed_set().len());

        let japanese = language_by_code(store.pool(), "ja").await.unwrap().unwrap();
        assert_eq!(japanese.name, "Japanese");
        assert!(japanese.supports_voice);
    }

    #[tokio::test]
    async fn test_reseeding_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        initialize(store.pool()).await.unwrap();
        initialize(store.pool()).await.unwrap();

        let all = all_languages(store.pool()).await.unwrap();
        assert_eq!(all.len(), seed_set().len());
    }

    #[tokio::test]
    async fn test_unknown_code_is_none() {
        let store = Store::open_in_memory().await.unwrap();
        initialize(store.pool()).await.unwrap();

        assert!(language_by_code(store.pool(), "xx").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_table() {
        let store = Store::open_in_memory().await.unwrap();
        initialize(store.pool()).await.unwrap();

        let removed = clear(store.pool()).await.unwrap();
        assert_eq!(removed as usize, seed_set().len());
        assert!(all_languages(store.pool()).await.unwrap().is_empty());
    }
}
