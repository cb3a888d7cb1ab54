//! Mapping between application language codes and the translation engine's
//! identifier set.
//!
//! The application speaks BCP-47-like codes (the `languages` table keys);
//! the engine supports a fixed enumeration of base codes. Mapping is total:
//! unknown input falls back to English rather than failing.

use tracing::warn;

/// Engine identifier used when an application code has no engine mapping.
pub const DEFAULT_ENGINE_CODE: &str = "en";

/// Language identification sentinel meaning "no language could be determined".
pub const UNDETERMINED: &str = "und";

/// Base language codes the translation engine accepts.
pub const ENGINE_LANGUAGES: &[&str] = &[
    "af", "ar", "be", "bg", "bn", "ca", "cs", "cy", "da", "de", "el", "en", "eo", "es", "et",
    "fa", "fi", "fr", "ga", "gl", "gu", "he", "hi", "hr", "ht", "hu", "id", "is", "it", "ja",
    "ka", "kn", "ko", "lt", "lv", "mk", "mr", "ms", "mt", "nl", "no", "pl", "pt", "ro", "ru",
    "sk", "sl", "sq", "sr", "sv", "sw", "ta", "te", "th", "tl", "tr", "uk", "ur", "vi", "zh",
];

/// Map an application language code to the engine's identifier.
///
/// Total over all inputs: regional Chinese variants collapse to the engine's
/// single `zh` model, anything the engine does not know falls back to
/// English with a warning.
pub fn to_engine_code(app_code: &str) -> &'static str {
    match app_code {
        "zh" | "zh-CN" | "zh-TW" => "zh",
        other => match ENGINE_LANGUAGES.iter().copied().find(|&code| code == other) {
            Some(code) => code,
            None => {
                warn!(
                    "No engine mapping for language '{}', falling back to '{}'",
                    other, DEFAULT_ENGINE_CODE
                );
                DEFAULT_ENGINE_CODE
            }
        },
    }
}

/// Collapse an engine-reported detection code to an application code.
///
/// Script variants map to the two Chinese application codes, legacy ISO
/// aliases are modernized, and regional suffixes are dropped everywhere
/// else. The undetermined sentinel passes through unchanged.
pub fn normalize_detected_code(detected: &str) -> String {
    match detected {
        UNDETERMINED => UNDETERMINED.to_string(),
        "zh-Hans" | "zh-hans" | "zh-CN" => "zh-CN".to_string(),
        "zh-Hant" | "zh-hant" | "zh-TW" => "zh-TW".to_string(),
        // Legacy codes still emitted by some identification engines
        "iw" => "he".to_string(),
        "in" => "id".to_string(),
        "ji" => "yi".to_string(),
        other => other
            .split('-')
            .next()
            .unwrap_or(other)
            .to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_code_passthrough() {
        assert_eq!(to_engine_code("ja"), "ja");
        assert_eq!(to_engine_code("vi"), "vi");
    }

    #[test]
    fn test_engine_code_chinese_variants_collapse() {
        assert_eq!(to_engine_code("zh-CN"), "zh");
        assert_eq!(to_engine_code("zh-TW"), "zh");
        assert_eq!(to_engine_code("zh"), "zh");
    }

    #[test]
    fn test_engine_code_unknown_falls_back_to_english() {
        assert_eq!(to_engine_code("xx"), "en");
        assert_eq!(to_engine_code(""), "en");
    }

    #[test]
    fn test_normalize_regional_variants() {
        assert_eq!(normalize_detected_code("en-US"), "en");
        assert_eq!(normalize_detected_code("en-GB"), "en");
        assert_eq!(normalize_detected_code("pt-BR"), "pt");
    }

    #[test]
    fn test_normalize_chinese_scripts() {
        assert_eq!(normalize_detected_code("zh-Hans"), "zh-CN");
        assert_eq!(normalize_detected_code("zh-Hant"), "zh-TW");
        assert_eq!(normalize_detected_code("zh-TW"), "zh-TW");
    }

    #[test]
    fn test_normalize_legacy_aliases() {
        assert_eq!(normalize_detected_code("iw"), "he");
        assert_eq!(normalize_detected_code("in"), "id");
    }

    #[test]
    fn test_normalize_undetermined_passthrough() {
        assert_eq!(normalize_detected_code("und"), "und");
    }
}
