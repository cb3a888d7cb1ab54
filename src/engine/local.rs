use async_trait::async_trait;
use tracing::debug;
use whatlang::Lang;

use crate::error::Result;
use crate::lang::UNDETERMINED;
use super::LanguageIdEngine;

/// On-device language identification.
///
/// No network access and no model download: identification runs entirely in
/// process, so the adapter skips its connectivity pre-flight for this
/// engine. Unreliable detections are reported as the undetermined sentinel
/// rather than a low-confidence guess.
pub struct WhatlangEngine;

impl WhatlangEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WhatlangEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageIdEngine for WhatlangEngine {
    async fn identify(&self, text: &str) -> Result<String> {
        let code = match whatlang::detect(text) {
            Some(info) if info.is_reliable() => lang_to_app_code(info.lang()),
            Some(info) => {
                debug!(
                    "Unreliable detection {:?} (confidence {:.2}), reporting undetermined",
                    info.lang(),
                    info.confidence()
                );
                UNDETERMINED
            }
            None => UNDETERMINED,
        };

        Ok(code.to_string())
    }

    fn requires_network(&self) -> bool {
        false
    }
}

/// Map the identifier's ISO 639-3 language to the application's code set.
/// Languages the rest of the pipeline cannot handle come back undetermined.
fn lang_to_app_code(lang: Lang) -> &'static str {
    match lang {
        Lang::Afr => "af",
        Lang::Ara => "ar",
        Lang::Aze => "az",
        Lang::Bel => "be",
        Lang::Ben => "bn",
        Lang::Bul => "bg",
        Lang::Cat => "ca",
        Lang::Ces => "cs",
        Lang::Cmn => "zh",
        Lang::Dan => "da",
        Lang::Deu => "de",
        Lang::Ell => "el",
        Lang::Eng => "en",
        Lang::Epo => "eo",
        Lang::Est => "et",
        Lang::Fin => "fi",
        Lang::Fra => "fr",
        Lang::Guj => "gu",
        Lang::Heb => "he",
        Lang::Hin => "hi",
        Lang::Hrv => "hr",
        Lang::Hun => "hu",
        Lang::Hye => "hy",
        Lang::Ind => "id",
        Lang::Ita => "it",
        Lang::Jpn => "ja",
        Lang::Kan => "kn",
        Lang::Kat => "ka",
        Lang::Khm => "km",
        Lang::Kor => "ko",
        Lang::Lav => "lv",
        Lang::Lit => "lt",
        Lang::Mal => "ml",
        Lang::Mar => "mr",
        Lang::Mkd => "mk",
        Lang::Mya => "my",
        Lang::Nep => "ne",
        Lang::Nld => "nl",
        Lang::Nob => "no",
        Lang::Ori => "or",
        Lang::Pan => "pa",
        Lang::Pes => "fa",
        Lang::Pol => "pl",
        Lang::Por => "pt",
        Lang::Ron => "ro",
        Lang::Rus => "ru",
        Lang::Sin => "si",
        Lang::Slk => "sk",
        Lang::Slv => "sl",
        Lang::Spa => "es",
        Lang::Srp => "sr",
        Lang::Swe => "sv",
        Lang::Tam => "ta",
        Lang::Tel => "te",
        Lang::Tgl => "tl",
        Lang::Tha => "th",
        Lang::Tur => "tr",
        Lang::Ukr => "uk",
        Lang::Urd => "ur",
        Lang::Uzb => "uz",
        Lang::Vie => "vi",
        Lang::Yid => "yi",
        _ => UNDETERMINED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_identify_english() {
        let engine = WhatlangEngine::new();
        let code = engine
            .identify("The quick brown fox jumps over the lazy dog near the quiet river bank.")
            .await
            .unwrap();
        assert_eq!(code, "en");
    }

    #[tokio::test]
    async fn test_identify_symbols_is_undetermined() {
        let engine = WhatlangEngine::new();
        let code = engine.identify("1234567890 --- ###").await.unwrap();
        assert_eq!(code, UNDETERMINED);
    }

    #[test]
    fn test_no_network_required() {
        assert!(!WhatlangEngine::new().requires_network());
    }
}
