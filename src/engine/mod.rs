// Modular engine architecture
//
// This module defines the seams to the external ML engines through a
// factory pattern:
// - Remote: JSON client against a model server (OCR, translation, models,
//   text-to-speech, speech-to-text)
// - Local: on-device language identification
//
// To add a new engine backend:
// 1. Implement the relevant trait(s) for your backend
// 2. Add the backend to the corresponding config enum
// 3. Update EngineFactory to create your implementation

pub mod remote;
pub mod local;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{EngineConfig, LanguageIdMode};
use crate::error::Result;
use crate::recognize::ImageInput;
use crate::speech::SpeechEvent;
use tokio::sync::mpsc;

#[cfg(test)]
use mockall::automock;

/// Network conditions constraining a translation model download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadConditions {
    pub wifi_only: bool,
}

impl DownloadConditions {
    pub fn wifi_only() -> Self {
        Self { wifi_only: true }
    }

    pub fn any_network() -> Self {
        Self { wifi_only: false }
    }
}

/// Optical character recognition over an in-memory image.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in the image; returns raw, uncleaned engine output.
    async fn recognize(&self, image: &ImageInput) -> Result<String>;
}

/// Language identification over plain text.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LanguageIdEngine: Send + Sync {
    /// Identify the language of the text. Returns a BCP-47-like code, or
    /// the `"und"` sentinel when no language could be determined.
    async fn identify(&self, text: &str) -> Result<String>;

    /// Whether identification needs connectivity.
    fn requires_network(&self) -> bool;
}

/// Text translation between two engine language codes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TranslateEngine: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;

    async fn is_model_downloaded(&self, source: &str, target: &str) -> Result<bool>;

    async fn download_model(
        &self,
        source: &str,
        target: &str,
        conditions: &DownloadConditions,
    ) -> Result<()>;
}

/// Text-to-speech playback backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Locales the backend can synthesize.
    async fn supported_locales(&self) -> Result<Vec<String>>;

    /// Begin speaking; any previous utterance must already be stopped.
    async fn speak(&self, text: &str, locale: &str, rate: f32) -> Result<()>;

    /// Halt playback immediately.
    async fn stop(&self) -> Result<()>;
}

/// Speech-to-text listening backend.
///
/// `listen` is single-shot: it emits events into the channel and returns
/// after sending `FinalText` or `Error`. Dropping the future (task abort)
/// must release the underlying session.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SttBackend: Send + Sync {
    async fn listen(&self, locale: &str, events: mpsc::Sender<SpeechEvent>) -> Result<()>;

    /// Best-effort notification that the current session is abandoned.
    async fn cancel(&self) -> Result<()>;
}

/// Factory for creating engine instances from configuration.
pub struct EngineFactory;

impl EngineFactory {
    pub fn create_ocr(config: &EngineConfig) -> Arc<dyn OcrEngine> {
        Arc::new(remote::RemoteOcrEngine::new(config))
    }

    pub fn create_language_id(config: &EngineConfig) -> Arc<dyn LanguageIdEngine> {
        match config.language_id {
            LanguageIdMode::Local => Arc::new(local::WhatlangEngine::new()),
            LanguageIdMode::Remote => Arc::new(remote::RemoteLanguageIdEngine::new(config)),
        }
    }

    pub fn create_translate(config: &EngineConfig) -> Arc<dyn TranslateEngine> {
        Arc::new(remote::RemoteTranslateEngine::new(config))
    }

    pub fn create_tts(config: &EngineConfig) -> Arc<dyn TtsBackend> {
        Arc::new(remote::RemoteTtsBackend::new(config))
    }

    pub fn create_stt(config: &EngineConfig) -> Arc<dyn SttBackend> {
        Arc::new(remote::RemoteSttBackend::new(config))
    }
}
