use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::config::SpeechConfig;
use crate::engine::{SttBackend, TtsBackend};
use crate::error::{Result, HonyakuError};

// Named speech rates
pub const RATE_VERY_SLOW: f32 = 0.5;
pub const RATE_SLOW: f32 = 0.75;
pub const RATE_NORMAL: f32 = 1.0;
pub const RATE_FAST: f32 = 1.25;
pub const RATE_VERY_FAST: f32 = 1.5;

/// One step of a speech-to-text session.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Ready,
    ListeningStarted,
    VolumeLevel(f32),
    PartialText(String),
    FinalText(String),
    Error(SpeechErrorCode),
}

/// Platform-style recognition error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechErrorCode {
    Audio,
    Client,
    InsufficientPermissions,
    Network,
    NetworkTimeout,
    NoMatch,
    RecognizerBusy,
    Server,
    SpeechTimeout,
}

impl SpeechErrorCode {
    pub fn from_wire(code: &str) -> Self {
        match code {
            "audio" => Self::Audio,
            "client" => Self::Client,
            "permissions" => Self::InsufficientPermissions,
            "network" => Self::Network,
            "network_timeout" => Self::NetworkTimeout,
            "no_match" => Self::NoMatch,
            "busy" => Self::RecognizerBusy,
            "server" => Self::Server,
            "speech_timeout" => Self::SpeechTimeout,
            _ => Self::Client,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Audio => "Audio recording error",
            Self::Client => "Client side error",
            Self::InsufficientPermissions => "Insufficient permissions",
            Self::Network => "Network error",
            Self::NetworkTimeout => "Network timeout",
            Self::NoMatch => "No recognition result matched",
            Self::RecognizerBusy => "Recognition service busy",
            Self::Server => "Server sent an error status",
            Self::SpeechTimeout => "No speech input",
        }
    }
}

/// Text-to-speech playback with queue-flush preemption: a new utterance
/// always stops the previous one first.
pub struct SpeechSynthesizer {
    backend: Arc<dyn TtsBackend>,
    config: SpeechConfig,
}

impl SpeechSynthesizer {
    pub fn new(backend: Arc<dyn TtsBackend>, config: SpeechConfig) -> Self {
        Self { backend, config }
    }

    pub async fn speak(&self, text: &str, language_code: &str, rate: f32) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(HonyakuError::InvalidInput("Text is blank".to_string()));
        }
        let length = trimmed.chars().count();
        if length > self.config.max_text_length {
            return Err(HonyakuError::InvalidInput(format!(
                "Text length {} exceeds {}",
                length, self.config.max_text_length
            )));
        }

        let rate = rate.clamp(0.1, 3.0);
        let locale = self.resolve_locale(language_code).await;

        // Queue-flush semantics
        if let Err(e) = self.backend.stop().await {
            warn!("Failed to stop previous utterance: {}", e);
        }

        self.backend
            .speak(trimmed, &locale, rate)
            .await
            .map_err(|e| match e {
                HonyakuError::Speech(_)
                | HonyakuError::Network(_)
                | HonyakuError::NetworkUnavailable => e,
                other => HonyakuError::Speech(other.to_string()),
            })
    }

    pub async fn stop(&self) -> Result<()> {
        self.backend.stop().await
    }

    async fn resolve_locale(&self, language_code: &str) -> String {
        match self.backend.supported_locales().await {
            Ok(locales) => {
                if let Some(exact) = locales.iter().find(|l| l.as_str() == language_code) {
                    return exact.clone();
                }
                if let Some(prefix) = locales
                    .iter()
                    .find(|l| l.starts_with(language_code) || language_code.starts_with(l.as_str()))
                {
                    return prefix.clone();
                }
                warn!(
                    "Locale '{}' not supported, using '{}'",
                    language_code, self.config.fallback_locale
                );
                self.config.fallback_locale.clone()
            }
            Err(e) => {
                warn!("Could not list voices ({}), using requested locale", e);
                language_code.to_string()
            }
        }
    }
}

/// A live speech-to-text session.
///
/// Single-shot: the stream ends after `FinalText` or `Error`. Dropping it
/// aborts the backend task, which releases the underlying session.
pub struct ListenStream {
    events: mpsc::Receiver<SpeechEvent>,
    abort: AbortHandle,
}

impl ListenStream {
    pub async fn next_event(&mut self) -> Option<SpeechEvent> {
        self.events.recv().await
    }
}

impl Drop for ListenStream {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Speech-to-text sessions over the backend seam. At most one session is
/// active; starting a new one stops its predecessor first.
pub struct SpeechRecognizer {
    backend: Arc<dyn SttBackend>,
    active: Mutex<Option<AbortHandle>>,
}

impl SpeechRecognizer {
    pub fn new(backend: Arc<dyn SttBackend>) -> Self {
        Self {
            backend,
            active: Mutex::new(None),
        }
    }

    pub async fn start_listening(&self, language_code: &str) -> Result<ListenStream> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            debug!("Stopping previous listen session");
            previous.abort();
            if let Err(e) = self.backend.cancel().await {
                warn!("Failed to cancel previous listen session: {}", e);
            }
        }

        let (tx, rx) = mpsc::channel(32);
        let backend = self.backend.clone();
        let locale = language_code.to_string();

        let handle = tokio::spawn(async move {
            if let Err(e) = backend.listen(&locale, tx.clone()).await {
                warn!("Listen session failed: {}", e);
                let code = match e {
                    HonyakuError::Network(_) | HonyakuError::NetworkUnavailable => {
                        SpeechErrorCode::Network
                    }
                    HonyakuError::Timeout(_) => SpeechErrorCode::NetworkTimeout,
                    _ => SpeechErrorCode::Client,
                };
                let _ = tx.send(SpeechEvent::Error(code)).await;
            }
        });

        let abort = handle.abort_handle();
        *active = Some(handle.abort_handle());

        Ok(ListenStream { events: rx, abort })
    }

    /// Stop the active session, if any.
    pub async fn stop(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.abort();
            self.backend.cancel().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::Sequence;
    use std::sync::atomic::{AtomicBool, Ordering};
    use crate::engine::MockTtsBackend;

    fn config() -> SpeechConfig {
        SpeechConfig {
            max_text_length: 4000,
            fallback_locale: "en-US".to_string(),
            default_rate: 1.0,
        }
    }

    #[tokio::test]
    async fn test_blank_text_rejected_without_backend_call() {
        let mut backend = MockTtsBackend::new();
        backend.expect_speak().times(0);
        backend.expect_stop().times(0);

        let synthesizer = SpeechSynthesizer::new(Arc::new(backend), config());
        let err = synthesizer.speak("   ", "en-US", 1.0).await.unwrap_err();
        assert!(matches!(err, HonyakuError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_over_long_text_rejected() {
        let mut backend = MockTtsBackend::new();
        backend.expect_speak().times(0);

        let synthesizer = SpeechSynthesizer::new(Arc::new(backend), config());
        let err = synthesizer
            .speak(&"a".repeat(4001), "en-US", 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, HonyakuError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_stop_precedes_speak() {
        let mut backend = MockTtsBackend::new();
        let mut seq = Sequence::new();
        backend
            .expect_supported_locales()
            .returning(|| Ok(vec!["en-US".to_string()]));
        backend
            .expect_stop()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        backend
            .expect_speak()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let synthesizer = SpeechSynthesizer::new(Arc::new(backend), config());
        synthesizer.speak("Hello", "en-US", 1.0).await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_locale_falls_back() {
        let mut backend = MockTtsBackend::new();
        backend
            .expect_supported_locales()
            .returning(|| Ok(vec!["en-US".to_string(), "vi-VN".to_string()]));
        backend.expect_stop().returning(|| Ok(()));
        backend
            .expect_speak()
            .withf(|_, locale, _| locale == "en-US")
            .returning(|_, _, _| Ok(()));

        let synthesizer = SpeechSynthesizer::new(Arc::new(backend), config());
        synthesizer.speak("Hello", "xx-XX", 1.0).await.unwrap();
    }

    #[tokio::test]
    async fn test_locale_prefix_match() {
        let mut backend = MockTtsBackend::new();
        backend
            .expect_supported_locales()
            .returning(|| Ok(vec!["en-US".to_string(), "vi-VN".to_string()]));
        backend.expect_stop().returning(|| Ok(()));
        backend
            .expect_speak()
            .withf(|_, locale, _| locale == "vi-VN")
            .returning(|_, _, _| Ok(()));

        let synthesizer = SpeechSynthesizer::new(Arc::new(backend), config());
        synthesizer.speak("Xin chào", "vi", 1.0).await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_is_clamped() {
        let mut backend = MockTtsBackend::new();
        backend
            .expect_supported_locales()
            .returning(|| Ok(vec!["en-US".to_string()]));
        backend.expect_stop().returning(|| Ok(()));
        backend
            .expect_speak()
            .withf(|_, _, rate| (0.1..=3.0).contains(rate))
            .returning(|_, _, _| Ok(()));

        let synthesizer = SpeechSynthesizer::new(Arc::new(backend), config());
        synthesizer.speak("Hello", "en-US", 9.9).await.unwrap();
    }

    /// Backend that replays a fixed script and records cancellation.
    struct ScriptedBackend {
        script: Vec<SpeechEvent>,
        cancelled: Arc<AtomicBool>,
        hang_after_script: bool,
    }

    #[async_trait]
    impl SttBackend for ScriptedBackend {
        async fn listen(&self, _locale: &str, events: mpsc::Sender<SpeechEvent>) -> Result<()> {
            for event in &self.script {
                if events.send(event.clone()).await.is_err() {
                    return Ok(());
                }
            }
            if self.hang_after_script {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
            Ok(())
        }

        async fn cancel(&self) -> Result<()> {
            self.cancelled.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stream_closes_after_final_text() {
        let backend = ScriptedBackend {
            script: vec![
                SpeechEvent::Ready,
                SpeechEvent::ListeningStarted,
                SpeechEvent::PartialText("hel".to_string()),
                SpeechEvent::FinalText("hello".to_string()),
            ],
            cancelled: Arc::new(AtomicBool::new(false)),
            hang_after_script: false,
        };

        let recognizer = SpeechRecognizer::new(Arc::new(backend));
        let mut stream = recognizer.start_listening("en-US").await.unwrap();

        assert_eq!(stream.next_event().await, Some(SpeechEvent::Ready));
        assert_eq!(stream.next_event().await, Some(SpeechEvent::ListeningStarted));
        assert_eq!(
            stream.next_event().await,
            Some(SpeechEvent::PartialText("hel".to_string()))
        );
        assert_eq!(
            stream.next_event().await,
            Some(SpeechEvent::FinalText("hello".to_string()))
        );
        assert_eq!(stream.next_event().await, None);
    }

    #[tokio::test]
    async fn test_error_event_closes_stream() {
        let backend = ScriptedBackend {
            script: vec![SpeechEvent::Error(SpeechErrorCode::NoMatch)],
            cancelled: Arc::new(AtomicBool::new(false)),
            hang_after_script: false,
        };

        let recognizer = SpeechRecognizer::new(Arc::new(backend));
        let mut stream = recognizer.start_listening("en-US").await.unwrap();

        assert_eq!(
            stream.next_event().await,
            Some(SpeechEvent::Error(SpeechErrorCode::NoMatch))
        );
        assert_eq!(stream.next_event().await, None);
    }

    #[tokio::test]
    async fn test_new_session_cancels_previous() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let backend = ScriptedBackend {
            script: vec![SpeechEvent::Ready],
            cancelled: cancelled.clone(),
            hang_after_script: true,
        };

        let recognizer = SpeechRecognizer::new(Arc::new(backend));
        let _first = recognizer.start_listening("en-US").await.unwrap();
        let _second = recognizer.start_listening("vi-VN").await.unwrap();

        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stop_cancels_active_session() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let backend = ScriptedBackend {
            script: vec![SpeechEvent::Ready],
            cancelled: cancelled.clone(),
            hang_after_script: true,
        };

        let recognizer = SpeechRecognizer::new(Arc::new(backend));
        let _stream = recognizer.start_listening("en-US").await.unwrap();
        recognizer.stop().await.unwrap();

        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_backend_failure_yields_error_event() {
        struct FailingBackend;

        #[async_trait]
        impl SttBackend for FailingBackend {
            async fn listen(&self, _locale: &str, _events: mpsc::Sender<SpeechEvent>) -> Result<()> {
                Err(HonyakuError::Network("connection refused".to_string()))
            }

            async fn cancel(&self) -> Result<()> {
                Ok(())
            }
        }

        let recognizer = SpeechRecognizer::new(Arc::new(FailingBackend));
        let mut stream = recognizer.start_listening("en-US").await.unwrap();

        assert_eq!(
            stream.next_event().await,
            Some(SpeechEvent::Error(SpeechErrorCode::Network))
        );
        assert_eq!(stream.next_event().await, None);
    }
}
