use std::time::Duration;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{Result, HonyakuError};
use crate::recognize::ImageInput;
use crate::speech::{SpeechErrorCode, SpeechEvent};
use super::{DownloadConditions, LanguageIdEngine, OcrEngine, SttBackend, TranslateEngine, TtsBackend};

// Adapters impose the per-operation deadlines; this is only a hard upper
// bound against wedged connections.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(300);

fn build_client() -> Client {
    Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .build()
        .expect("HTTP client creation should not fail")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrRequest {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub orientation: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub source: String,
    pub target: String,
    pub wifi_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatusResponse {
    pub downloaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    pub locale: String,
    pub rate: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub locales: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenRequest {
    pub locale: String,
}

/// One line of the NDJSON speech-to-text event feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenWireEvent {
    pub event: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub level: Option<f32>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ListenWireEvent {
    fn into_speech_event(self) -> Option<SpeechEvent> {
        match self.event.as_str() {
            "ready" => Some(SpeechEvent::Ready),
            "listening" => Some(SpeechEvent::ListeningStarted),
            "volume" => self.level.map(SpeechEvent::VolumeLevel),
            "partial" => self.text.filter(|t| !t.trim().is_empty()).map(SpeechEvent::PartialText),
            "final" => self.text.map(SpeechEvent::FinalText),
            "error" => Some(SpeechEvent::Error(
                self.code
                    .as_deref()
                    .map(SpeechErrorCode::from_wire)
                    .unwrap_or(SpeechErrorCode::Client),
            )),
            other => {
                debug!("Ignoring unknown speech event '{}'", other);
                None
            }
        }
    }
}

/// OCR over the model server.
pub struct RemoteOcrEngine {
    client: Client,
    endpoint: String,
}

impl RemoteOcrEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: build_client(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl OcrEngine for RemoteOcrEngine {
    async fn recognize(&self, image: &ImageInput) -> Result<String> {
        let request = OcrRequest {
            image: BASE64.encode(image.data()),
            width: image.width(),
            height: image.height(),
            orientation: image.orientation(),
        };

        let url = format!("{}/api/ocr", self.endpoint);
        debug!("Sending recognition request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Recognition request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(HonyakuError::Recognition(format!(
                "Engine error {}: {}", status, error_text
            )));
        }

        let parsed: OcrResponse = response.json().await
            .map_err(|e| HonyakuError::Recognition(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.text)
    }
}

/// Language identification over the model server.
pub struct RemoteLanguageIdEngine {
    client: Client,
    endpoint: String,
}

impl RemoteLanguageIdEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: build_client(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl LanguageIdEngine for RemoteLanguageIdEngine {
    async fn identify(&self, text: &str) -> Result<String> {
        let request = IdentifyRequest { text: text.to_string() };
        let url = format!("{}/api/identify", self.endpoint);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Identification request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HonyakuError::Operation(format!(
                "Identification engine error {}", response.status()
            )));
        }

        let parsed: IdentifyResponse = response.json().await
            .map_err(|e| HonyakuError::Operation(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.language)
    }

    fn requires_network(&self) -> bool {
        true
    }
}

/// Translation over the model server.
pub struct RemoteTranslateEngine {
    client: Client,
    endpoint: String,
}

impl RemoteTranslateEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: build_client(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl TranslateEngine for RemoteTranslateEngine {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let request = TranslateRequest {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };

        let url = format!("{}/api/translate", self.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Translation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            if error_text.contains("unsupported") {
                return Err(HonyakuError::UnsupportedLanguagePair(
                    source.to_string(),
                    target.to_string(),
                ));
            }
            return Err(HonyakuError::Translation(format!(
                "Engine error {}: {}", status, error_text
            )));
        }

        let parsed: TranslateResponse = response.json().await
            .map_err(|e| HonyakuError::Translation(format!("Failed to parse response: {}", e)))?;

        let translated = parsed.text.trim().to_string();
        if translated.is_empty() {
            return Err(HonyakuError::Translation("Empty translation received".to_string()));
        }

        Ok(translated)
    }

    async fn is_model_downloaded(&self, source: &str, target: &str) -> Result<bool> {
        let url = format!(
            "{}/api/models/status?source={}&target={}",
            self.endpoint, source, target
        );

        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Model status request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HonyakuError::Operation(format!(
                "Model status error {}", response.status()
            )));
        }

        let parsed: ModelStatusResponse = response.json().await
            .map_err(|e| HonyakuError::Operation(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.downloaded)
    }

    async fn download_model(
        &self,
        source: &str,
        target: &str,
        conditions: &DownloadConditions,
    ) -> Result<()> {
        let request = ModelRequest {
            source: source.to_string(),
            target: target.to_string(),
            wifi_only: conditions.wifi_only,
        };

        let url = format!("{}/api/models/download", self.endpoint);
        debug!(
            "Requesting model download {} -> {} (wifi_only: {})",
            source, target, conditions.wifi_only
        );

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Model download request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(HonyakuError::ModelUnavailable(format!(
                "Download failed with {}: {}", status, error_text
            )));
        }

        Ok(())
    }
}

/// Text-to-speech playback via the model server.
pub struct RemoteTtsBackend {
    client: Client,
    endpoint: String,
}

impl RemoteTtsBackend {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: build_client(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl TtsBackend for RemoteTtsBackend {
    async fn supported_locales(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tts/voices", self.endpoint);

        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Voice list request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HonyakuError::Speech(format!(
                "Voice list error {}", response.status()
            )));
        }

        let parsed: VoicesResponse = response.json().await
            .map_err(|e| HonyakuError::Speech(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.locales)
    }

    async fn speak(&self, text: &str, locale: &str, rate: f32) -> Result<()> {
        let request = SpeakRequest {
            text: text.to_string(),
            locale: locale.to_string(),
            rate,
        };

        let url = format!("{}/api/tts/speak", self.endpoint);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Speak request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HonyakuError::Speech(format!(
                "Speak request error {}", response.status()
            )));
        }

        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let url = format!("{}/api/tts/stop", self.endpoint);

        let response = self.client
            .post(&url)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Stop request failed: {}", e)))?;

        if !response.status().is_success() {
            warn!("TTS stop returned {}", response.status());
        }

        Ok(())
    }
}

/// Speech-to-text via the model server's NDJSON event feed.
///
/// The session lives exactly as long as the response body: dropping the
/// `listen` future closes the connection, which releases the microphone
/// session on the server side.
pub struct RemoteSttBackend {
    client: Client,
    endpoint: String,
}

impl RemoteSttBackend {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: build_client(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl SttBackend for RemoteSttBackend {
    async fn listen(&self, locale: &str, events: mpsc::Sender<SpeechEvent>) -> Result<()> {
        let request = ListenRequest { locale: locale.to_string() };
        let url = format!("{}/api/stt/listen", self.endpoint);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HonyakuError::Network(format!("Listen request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HonyakuError::Speech(format!(
                "Listen request error {}", response.status()
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| HonyakuError::Network(format!("Event stream error: {}", e)))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);

                if line.is_empty() {
                    continue;
                }

                let wire: ListenWireEvent = match serde_json::from_str(&line) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Skipping malformed speech event: {}", e);
                        continue;
                    }
                };

                if let Some(event) = wire.into_speech_event() {
                    let terminal = matches!(
                        event,
                        SpeechEvent::FinalText(_) | SpeechEvent::Error(_)
                    );
                    if events.send(event).await.is_err() {
                        // Consumer dropped the stream
                        return Ok(());
                    }
                    if terminal {
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        let url = format!("{}/api/stt/cancel", self.endpoint);

        if let Err(e) = self.client.post(&url).send().await {
            debug!("Listen cancel notification failed: {}", e);
        }

        Ok(())
    }
}
