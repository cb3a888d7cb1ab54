// Translation layered over the engine seam:
// - handles: per-pair translator handles with model-download bookkeeping
// - chunk: boundary-preferring splitter for long inputs
// - TranslatorAdapter: validation, connectivity pre-flight, chunked
//   translation under per-chunk deadlines, error classification

pub mod chunk;
pub mod handles;

pub use handles::{TranslatorHandle, TranslatorHandles};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::engine::TranslateEngine;
use crate::error::{Result, HonyakuError};
use crate::net::NetworkMonitor;

/// Substrings rejected outright to keep pasted markup out of the engine.
const SUSPICIOUS_PATTERNS: &[&str] = &["<script", "javascript:", "data:", "vbscript:"];

/// Wraps the translation engine with validation, the handle cache, model
/// downloads, and long-text chunking.
pub struct TranslatorAdapter {
    handles: TranslatorHandles,
    network: Arc<dyn NetworkMonitor>,
    config: TranslateConfig,
}

impl TranslatorAdapter {
    pub fn new(
        engine: Arc<dyn TranslateEngine>,
        network: Arc<dyn NetworkMonitor>,
        config: TranslateConfig,
    ) -> Self {
        Self {
            handles: TranslatorHandles::new(engine),
            network,
            config,
        }
    }

    /// Translate `text` between two application language codes.
    ///
    /// Identical source and target return the input unchanged without
    /// touching the network or the handle cache.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let trimmed = text.trim();
        self.validate_input(trimmed)?;

        if source == target {
            debug!("Source and target are both '{}', returning input unchanged", source);
            return Ok(text.to_string());
        }

        if !self.network.is_online().await {
            return Err(HonyakuError::NetworkUnavailable);
        }

        let handle = self.handles.get_or_create(source, target).await;
        handle.ensure_model().await?;

        let length = trimmed.chars().count();
        if length > self.config.chunk_threshold {
            let pieces = chunk::chunk_text(trimmed, self.config.chunk_threshold);
            info!(
                "Translating {} chars in {} chunks ({} -> {})",
                length,
                pieces.len(),
                source,
                target
            );

            let mut translated = Vec::with_capacity(pieces.len());
            for piece in &pieces {
                translated.push(self.translate_bounded(&handle, piece).await?);
            }
            Ok(translated.join(" "))
        } else {
            self.translate_bounded(&handle, trimmed).await
        }
    }

    /// Close all cached handles and forget model bookkeeping.
    pub async fn release(&self) {
        self.handles.release_all().await;
    }

    pub async fn cached_pair_count(&self) -> usize {
        self.handles.handle_count().await
    }

    fn validate_input(&self, trimmed: &str) -> Result<()> {
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

        let lowered = trimmed.to_lowercase();
        if SUSPICIOUS_PATTERNS.iter().any(|p| lowered.contains(p)) {
            return Err(HonyakuError::InvalidInput(
                "Text contains disallowed content".to_string(),
            ));
        }

        Ok(())
    }

    async fn translate_bounded(&self, handle: &TranslatorHandle, text: &str) -> Result<String> {
        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, handle.translate(text)).await {
            Ok(Ok(translated)) => Ok(translated),
            Ok(Err(e)) => Err(classify_translation_error(e)),
            Err(_) => Err(HonyakuError::Timeout("Translation".to_string())),
        }
    }
}

/// Keep taxonomy errors as they are; everything else becomes a generic
/// translation failure so no raw engine error crosses the adapter boundary.
fn classify_translation_error(error: HonyakuError) -> HonyakuError {
    match error {
        HonyakuError::NetworkUnavailable
        | HonyakuError::Network(_)
        | HonyakuError::Timeout(_)
        | HonyakuError::ModelUnavailable(_)
        | HonyakuError::UnsupportedLanguagePair(_, _)
        | HonyakuError::Translation(_) => error,
        HonyakuError::Http(e) => HonyakuError::Network(e.to_string()),
        other => HonyakuError::Translation(other.to_string()),
    }
}
