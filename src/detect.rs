use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::DetectConfig;
use crate::engine::LanguageIdEngine;
use crate::error::{Result, HonyakuError};
use crate::lang::{normalize_detected_code, UNDETERMINED};
use crate::net::NetworkMonitor;

/// Wraps the language identification engine with input validation, a call
/// deadline, and a second attempt on undetermined results.
pub struct LanguageDetector {
    engine: Arc<dyn LanguageIdEngine>,
    network: Arc<dyn NetworkMonitor>,
    config: DetectConfig,
}

impl LanguageDetector {
    pub fn new(
        engine: Arc<dyn LanguageIdEngine>,
        network: Arc<dyn NetworkMonitor>,
        config: DetectConfig,
    ) -> Self {
        Self {
            engine,
            network,
            config,
        }
    }

    /// Detect the language of the text.
    ///
    /// `Ok(None)` means the engine could not decide — a legitimate outcome,
    /// not an error. Detected codes are normalized to application codes.
    pub async fn detect(&self, text: &str) -> Result<Option<String>> {
        let trimmed = text.trim();
        let length = trimmed.chars().count();
        if length < self.config.min_text_length || length > self.config.max_text_length {
            return Err(HonyakuError::InvalidInput(format!(
                "Text length {} outside {}..={}",
                length, self.config.min_text_length, self.config.max_text_length
            )));
        }

        if self.engine.requires_network() && !self.network.is_online().await {
            return Err(HonyakuError::NetworkUnavailable);
        }

        let sample = preprocess(trimmed, self.config.sample_length);

        let primary = self.identify_bounded(&sample).await?;
        if primary != UNDETERMINED {
            let code = normalize_detected_code(&primary);
            debug!("Language detected: {} (raw {})", code, primary);
            return Ok(Some(code));
        }

        // The engine gave up; punctuation and digits often drown the signal,
        // so try once more on a letters-and-digits-only variant.
        let cleaned = aggressive_clean(&sample);
        if cleaned.trim().chars().count() >= self.config.min_text_length {
            let secondary = self.identify_bounded(&cleaned).await?;
            if secondary != UNDETERMINED {
                let code = normalize_detected_code(&secondary);
                debug!("Language detected on retry: {} (raw {})", code, secondary);
                return Ok(Some(code));
            }
        }

        debug!("Language undetermined after retry");
        Ok(None)
    }

    async fn identify_bounded(&self, text: &str) -> Result<String> {
        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, self.engine.identify(text)).await {
            Ok(result) => result,
            Err(_) => Err(HonyakuError::Timeout("Language detection".to_string())),
        }
    }
}

/// Bound the sample and remove noise the engine trips on.
fn preprocess(text: &str, sample_length: usize) -> String {
    let sampled: String = text.chars().take(sample_length).collect();
    let mut out = String::with_capacity(sampled.len());
    let mut in_gap = false;
    for c in sampled.chars() {
        if c.is_control() && c != '\n' && c != '\t' {
            continue;
        }
        if c.is_whitespace() {
            if !in_gap {
                out.push(' ');
                in_gap = true;
            }
        } else {
            out.push(c);
            in_gap = false;
        }
    }
    out.trim().to_string()
}

/// Letters, digits, and single spaces only.
fn aggressive_clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_gap = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            in_gap = false;
        } else if !in_gap {
            out.push(' ');
            in_gap = true;
        }
    }
    out.trim().to_string()
}
