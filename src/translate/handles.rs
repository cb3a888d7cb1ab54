use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::engine::{DownloadConditions, TranslateEngine};
use crate::error::{Result, HonyakuError};
use crate::lang;

/// A ready-to-use translation direction.
///
/// Handles are created once per language pair and reused for the life of
/// the process; model-download state is tracked here so a pair is fetched
/// at most once.
pub struct TranslatorHandle {
    source: String,
    target: String,
    engine_source: &'static str,
    engine_target: &'static str,
    engine: Arc<dyn TranslateEngine>,
    model_ready: AtomicBool,
}

impl TranslatorHandle {
    fn new(source: &str, target: &str, engine: Arc<dyn TranslateEngine>) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            engine_source: lang::to_engine_code(source),
            engine_target: lang::to_engine_code(target),
            engine,
            model_ready: AtomicBool::new(false),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Make sure the pair's model is present, downloading it if needed.
    ///
    /// The first attempt is restricted to WiFi; on failure an unrestricted
    /// attempt follows. `ModelUnavailable` is raised only when both fail.
    pub async fn ensure_model(&self) -> Result<()> {
        if self.model_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        if let Ok(true) = self
            .engine
            .is_model_downloaded(self.engine_source, self.engine_target)
            .await
        {
            self.model_ready.store(true, Ordering::Release);
            return Ok(());
        }

        match self
            .engine
            .download_model(
                self.engine_source,
                self.engine_target,
                &DownloadConditions::wifi_only(),
            )
            .await
        {
            Ok(()) => {
                debug!("Model downloaded for {} -> {}", self.source, self.target);
                self.model_ready.store(true, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                warn!(
                    "WiFi-restricted model download failed for {} -> {}: {}",
                    self.source, self.target, e
                );
                match self
                    .engine
                    .download_model(
                        self.engine_source,
                        self.engine_target,
                        &DownloadConditions::any_network(),
                    )
                    .await
                {
                    Ok(()) => {
                        debug!(
                            "Model downloaded (fallback) for {} -> {}",
                            self.source, self.target
                        );
                        self.model_ready.store(true, Ordering::Release);
                        Ok(())
                    }
                    Err(fallback) => Err(HonyakuError::ModelUnavailable(format!(
                        "{} -> {}: {}",
                        self.source, self.target, fallback
                    ))),
                }
            }
        }
    }

    pub async fn translate(&self, text: &str) -> Result<String> {
        self.engine
            .translate(text, self.engine_source, self.engine_target)
            .await
    }

    fn close(&self) {
        self.model_ready.store(false, Ordering::Release);
    }
}

/// Process-lifetime cache of translator handles keyed by language pair.
///
/// The map is the only state shared across concurrent callers; holding the
/// lock across lookup-and-insert gives single-flight creation per key.
pub struct TranslatorHandles {
    engine: Arc<dyn TranslateEngine>,
    handles: Mutex<HashMap<String, Arc<TranslatorHandle>>>,
}

impl TranslatorHandles {
    pub fn new(engine: Arc<dyn TranslateEngine>) -> Self {
        Self {
            engine,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Return the pair's handle, creating it on first use.
    pub async fn get_or_create(&self, source: &str, target: &str) -> Arc<TranslatorHandle> {
        let key = format!("{}_{}", source, target);
        let mut handles = self.handles.lock().await;
        handles
            .entry(key)
            .or_insert_with(|| {
                debug!("Creating translator handle {} -> {}", source, target);
                Arc::new(TranslatorHandle::new(source, target, self.engine.clone()))
            })
            .clone()
    }

    /// Close every handle and clear downloaded-model bookkeeping.
    pub async fn release_all(&self) {
        let mut handles = self.handles.lock().await;
        for handle in handles.values() {
            handle.close();
        }
        debug!("Released {} translator handles", handles.len());
        handles.clear();
    }

    pub async fn handle_count(&self) -> usize {
        self.handles.lock().await.len()
    }
}
