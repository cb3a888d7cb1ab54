use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::detect::LanguageDetector;
use crate::error::{Result, ErrorKind, HonyakuError};
use crate::recognize::{ImageInput, TextRecognizer};
use crate::store::{languages, Store};
use crate::summarize::{Summarizer, SummaryStyle};
use crate::translate::TranslatorAdapter;

/// Where an invocation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Recognizing,
    DetectingLanguage,
    Translating,
    Summarizing,
    Done,
    Failed,
}

/// Caller-specified source language, or automatic detection.
#[derive(Debug, Clone)]
pub enum SourceLanguage {
    Auto,
    Code(String),
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub image: ImageInput,
    pub source: SourceLanguage,
    pub target: String,
}

/// A stage failure with both a machine-readable kind and a displayable
/// message.
#[derive(Debug, Clone)]
pub struct StageFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl StageFailure {
    fn from_error(error: &HonyakuError) -> Self {
        Self {
            kind: error.kind(),
            message: error.user_message(),
        }
    }
}

/// Everything one invocation produced. Partial results survive later-stage
/// failures: a translation error still leaves the recognized text and the
/// detected language populated.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub invocation: Uuid,
    pub detected_text: Option<String>,
    pub detected_language: Option<String>,
    pub detected_language_name: Option<String>,
    pub translated_text: Option<String>,
    pub summary: Option<String>,
    pub error: Option<StageFailure>,
}

impl PipelineResult {
    fn new(invocation: Uuid) -> Self {
        Self {
            invocation,
            detected_text: None,
            detected_language: None,
            detected_language_name: None,
            translated_text: None,
            summary: None,
            error: None,
        }
    }
}

struct PipelineInner {
    recognizer: Arc<TextRecognizer>,
    detector: Arc<LanguageDetector>,
    translator: Arc<TranslatorAdapter>,
    summarizer: Arc<Summarizer>,
    store: Arc<Store>,
    config: PipelineConfig,
    stage_tx: watch::Sender<PipelineStage>,
}

impl PipelineInner {
    fn set_stage(&self, stage: PipelineStage) {
        let _ = self.stage_tx.send(stage);
    }

    async fn run(&self, request: PipelineRequest) -> Result<PipelineResult> {
        let invocation = Uuid::new_v4();
        let mut result = PipelineResult::new(invocation);
        info!("Pipeline invocation {} started", invocation);

        self.set_stage(PipelineStage::Recognizing);
        let text = match self.recognizer.recognize(&request.image).await {
            Ok(text) => text,
            Err(e) => {
                if matches!(e, HonyakuError::NoTextFound) {
                    debug!("Invocation {}: no text in image", invocation);
                } else {
                    warn!("Invocation {}: recognition failed: {}", invocation, e);
                }
                result.error = Some(StageFailure::from_error(&e));
                self.set_stage(PipelineStage::Failed);
                return Ok(result);
            }
        };
        result.detected_text = Some(text.clone());

        let source = match &request.source {
            SourceLanguage::Code(code) => code.clone(),
            SourceLanguage::Auto => {
                self.set_stage(PipelineStage::DetectingLanguage);
                match self.detector.detect(&text).await {
                    Ok(Some(code)) => {
                        result.detected_language_name = self.language_name(&code).await;
                        result.detected_language = Some(code.clone());
                        info!("Invocation {}: detected language {}", invocation, code);
                        code
                    }
                    Ok(None) => {
                        let fallback = self.config.fallback_source_language.clone();
                        warn!(
                            "Invocation {}: language undetermined, assuming {}",
                            invocation, fallback
                        );
                        self.record_fallback(&mut result, &fallback).await;
                        fallback
                    }
                    Err(e) => {
                        // Detection is best-effort side information; the
                        // pipeline continues with the fallback source.
                        let fallback = self.config.fallback_source_language.clone();
                        warn!(
                            "Invocation {}: language detection failed ({}), assuming {}",
                            invocation, e, fallback
                        );
                        self.record_fallback(&mut result, &fallback).await;
                        fallback
                    }
                }
            }
        };

        if source == request.target {
            debug!(
                "Invocation {}: source and target are both '{}', skipping translation",
                invocation, source
            );
            result.translated_text = Some(text);
            self.set_stage(PipelineStage::Done);
            return Ok(result);
        }

        self.set_stage(PipelineStage::Translating);
        match self.translator.translate(&text, &source, &request.target).await {
            Ok(translated) => {
                info!(
                    "Invocation {}: translated {} -> {} ({} chars)",
                    invocation,
                    source,
                    request.target,
                    translated.chars().count()
                );
                result.translated_text = Some(translated);
                self.set_stage(PipelineStage::Done);
            }
            Err(e) => {
                warn!("Invocation {}: translation failed: {}", invocation, e);
                result.error = Some(StageFailure::from_error(&e));
                self.set_stage(PipelineStage::Failed);
            }
        }

        Ok(result)
    }

    async fn record_fallback(&self, result: &mut PipelineResult, fallback: &str) {
        result.detected_language = Some(fallback.to_string());
        result.detected_language_name = self
            .language_name(fallback)
            .await
            .map(|name| format!("{} (default)", name));
    }

    async fn language_name(&self, code: &str) -> Option<String> {
        languages::language_by_code(self.store.pool(), code)
            .await
            .ok()
            .flatten()
            .map(|language| language.name)
    }
}

/// Sequences recognize -> detect -> translate, with summarization as a
/// separately triggered step. At most one invocation is in flight per
/// pipeline; a new one aborts its predecessor before starting.
pub struct Pipeline {
    inner: Arc<PipelineInner>,
    active: Mutex<Option<AbortHandle>>,
    summarize_active: Mutex<Option<AbortHandle>>,
    stage_rx: watch::Receiver<PipelineStage>,
}

impl Pipeline {
    pub fn new(
        recognizer: Arc<TextRecognizer>,
        detector: Arc<LanguageDetector>,
        translator: Arc<TranslatorAdapter>,
        summarizer: Arc<Summarizer>,
        store: Arc<Store>,
        config: PipelineConfig,
    ) -> Self {
        let (stage_tx, stage_rx) = watch::channel(PipelineStage::Idle);
        Self {
            inner: Arc::new(PipelineInner {
                recognizer,
                detector,
                translator,
                summarizer,
                store,
                config,
                stage_tx,
            }),
            active: Mutex::new(None),
            summarize_active: Mutex::new(None),
            stage_rx,
        }
    }

    /// Observe stage transitions of the active invocation.
    pub fn stage(&self) -> watch::Receiver<PipelineStage> {
        self.stage_rx.clone()
    }

    /// Run the full pipeline over one image.
    ///
    /// A call made while another is in flight aborts the older one: its
    /// caller gets `Operation` and its partial output is discarded
    /// (last-write-wins per display surface).
    pub async fn process(&self, request: PipelineRequest) -> Result<PipelineResult> {
        let task = {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                debug!("Cancelling in-flight pipeline invocation");
                previous.abort();
            }
            let inner = self.inner.clone();
            let task = tokio::spawn(async move { inner.run(request).await });
            *active = Some(task.abort_handle());
            task
        };

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(HonyakuError::Operation(
                "Superseded by a newer request".to_string(),
            )),
            Err(e) => Err(HonyakuError::Operation(format!("Pipeline task failed: {}", e))),
        }
    }

    /// Summarize previously recognized text. Runs independently of the
    /// main invocation slot and never disturbs a delivered translation.
    pub async fn summarize(
        &self,
        text: &str,
        style: SummaryStyle,
        target_language: &str,
    ) -> Result<String> {
        let task = {
            let mut active = self.summarize_active.lock().await;
            if let Some(previous) = active.take() {
                debug!("Cancelling in-flight summarization");
                previous.abort();
            }
            let inner = self.inner.clone();
            let text = text.to_string();
            let target = target_language.to_string();
            let task = tokio::spawn(async move {
                inner.set_stage(PipelineStage::Summarizing);
                let summary = inner.summarizer.summarize(&text, style, &target).await;
                inner.set_stage(match summary {
                    Ok(_) => PipelineStage::Done,
                    Err(_) => PipelineStage::Failed,
                });
                summary
            });
            *active = Some(task.abort_handle());
            task
        };

        match task.await {
            Ok(summary) => summary,
            Err(e) if e.is_cancelled() => Err(HonyakuError::Operation(
                "Superseded by a newer request".to_string(),
            )),
            Err(e) => Err(HonyakuError::Operation(format!(
                "Summarization task failed: {}", e
            ))),
        }
    }

    /// Abort anything in flight and release cached translator handles.
    pub async fn shutdown(&self) {
        if let Some(active) = self.active.lock().await.take() {
            active.abort();
        }
        if let Some(active) = self.summarize_active.lock().await.take() {
            active.abort();
        }
        self.inner.translator.release().await;
        self.inner.set_stage(PipelineStage::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::config::{
        DetectConfig, RecognizeConfig, SummarizeConfig, TranslateConfig,
    };
    use crate::engine::{
        MockLanguageIdEngine, MockOcrEngine, MockTranslateEngine, OcrEngine,
    };
    use crate::net::MockNetworkMonitor;

    fn pipeline_config() -> PipelineConfig {
        PipelineConfig {
            fallback_source_language: "en".to_string(),
            default_target_language: "vi".to_string(),
        }
    }

    fn online() -> Arc<MockNetworkMonitor> {
        let mut network = MockNetworkMonitor::new();
        network.expect_is_online().returning(|| true);
        Arc::new(network)
    }

    async fn build_pipeline(
        ocr: Arc<dyn OcrEngine>,
        langid: MockLanguageIdEngine,
        translate: MockTranslateEngine,
    ) -> Pipeline {
        let store = Arc::new(Store::open_in_memory().await.unwrap());
        languages::initialize(store.pool()).await.unwrap();

        let recognizer = Arc::new(TextRecognizer::new(
            ocr,
            RecognizeConfig {
                timeout_secs: 30,
                max_dimension: 8192,
                max_text_length: 10_000,
            },
        ));
        let detector = Arc::new(LanguageDetector::new(
            Arc::new(langid),
            online(),
            DetectConfig {
                timeout_secs: 15,
                min_text_length: 10,
                max_text_length: 10_000,
                sample_length: 1000,
            },
        ));
        let translator = Arc::new(TranslatorAdapter::new(
            Arc::new(translate),
            online(),
            TranslateConfig {
                timeout_secs: 45,
                max_text_length: 10_000,
                chunk_threshold: 4000,
            },
        ));
        let summarizer = Arc::new(Summarizer::new(
            translator.clone(),
            SummarizeConfig {
                timeout_secs: 30,
                min_text_length: 100,
                max_text_length: 10_000,
                working_language: "en".to_string(),
            },
        ));

        Pipeline::new(recognizer, detector, translator, summarizer, store, pipeline_config())
    }

    fn request(source: SourceLanguage, target: &str) -> PipelineRequest {
        PipelineRequest {
            image: ImageInput::from_raw_parts(vec![0u8; 16], 640, 480, 0),
            source,
            target: target.to_string(),
        }
    }

    fn idle_langid() -> MockLanguageIdEngine {
        let mut langid = MockLanguageIdEngine::new();
        langid.expect_identify().times(0);
        langid.expect_requires_network().return_const(false);
        langid
    }

    fn ready_translate(output: &str) -> MockTranslateEngine {
        let output = output.to_string();
        let mut translate = MockTranslateEngine::new();
        translate
            .expect_is_model_downloaded()
            .returning(|_, _| Ok(true));
        translate
            .expect_translate()
            .returning(move |_, _, _| Ok(output.clone()));
        translate
    }

    #[tokio::test]
    async fn test_explicit_source_skips_detection() {
        let mut ocr = MockOcrEngine::new();
        ocr.expect_recognize()
            .returning(|_| Ok("Hello there world".to_string()));

        let pipeline = build_pipeline(
            Arc::new(ocr),
            idle_langid(),
            ready_translate("Xin chào thế giới"),
        )
        .await;

        let result = pipeline
            .process(request(SourceLanguage::Code("en".to_string()), "vi"))
            .await
            .unwrap();

        assert_eq!(result.detected_text.as_deref(), Some("Hello there world"));
        assert_eq!(result.translated_text.as_deref(), Some("Xin chào thế giới"));
        assert!(result.error.is_none());
        assert_eq!(*pipeline.stage().borrow(), PipelineStage::Done);
    }

    #[tokio::test]
    async fn test_empty_ocr_terminates_early() {
        let mut ocr = MockOcrEngine::new();
        ocr.expect_recognize().returning(|_| Ok("   ".to_string()));

        let mut translate = MockTranslateEngine::new();
        translate.expect_translate().times(0);

        let pipeline = build_pipeline(Arc::new(ocr), idle_langid(), translate).await;

        let result = pipeline
            .process(request(SourceLanguage::Code("en".to_string()), "vi"))
            .await
            .unwrap();

        assert!(result.detected_text.is_none());
        assert!(result.translated_text.is_none());
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::NoTextFound);
        assert_eq!(*pipeline.stage().borrow(), PipelineStage::Failed);
    }

    #[tokio::test]
    async fn test_auto_detection_feeds_translation() {
        let mut ocr = MockOcrEngine::new();
        ocr.expect_recognize()
            .returning(|_| Ok("Bonjour tout le monde ici".to_string()));

        let mut langid = MockLanguageIdEngine::new();
        langid.expect_requires_network().return_const(false);
        langid
            .expect_identify()
            .returning(|_| Ok("fr".to_string()));

        let pipeline =
            build_pipeline(Arc::new(ocr), langid, ready_translate("Hello everyone here")).await;

        let result = pipeline
            .process(request(SourceLanguage::Auto, "en"))
            .await
            .unwrap();

        assert_eq!(result.detected_language.as_deref(), Some("fr"));
        assert_eq!(result.detected_language_name.as_deref(), Some("French"));
        assert_eq!(result.translated_text.as_deref(), Some("Hello everyone here"));
    }

    #[tokio::test]
    async fn test_detection_failure_falls_back_and_continues() {
        let mut ocr = MockOcrEngine::new();
        ocr.expect_recognize()
            .returning(|_| Ok("Some recognizable text here".to_string()));

        let mut langid = MockLanguageIdEngine::new();
        langid.expect_requires_network().return_const(false);
        langid
            .expect_identify()
            .returning(|_| Err(HonyakuError::Operation("identifier crashed".to_string())));

        let pipeline =
            build_pipeline(Arc::new(ocr), langid, ready_translate("translated")).await;

        let result = pipeline
            .process(request(SourceLanguage::Auto, "vi"))
            .await
            .unwrap();

        assert_eq!(result.detected_language.as_deref(), Some("en"));
        assert_eq!(
            result.detected_language_name.as_deref(),
            Some("English (default)")
        );
        assert_eq!(result.translated_text.as_deref(), Some("translated"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_same_language_skips_translation() {
        let mut ocr = MockOcrEngine::new();
        ocr.expect_recognize()
            .returning(|_| Ok("Hello world".to_string()));

        let mut translate = MockTranslateEngine::new();
        translate.expect_translate().times(0);
        translate.expect_is_model_downloaded().times(0);

        let pipeline = build_pipeline(Arc::new(ocr), idle_langid(), translate).await;

        let result = pipeline
            .process(request(SourceLanguage::Code("en".to_string()), "en"))
            .await
            .unwrap();

        assert_eq!(result.translated_text.as_deref(), Some("Hello world"));
        assert_eq!(*pipeline.stage().borrow(), PipelineStage::Done);
    }

    #[tokio::test]
    async fn test_translation_failure_keeps_detected_text() {
        let mut ocr = MockOcrEngine::new();
        ocr.expect_recognize()
            .returning(|_| Ok("Hello there world".to_string()));

        let mut translate = MockTranslateEngine::new();
        translate
            .expect_is_model_downloaded()
            .returning(|_, _| Ok(true));
        translate
            .expect_translate()
            .returning(|_, _, _| Err(HonyakuError::Translation("engine down".to_string())));

        let pipeline = build_pipeline(Arc::new(ocr), idle_langid(), translate).await;

        let result = pipeline
            .process(request(SourceLanguage::Code("en".to_string()), "vi"))
            .await
            .unwrap();

        assert_eq!(result.detected_text.as_deref(), Some("Hello there world"));
        assert!(result.translated_text.is_none());
        assert_eq!(
            result.error.as_ref().unwrap().kind,
            ErrorKind::TranslationFailed
        );
        assert!(!result.error.as_ref().unwrap().message.is_empty());
        assert_eq!(*pipeline.stage().borrow(), PipelineStage::Failed);
    }

    /// First call hangs until aborted; later calls return immediately.
    struct SlowThenFastOcr {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OcrEngine for SlowThenFastOcr {
        async fn recognize(&self, _image: &ImageInput) -> Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(20)).await;
            }
            Ok("Recognized text content".to_string())
        }
    }

    #[tokio::test]
    async fn test_new_invocation_supersedes_in_flight_one() {
        let ocr = Arc::new(SlowThenFastOcr {
            calls: AtomicUsize::new(0),
        });

        let pipeline = Arc::new(
            build_pipeline(ocr, idle_langid(), ready_translate("translated")).await,
        );

        let first = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline
                    .process(request(SourceLanguage::Code("en".to_string()), "vi"))
                    .await
            })
        };

        // Let the first invocation reach the recognizer before replacing it
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = pipeline
            .process(request(SourceLanguage::Code("en".to_string()), "vi"))
            .await
            .unwrap();
        assert_eq!(second.translated_text.as_deref(), Some("translated"));

        let first_result = first.await.unwrap();
        assert!(matches!(first_result, Err(HonyakuError::Operation(_))));
    }

    #[tokio::test]
    async fn test_summarize_runs_in_its_own_slot() {
        let mut ocr = MockOcrEngine::new();
        ocr.expect_recognize().times(0);

        let mut translate = MockTranslateEngine::new();
        translate.expect_translate().times(0);

        let pipeline = build_pipeline(Arc::new(ocr), idle_langid(), translate).await;

        let text = "The committee reviewed the annual budget proposal during the session. \
                    Several departments requested additional funding for projects this year. \
                    The conclusion was that spending must be reduced by ten percent overall.";
        let summary = pipeline
            .summarize(text, SummaryStyle::Brief, "en")
            .await
            .unwrap();
        assert!(!summary.is_empty());
        assert_eq!(*pipeline.stage().borrow(), PipelineStage::Done);
    }
}
