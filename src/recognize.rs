use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RecognizeConfig;
use crate::engine::OcrEngine;
use crate::error::{Result, HonyakuError};

/// In-memory image handed to the recognition engine.
#[derive(Debug, Clone)]
pub struct ImageInput {
    data: Vec<u8>,
    width: u32,
    height: u32,
    /// Clockwise rotation in degrees to apply before recognition
    orientation: u32,
}

impl ImageInput {
    /// Load and decode an image file to obtain its dimensions.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let decoded = image::load_from_memory(&data).map_err(|e| {
            HonyakuError::InvalidInput(format!("Cannot decode image {}: {}", path.display(), e))
        })?;

        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            data,
            orientation: 0,
        })
    }

    /// Wrap an already-decoded buffer. Dimensions are taken as given; the
    /// recognizer validates them before any engine call.
    pub fn from_raw_parts(data: Vec<u8>, width: u32, height: u32, orientation: u32) -> Self {
        Self {
            data,
            width,
            height,
            orientation,
        }
    }

    pub fn with_orientation(mut self, orientation: u32) -> Self {
        self.orientation = orientation % 360;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn orientation(&self) -> u32 {
        self.orientation
    }
}

/// Wraps the OCR engine with input validation, a call deadline, and output
/// cleanup.
pub struct TextRecognizer {
    engine: Arc<dyn OcrEngine>,
    config: RecognizeConfig,
}

impl TextRecognizer {
    pub fn new(engine: Arc<dyn OcrEngine>, config: RecognizeConfig) -> Self {
        Self { engine, config }
    }

    /// Recognize text in the image.
    ///
    /// Fails `InvalidInput` before touching the engine when the image is
    /// empty or out of bounds, `Recognition` on engine failure or timeout,
    /// and `NoTextFound` when the engine produces nothing usable.
    pub async fn recognize(&self, image: &ImageInput) -> Result<String> {
        self.validate_image(image)?;

        debug!("Starting text recognition ({}x{})", image.width(), image.height());

        let deadline = Duration::from_secs(self.config.timeout_secs);
        let raw = match tokio::time::timeout(deadline, self.engine.recognize(image)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return Err(HonyakuError::Recognition(e.to_string()));
            }
            Err(_) => {
                return Err(HonyakuError::Recognition(format!(
                    "No result within {} seconds", self.config.timeout_secs
                )));
            }
        };

        if raw.trim().is_empty() {
            debug!("No text detected in image");
            return Err(HonyakuError::NoTextFound);
        }

        let bounded = if raw.chars().count() > self.config.max_text_length {
            warn!(
                "Recognized text too long ({} chars), truncating to {}",
                raw.chars().count(),
                self.config.max_text_length
            );
            raw.chars().take(self.config.max_text_length).collect()
        } else {
            raw
        };

        let cleaned = cleanup_recognized_text(&bounded);
        if cleaned.is_empty() {
            return Err(HonyakuError::NoTextFound);
        }

        debug!("Text recognition successful: {} chars", cleaned.chars().count());
        Ok(cleaned)
    }

    fn validate_image(&self, image: &ImageInput) -> Result<()> {
        if image.data().is_empty() {
            return Err(HonyakuError::InvalidInput("Image buffer is empty".to_string()));
        }

        let max = self.config.max_dimension;
        if image.width() == 0 || image.height() == 0 || image.width() > max || image.height() > max
        {
            return Err(HonyakuError::InvalidInput(format!(
                "Image dimensions {}x{} outside 1..={}",
                image.width(),
                image.height(),
                max
            )));
        }

        Ok(())
    }
}

/// Normalize raw engine output: consistent line endings, bounded blank
/// lines, collapsed spacing, and light correction of common OCR artifacts.
pub fn cleanup_recognized_text(text: &str) -> String {
    let text = normalize_line_endings(text);
    let text = strip_control_chars(&text);
    let text = collapse_spacing(&text);
    let text = cap_blank_lines(&text);
    let text = fix_artifacts(&text);
    collapse_spacing(&text).trim().to_string()
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect()
}

/// Collapse runs of spaces and tabs to a single space, leaving newlines.
fn collapse_spacing(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_gap = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !in_gap {
                out.push(' ');
                in_gap = true;
            }
        } else {
            out.push(c);
            in_gap = false;
        }
    }
    out
}

/// Limit consecutive newlines to two (one blank line).
fn cap_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out
}

/// Common engine artifacts: pipe runs misread from the letter I, and glued
/// words at a lowercase-to-uppercase boundary.
fn fix_artifacts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut in_pipe_run = false;

    for c in text.chars() {
        if c == '|' {
            if !in_pipe_run {
                out.push('I');
                in_pipe_run = true;
                prev = Some('I');
            }
            continue;
        }
        in_pipe_run = false;

        if let Some(p) = prev {
            if p.is_ascii_lowercase() && c.is_ascii_uppercase() {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockOcrEngine;

    fn config() -> RecognizeConfig {
        RecognizeConfig {
            timeout_secs: 30,
            max_dimension: 8192,
            max_text_length: 10_000,
        }
    }

    fn image(width: u32, height: u32) -> ImageInput {
        ImageInput::from_raw_parts(vec![0u8; 16], width, height, 0)
    }

    #[tokio::test]
    async fn test_zero_width_image_rejected_without_engine_call() {
        let mut engine = MockOcrEngine::new();
        engine.expect_recognize().times(0);

        let recognizer = TextRecognizer::new(Arc::new(engine), config());
        let err = recognizer.recognize(&image(0, 100)).await.unwrap_err();
        assert!(matches!(err, HonyakuError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_oversized_image_rejected() {
        let mut engine = MockOcrEngine::new();
        engine.expect_recognize().times(0);

        let recognizer = TextRecognizer::new(Arc::new(engine), config());
        let err = recognizer.recognize(&image(8193, 100)).await.unwrap_err();
        assert!(matches!(err, HonyakuError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_blank_output_is_no_text_found() {
        let mut engine = MockOcrEngine::new();
        engine
            .expect_recognize()
            .returning(|_| Ok("   \n  ".to_string()));

        let recognizer = TextRecognizer::new(Arc::new(engine), config());
        let err = recognizer.recognize(&image(640, 480)).await.unwrap_err();
        assert!(matches!(err, HonyakuError::NoTextFound));
    }

    #[tokio::test]
    async fn test_engine_failure_maps_to_recognition() {
        let mut engine = MockOcrEngine::new();
        engine
            .expect_recognize()
            .returning(|_| Err(HonyakuError::Network("connection reset".to_string())));

        let recognizer = TextRecognizer::new(Arc::new(engine), config());
        let err = recognizer.recognize(&image(640, 480)).await.unwrap_err();
        assert!(matches!(err, HonyakuError::Recognition(_)));
    }

    #[tokio::test]
    async fn test_long_output_truncated() {
        let mut engine = MockOcrEngine::new();
        engine
            .expect_recognize()
            .returning(|_| Ok("word ".repeat(2500)));

        let recognizer = TextRecognizer::new(Arc::new(engine), config());
        let text = recognizer.recognize(&image(640, 480)).await.unwrap();
        assert!(text.chars().count() <= 10_000);
    }

    #[test]
    fn test_cleanup_collapses_whitespace() {
        assert_eq!(cleanup_recognized_text("Hello \t  world"), "Hello world");
    }

    #[test]
    fn test_cleanup_normalizes_line_endings() {
        assert_eq!(cleanup_recognized_text("one\r\ntwo\rthree"), "one\ntwo\nthree");
    }

    #[test]
    fn test_cleanup_caps_blank_lines() {
        assert_eq!(cleanup_recognized_text("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_cleanup_strips_control_chars() {
        assert_eq!(cleanup_recognized_text("ab\u{0000}cd\u{0007}e"), "abcde");
    }

    #[test]
    fn test_cleanup_replaces_pipe_runs() {
        assert_eq!(cleanup_recognized_text("||| saw it"), "I saw it");
    }

    #[test]
    fn test_cleanup_splits_glued_words() {
        assert_eq!(cleanup_recognized_text("helloWorld"), "hello World");
    }
}
