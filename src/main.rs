//! Honyaku - Image and Text Translation Pipeline
//!
//! This is the main entry point for the Honyaku application, which turns
//! images, typed text, and speech into translations using pluggable OCR,
//! language identification, translation, and speech engines.

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};
use walkdir::WalkDir;

use honyaku::cli::{Args, Commands, PrefsAction};
use honyaku::config::Config;
use honyaku::detect::LanguageDetector;
use honyaku::engine::EngineFactory;
use honyaku::error::HonyakuError;
use honyaku::net::TcpProbe;
use honyaku::pipeline::{Pipeline, PipelineRequest, PipelineResult, SourceLanguage};
use honyaku::recognize::{ImageInput, TextRecognizer};
use honyaku::speech::{SpeechEvent, SpeechRecognizer, SpeechSynthesizer};
use honyaku::store::{languages, preferences, Store};
use honyaku::summarize::SummaryStyle;
use honyaku::translate::TranslatorAdapter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Open local storage and seed the reference data
    let store = Arc::new(Store::open(&config.storage.database_path).await?);
    languages::initialize(store.pool()).await?;
    let prefs = preferences::get_or_init(store.pool()).await?;

    // Engines and adapters, constructed once and passed explicitly
    let network = Arc::new(TcpProbe::new(&config.network));
    let recognizer = Arc::new(TextRecognizer::new(
        EngineFactory::create_ocr(&config.engine),
        config.recognize.clone(),
    ));
    let detector = Arc::new(LanguageDetector::new(
        EngineFactory::create_language_id(&config.engine),
        network.clone(),
        config.detect.clone(),
    ));
    let translator = Arc::new(TranslatorAdapter::new(
        EngineFactory::create_translate(&config.engine),
        network.clone(),
        config.translate.clone(),
    ));
    let summarizer = Arc::new(honyaku::summarize::Summarizer::new(
        translator.clone(),
        config.summarize.clone(),
    ));
    let synthesizer = SpeechSynthesizer::new(
        EngineFactory::create_tts(&config.engine),
        config.speech.clone(),
    );
    let listener = SpeechRecognizer::new(EngineFactory::create_stt(&config.engine));

    let pipeline = Pipeline::new(
        recognizer,
        detector.clone(),
        translator.clone(),
        summarizer,
        store.clone(),
        config.pipeline.clone(),
    );

    // Execute command
    match args.command {
        Commands::Image { input, source, target, summary } => {
            info!("Processing image: {}", input.display());

            let target = target.unwrap_or_else(|| prefs.default_target_language.clone());
            let source = resolve_source(source, prefs.auto_detect_language, &prefs.default_source_language);

            let image = ImageInput::from_path(&input)?;
            let result = pipeline
                .process(PipelineRequest { image, source, target: target.clone() })
                .await?;

            print_pipeline_result(&result);

            if let Some(style) = summary {
                if let Some(text) = result.detected_text.as_deref() {
                    let style = parse_summary_style(&style)?;
                    match pipeline.summarize(text, style, &target).await {
                        Ok(summary) => {
                            println!("\nSummary:");
                            println!("{}", summary);
                        }
                        Err(e) => eprintln!("{}", e.user_message()),
                    }
                }
            }
        }
        Commands::Batch { input_dir, source, target, output_dir } => {
            info!("Processing directory: {}", input_dir.display());

            if !input_dir.is_dir() {
                return Err(HonyakuError::Config("Input path is not a directory".to_string()).into());
            }

            let target = target.unwrap_or_else(|| prefs.default_target_language.clone());
            let source = resolve_source(source, prefs.auto_detect_language, &prefs.default_source_language);

            let output_dir = match output_dir {
                Some(dir) => dir,
                None => input_dir.clone(),
            };
            tokio::fs::create_dir_all(&output_dir).await?;

            // Find image files
            let image_extensions = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"];
            let mut image_files = Vec::new();

            for entry in WalkDir::new(&input_dir).into_iter().filter_map(|e| e.ok()) {
                if let Some(extension) = entry.path().extension() {
                    if let Some(ext_str) = extension.to_str() {
                        if image_extensions.contains(&ext_str.to_lowercase().as_str()) {
                            image_files.push(entry.path().to_path_buf());
                        }
                    }
                }
            }

            info!("Found {} image files to process", image_files.len());
            let progress = ProgressBar::new(image_files.len() as u64);

            for image_path in image_files {
                match process_batch_image(&pipeline, &image_path, source.clone(), &target, &output_dir).await {
                    Ok(output_path) => info!(
                        "Successfully processed {} -> {}",
                        image_path.display(),
                        output_path.display()
                    ),
                    Err(e) => warn!("Failed to process {}: {}", image_path.display(), e),
                }
                progress.inc(1);
            }
            progress.finish();
        }
        Commands::Text { text, source, target } => {
            let target = target.unwrap_or_else(|| prefs.default_target_language.clone());

            let source = match source {
                Some(code) => code,
                None if prefs.auto_detect_language => {
                    match detector.detect(&text).await {
                        Ok(Some(code)) => {
                            info!("Detected source language: {}", code);
                            code
                        }
                        Ok(None) => {
                            warn!("Language undetermined, assuming {}", prefs.default_source_language);
                            prefs.default_source_language.clone()
                        }
                        Err(e) => {
                            warn!("Language detection failed ({}), assuming {}", e, prefs.default_source_language);
                            prefs.default_source_language.clone()
                        }
                    }
                }
                None => prefs.default_source_language.clone(),
            };

            match translator.translate(&text, &source, &target).await {
                Ok(translated) => println!("{}", translated),
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Err(e.into());
                }
            }
        }
        Commands::Detect { text } => {
            match detector.detect(&text).await? {
                Some(code) => {
                    let name = languages::language_by_code(store.pool(), &code)
                        .await?
                        .map(|language| language.name)
                        .unwrap_or_else(|| code.clone());
                    println!("{} ({})", name, code);
                }
                None => println!("Could not determine the language."),
            }
        }
        Commands::Summarize { text, style, target } => {
            let style = parse_summary_style(&style)?;
            match pipeline.summarize(&text, style, &target).await {
                Ok(summary) => println!("{}", summary),
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Err(e.into());
                }
            }
        }
        Commands::Speak { text, language, rate } => {
            synthesizer.speak(&text, &language, rate).await?;
            info!("Utterance started");
        }
        Commands::Listen { language } => {
            let mut stream = listener.start_listening(&language).await?;
            while let Some(event) = stream.next_event().await {
                match event {
                    SpeechEvent::Ready => println!("Ready."),
                    SpeechEvent::ListeningStarted => println!("Listening..."),
                    SpeechEvent::VolumeLevel(_) => {}
                    SpeechEvent::PartialText(text) => println!("... {}", text),
                    SpeechEvent::FinalText(text) => println!("{}", text),
                    SpeechEvent::Error(code) => eprintln!("{}", code.message()),
                }
            }
        }
        Commands::Languages => {
            let all = languages::all_languages(store.pool()).await?;

            println!("\nSupported Languages:");
            println!("{:<8} {:<24} {:<20} {:^6} {:^6} {:^6}", "Code", "Name", "Native", "Text", "Voice", "Camera");
            println!("{}", "-".repeat(74));

            for language in all {
                println!(
                    "{:<8} {:<24} {:<20} {:^6} {:^6} {:^6}",
                    language.code,
                    language.name,
                    language.native_name,
                    yes_no(language.supports_text),
                    yes_no(language.supports_voice),
                    yes_no(language.supports_camera),
                );
            }
        }
        Commands::Prefs { action } => match action {
            PrefsAction::Show => {
                println!("Default source language: {}", prefs.default_source_language);
                println!("Default target language: {}", prefs.default_target_language);
                println!("Theme:                   {}", prefs.theme);
                println!("Auto-detect language:    {}", prefs.auto_detect_language);
                println!("Text-to-speech:          {}", prefs.tts_enabled);
                println!("Camera auto-translate:   {}", prefs.camera_auto_translate);
                println!("Font size:               {}", prefs.font_size);
            }
            PrefsAction::Set { source, target, theme, auto_detect, tts, camera_auto_translate, font_size } => {
                let mut updated = prefs.clone();
                if let Some(source) = source {
                    updated.default_source_language = source;
                }
                if let Some(target) = target {
                    updated.default_target_language = target;
                }
                if let Some(theme) = theme {
                    updated.theme = theme;
                }
                if let Some(auto_detect) = auto_detect {
                    updated.auto_detect_language = auto_detect;
                }
                if let Some(tts) = tts {
                    updated.tts_enabled = tts;
                }
                if let Some(camera_auto_translate) = camera_auto_translate {
                    updated.camera_auto_translate = camera_auto_translate;
                }
                if let Some(font_size) = font_size {
                    updated.font_size = font_size;
                }

                preferences::save(store.pool(), &updated).await?;
                println!("Preferences saved.");
            }
        },
    }

    pipeline.shutdown().await;
    info!("Honyaku completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let honyaku_dir = std::env::current_dir()?.join(".honyaku");
    let log_dir = honyaku_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "honyaku.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn resolve_source(source: Option<String>, auto_detect: bool, default_source: &str) -> SourceLanguage {
    match source {
        Some(code) => SourceLanguage::Code(code),
        None if auto_detect => SourceLanguage::Auto,
        None => SourceLanguage::Code(default_source.to_string()),
    }
}

fn print_pipeline_result(result: &PipelineResult) {
    if let Some(text) = &result.detected_text {
        println!("Recognized text:");
        println!("{}", text);
    }
    if let Some(language) = &result.detected_language {
        let name = result.detected_language_name.as_deref().unwrap_or(language);
        println!("\nDetected language: {} ({})", name, language);
    }
    if let Some(translated) = &result.translated_text {
        println!("\nTranslation:");
        println!("{}", translated);
    }
    if let Some(failure) = &result.error {
        eprintln!("\n{}", failure.message);
    }
}

async fn process_batch_image(
    pipeline: &Pipeline,
    image_path: &Path,
    source: SourceLanguage,
    target: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let image_stem = image_path
        .file_stem()
        .ok_or_else(|| HonyakuError::Config("Invalid image filename".to_string()))?
        .to_string_lossy();

    let image = ImageInput::from_path(image_path)?;
    let result = pipeline
        .process(PipelineRequest {
            image,
            source,
            target: target.to_string(),
        })
        .await?;

    let translated = match result.translated_text {
        Some(text) => text,
        None => {
            let message = result
                .error
                .map(|failure| failure.message)
                .unwrap_or_else(|| "No translation produced".to_string());
            return Err(HonyakuError::Operation(message).into());
        }
    };

    let output_path = output_dir.join(format!("{}_{}.txt", image_stem, target));
    tokio::fs::write(&output_path, translated).await?;
    Ok(output_path)
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Parse summary style from string
fn parse_summary_style(style: &str) -> Result<SummaryStyle> {
    match style.to_lowercase().as_str() {
        "brief" => Ok(SummaryStyle::Brief),
        "detailed" => Ok(SummaryStyle::Detailed),
        "bullets" | "bullet-points" => Ok(SummaryStyle::BulletPoints),
        "key-phrases" | "keyphrases" => Ok(SummaryStyle::KeyPhrases),
        _ => Err(HonyakuError::Config(format!(
            "Invalid summary style '{}'. Valid styles: brief, detailed, bullets, key-phrases",
            style
        )).into()),
    }
}
