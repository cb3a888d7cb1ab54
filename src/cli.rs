use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate text found in a single image
    Image {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Source language code (auto-detected when omitted)
        #[arg(short, long)]
        source: Option<String>,

        /// Target language code (stored preference when omitted)
        #[arg(short, long)]
        target: Option<String>,

        /// Also summarize the recognized text (brief, detailed, bullets, key-phrases)
        #[arg(long)]
        summary: Option<String>,
    },

    /// Translate text found in every image under a directory
    Batch {
        /// Input directory containing image files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Source language code (auto-detected when omitted)
        #[arg(short, long)]
        source: Option<String>,

        /// Target language code (stored preference when omitted)
        #[arg(short, long)]
        target: Option<String>,

        /// Output directory for translation files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Translate typed text
    Text {
        /// Text to translate
        text: String,

        /// Source language code (auto-detected when omitted)
        #[arg(short, long)]
        source: Option<String>,

        /// Target language code (stored preference when omitted)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Detect the language of a text
    Detect {
        /// Text to analyze
        text: String,
    },

    /// Summarize a text
    Summarize {
        /// Text to summarize
        text: String,

        /// Summary style (brief, detailed, bullets, key-phrases)
        #[arg(long, default_value = "brief")]
        style: String,

        /// Language of the produced summary
        #[arg(short, long, default_value = "en")]
        target: String,
    },

    /// Speak a text aloud
    Speak {
        /// Text to speak
        text: String,

        /// Locale for synthesis
        #[arg(short, long, default_value = "en-US")]
        language: String,

        /// Speech rate (1.0 = normal)
        #[arg(short, long, default_value = "1.0")]
        rate: f32,
    },

    /// Listen to the microphone and print recognized speech
    Listen {
        /// Locale for recognition
        #[arg(short, long, default_value = "en-US")]
        language: String,
    },

    /// List supported languages
    Languages,

    /// Show or update stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print the stored preferences
    Show,

    /// Update preferences; the record is saved as a whole
    Set {
        /// Default source language code
        #[arg(long)]
        source: Option<String>,

        /// Default target language code
        #[arg(long)]
        target: Option<String>,

        /// Theme (light, dark, system)
        #[arg(long)]
        theme: Option<String>,

        /// Detect the source language automatically
        #[arg(long)]
        auto_detect: Option<bool>,

        /// Enable text-to-speech
        #[arg(long)]
        tts: Option<bool>,

        /// Translate camera captures automatically
        #[arg(long)]
        camera_auto_translate: Option<bool>,

        /// Font size (small, medium, large)
        #[arg(long)]
        font_size: Option<String>,
    },
}
