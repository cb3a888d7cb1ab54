//! Honyaku - Image and Text Translation Pipeline
//!
//! A Rust implementation of a multi-stage translation workflow: optical
//! character recognition, language identification, translation,
//! summarization, and speech, orchestrated over pluggable ML engines.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod engine;
pub mod recognize;
pub mod detect;
pub mod translate;
pub mod summarize;
pub mod speech;
pub mod store;
pub mod lang;
pub mod net;
pub mod error;
