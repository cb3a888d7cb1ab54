use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::SummarizeConfig;
use crate::error::{Result, HonyakuError};
use crate::translate::TranslatorAdapter;

/// Extractive summary variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle {
    /// 1-2 sentences
    Brief,
    /// Up to 5 sentences
    Detailed,
    /// Key points as bullets
    BulletPoints,
    /// Most frequent terms
    KeyPhrases,
}

impl SummaryStyle {
    fn max_sentences(&self) -> usize {
        match self {
            Self::Brief => 2,
            Self::Detailed => 5,
            Self::BulletPoints => 4,
            Self::KeyPhrases => 0,
        }
    }
}

/// Discourse and emphasis markers that raise a sentence's score.
const KEYWORDS: &[&str] = &[
    "important", "significant", "key", "main", "primary", "essential",
    "critical", "major", "fundamental", "crucial", "vital", "notable",
    "first", "second", "third", "finally", "conclusion", "result",
    "because", "therefore", "however", "although", "moreover",
];

/// Sentences shorter than this are discarded as fragments.
const MIN_SENTENCE_LENGTH: usize = 10;

/// Number of terms reported by the key-phrases style.
const KEY_TERM_COUNT: usize = 8;

/// Minimum word length counted as a key term.
const MIN_TERM_LENGTH: usize = 4;

/// Position/length-weighted sentence extraction in four styles.
///
/// The heuristics operate in the working language; summaries for other
/// targets go through the translator once after extraction.
pub struct Summarizer {
    translator: Arc<TranslatorAdapter>,
    config: SummarizeConfig,
}

impl Summarizer {
    pub fn new(translator: Arc<TranslatorAdapter>, config: SummarizeConfig) -> Self {
        Self { translator, config }
    }

    pub async fn summarize(
        &self,
        text: &str,
        style: SummaryStyle,
        target_language: &str,
    ) -> Result<String> {
        let trimmed = text.trim();
        let length = trimmed.chars().count();
        if length < self.config.min_text_length || length > self.config.max_text_length {
            return Err(HonyakuError::InvalidInput(format!(
                "Text length {} outside {}..={}",
                length, self.config.min_text_length, self.config.max_text_length
            )));
        }

        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, self.run(trimmed, style, target_language)).await {
            Ok(result) => result,
            Err(_) => Err(HonyakuError::Summarization(format!(
                "No result within {} seconds", self.config.timeout_secs
            ))),
        }
    }

    async fn run(&self, text: &str, style: SummaryStyle, target_language: &str) -> Result<String> {
        let summary = match style {
            SummaryStyle::Brief | SummaryStyle::Detailed => {
                let sentences = split_sentences(text);
                select_sentences(&sentences, style.max_sentences()).join(" ")
            }
            SummaryStyle::BulletPoints => {
                let sentences = split_sentences(text);
                select_sentences(&sentences, style.max_sentences())
                    .iter()
                    .map(|s| format!("• {}", s))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            SummaryStyle::KeyPhrases => key_terms(text),
        };

        if summary.is_empty() {
            return Err(HonyakuError::Summarization(
                "Nothing to extract from the text".to_string(),
            ));
        }

        if target_language != self.config.working_language {
            debug!(
                "Translating summary {} -> {}",
                self.config.working_language, target_language
            );
            self.translator
                .translate(&summary, &self.config.working_language, target_language)
                .await
                .map_err(|e| HonyakuError::Summarization(e.to_string()))
        } else {
            Ok(summary)
        }
    }
}

/// Split on terminal punctuation, dropping fragments.
fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_LENGTH)
        .map(str::to_string)
        .collect()
}

/// Score every sentence, keep the best `max`, and restore document order.
fn select_sentences(sentences: &[String], max: usize) -> Vec<String> {
    if sentences.len() <= max {
        return sentences.to_vec();
    }

    let total = sentences.len();
    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| (index, score_sentence(sentence, index, total)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(max);
    scored.sort_by_key(|&(index, _)| index);

    scored
        .into_iter()
        .map(|(index, _)| sentences[index].clone())
        .collect()
}

fn score_sentence(sentence: &str, index: usize, total: usize) -> f64 {
    let position_weight = if index == 0 {
        3.0
    } else if index == total - 1 {
        2.0
    } else if (index as f64) < (total as f64) * 0.3 {
        1.5
    } else {
        1.0
    };

    let length = sentence.chars().count();
    let length_weight = if length < 50 {
        0.5
    } else if length > 200 {
        0.7
    } else {
        1.0
    };

    position_weight * length_weight * (1.0 + 0.1 * keyword_hits(sentence) as f64)
}

fn keyword_hits(sentence: &str) -> usize {
    let lowered = sentence.to_lowercase();
    KEYWORDS.iter().filter(|k| lowered.contains(*k)).count()
}

/// Frequency extraction over case-folded alphabetic words.
fn key_terms(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphabetic() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (position, word) in cleaned.split_whitespace().enumerate() {
        if word.chars().count() >= MIN_TERM_LENGTH {
            *counts.entry(word).or_insert(0) += 1;
            first_seen.entry(word).or_insert(position);
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by_key(|&(word, count)| (std::cmp::Reverse(count), first_seen[word]));
    ranked.truncate(KEY_TERM_COUNT);

    if ranked.is_empty() {
        return String::new();
    }

    let terms: Vec<&str> = ranked.iter().map(|&(word, _)| word).collect();
    format!("Key terms: {}", terms.join(", "))
}
