use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling and detection
///
/// This module provides functions for validating, normalizing, and
/// matching ISO 639-1 (2-letter) and ISO 639-2/T (3-letter) language codes,
/// plus the in-process language detector used by the field translator.
/// Validate that a language code is a known ISO 639-1 or ISO 639-2/T code
pub fn validate_language_code(code: &str) -> Result<()> {
    let normalized = code.trim().to_lowercase();

    if normalized.len() == 2 && Language::from_639_1(&normalized).is_some() {
        return Ok(());
    }
    if normalized.len() == 3 && Language::from_639_3(&normalized).is_some() {
        return Ok(());
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible.
/// Falls back to ISO 639-2/T if no 2-letter code exists.
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();

    if normalized.len() == 2 {
        if Language::from_639_1(&normalized).is_some() {
            return Ok(normalized);
        }
    } else if normalized.len() == 3 {
        if let Some(lang) = Language::from_639_3(&normalized) {
            if let Some(part1) = lang.to_639_1() {
                return Ok(part1.to_string());
            }
            return Ok(normalized);
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes refer to the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (
        normalize_to_part1_or_part2t(code1),
        normalize_to_part1_or_part2t(code2),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();
    let lang = if normalized.len() == 2 {
        Language::from_639_1(&normalized)
    } else {
        Language::from_639_3(&normalized)
    };

    lang.map(|l| l.to_name().to_string())
        .ok_or_else(|| anyhow!("Unknown language code: {}", code))
}

/// Identifies the language of a piece of text.
///
/// Top-1 prediction only; `None` when the text is too short or ambiguous
/// for a confident call.
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of `text`, returned as an ISO 639-1 code where
    /// one exists (ISO 639-2/T otherwise).
    fn detect(&self, text: &str) -> Option<String>;
}

/// Statistical trigram-based detector backed by whatlang.
///
/// The model is embedded in the binary, so there is nothing to download or
/// cache on disk. Constructed once per run and reused read-only.
#[derive(Debug, Default)]
pub struct StatisticalDetector;

impl StatisticalDetector {
    pub fn new() -> Self {
        StatisticalDetector
    }
}

impl LanguageDetector for StatisticalDetector {
    fn detect(&self, text: &str) -> Option<String> {
        // Newlines confuse short-text detection; flatten before predicting.
        let flattened = text.replace('\n', " ");
        let info = whatlang::detect(&flattened)?;

        let part3 = info.lang().code();
        normalize_to_part1_or_part2t(part3).ok()
    }
}
