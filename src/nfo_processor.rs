use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::MetadataError;
use crate::file_utils::FileManager;
use crate::language_utils::{self, LanguageDetector};
use crate::providers::TranslationClient;

// @module: NFO/XML metadata sanitizing and field translation

/// Tag names eligible for translation. Case-sensitive; scraper output mixes
/// lowercase (Kodi movie NFOs) and capitalized (series XML) variants.
pub const TRANSLATABLE_TAGS: &[&str] = &[
    "genre",
    "Genre",
    "description",
    "plot",
    "overview",
    "Overview",
];

/// Whether a tag belongs to the translatable allow-set
pub fn is_translatable_tag(tag: &str) -> bool {
    TRANSLATABLE_TAGS.contains(&tag)
}

/// Keep only the lines that look like markup: trimmed form starts with `<`.
///
/// Metadata files are frequently polluted with non-markup preamble or
/// trailing text. This is a best-effort heuristic, not a validating parser;
/// relative line order is preserved and the lines themselves are untouched.
pub fn sanitize_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .filter(|line| line.trim_start().starts_with('<'))
        .collect()
}

/// Translate the allow-set fields of a sanitized markup document.
///
/// Every element whose tag is in [`TRANSLATABLE_TAGS`] and whose trimmed
/// text is non-empty goes through detect-then-translate: if the detected
/// language already matches `target_lang` the field is left untouched
/// (this is what makes re-runs idempotent), and a failed translation call
/// falls back to the original text rather than failing the document.
///
/// Returns the serialized document, UTF-8 with an XML declaration header.
/// Fails only when the markup itself cannot be parsed.
pub async fn translate_document(
    content: &str,
    path_label: &str,
    translator: &dyn TranslationClient,
    detector: &dyn LanguageDetector,
    target_lang: &str,
) -> Result<Vec<u8>, MetadataError> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::new());

    let malformed = |e: quick_xml::Error| MetadataError::MalformedMarkup {
        path: path_label.to_string(),
        reason: e.to_string(),
    };

    let write_failed = |e: quick_xml::Error| MetadataError::MalformedMarkup {
        path: path_label.to_string(),
        reason: format!("serialization failed: {}", e),
    };

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_failed)?;
    let _ = writer.get_mut().write_all(b"\n");

    let mut in_translatable = false;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Err(e) => return Err(malformed(e)),
            Ok(Event::Eof) => break,
            // The input declaration is replaced by ours above
            Ok(Event::Decl(_)) => {}
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                in_translatable = is_translatable_tag(&tag);
                saw_root = true;
                writer.write_event(Event::Start(e)).map_err(write_failed)?;
            }
            Ok(Event::End(e)) => {
                in_translatable = false;
                writer.write_event(Event::End(e)).map_err(write_failed)?;
            }
            // Only the leading text segment of a translatable element is
            // translated; tail text after an empty child stays as-is
            Ok(Event::Empty(e)) => {
                in_translatable = false;
                saw_root = true;
                writer.write_event(Event::Empty(e)).map_err(write_failed)?;
            }
            Ok(Event::Text(t)) if in_translatable => {
                let rewritten = {
                    let raw = t.unescape().map_err(malformed)?;
                    let original = raw.trim();
                    if original.is_empty() {
                        None
                    } else {
                        translate_field(original, translator, detector, target_lang).await
                    }
                };

                match rewritten {
                    Some(translated) => writer
                        .write_event(Event::Text(BytesText::new(&translated)))
                        .map_err(write_failed)?,
                    // Skip and fallback paths leave the field byte-for-byte
                    // as it was, surrounding whitespace included
                    None => writer.write_event(Event::Text(t)).map_err(write_failed)?,
                }
            }
            // Whitespace before the root would pile up under the fresh
            // declaration header on re-runs
            Ok(Event::Text(t)) if !saw_root => {
                if !t.unescape().map_err(malformed)?.trim().is_empty() {
                    writer.write_event(Event::Text(t)).map_err(write_failed)?;
                }
            }
            Ok(event) => {
                writer.write_event(event).map_err(write_failed)?;
            }
        }
    }

    Ok(writer.into_inner())
}

/// Detect-then-translate one field. Never fails: `None` means leave the
/// field untouched, either because it is already in the target language or
/// because the translation call failed.
async fn translate_field(
    original: &str,
    translator: &dyn TranslationClient,
    detector: &dyn LanguageDetector,
    target_lang: &str,
) -> Option<String> {
    if let Some(detected) = detector.detect(original) {
        debug!("Detected language '{}' for '{}'", detected, preview(original));
        if language_utils::language_codes_match(&detected, target_lang) {
            debug!("Skipping translation, already in target language");
            return None;
        }
    }

    match translator.translate(original, target_lang).await {
        Ok(translated) => {
            debug!("Translated '{}' to '{}'", preview(original), preview(&translated));
            Some(translated)
        }
        Err(e) => {
            warn!("Error translating '{}': {}", preview(original), e);
            None
        }
    }
}

/// Shorten a field for log lines
fn preview(text: &str) -> String {
    const MAX: usize = 50;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(MAX).collect();
        format!("{}...", truncated)
    }
}

/// Sanitize and translate one metadata file, then atomically replace it.
///
/// The file is read permissively (undecodable bytes replaced), sanitized in
/// memory, translated, and only then written back via a temporary file and
/// rename. A parse failure leaves the original file byte-for-byte intact.
pub async fn process_file(
    path: &Path,
    translator: &dyn TranslationClient,
    detector: &dyn LanguageDetector,
    target_lang: &str,
) -> Result<()> {
    let content = FileManager::read_to_string_lossy(path)?;

    if content.lines().next().is_none() {
        return Err(MetadataError::EmptyFile(path.display().to_string()).into());
    }

    let sanitized = sanitize_lines(&content).join("\n");

    let output = translate_document(
        &sanitized,
        &path.display().to_string(),
        translator,
        detector,
        target_lang,
    )
    .await?;

    FileManager::write_atomic(path, &output)
        .with_context(|| format!("Failed to write translated file: {}", path.display()))?;

    Ok(())
}
