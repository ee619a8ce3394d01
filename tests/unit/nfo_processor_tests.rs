/*!
 * Tests for metadata sanitizing and field translation
 */

use std::fs;

use anyhow::Result;
use subnfo::errors::MetadataError;
use subnfo::nfo_processor::{self, is_translatable_tag, sanitize_lines};

use crate::common;
use crate::common::mock_providers::{MockDetector, MockTranslator};

/// Test the allow-set membership, including its case-sensitive variants
#[test]
fn test_is_translatable_tag_withAllowSet_shouldMatchExactly() {
    assert!(is_translatable_tag("plot"));
    assert!(is_translatable_tag("genre"));
    assert!(is_translatable_tag("Genre"));
    assert!(is_translatable_tag("Overview"));
    assert!(!is_translatable_tag("title"));
    assert!(!is_translatable_tag("PLOT"));
}

/// Test that sanitizing keeps only trimmed-leading-`<` lines, in order
#[test]
fn test_sanitize_lines_withMixedContent_shouldKeepMarkupLines() {
    let content = "junk\n<a>x</a>\n  <b/>\ntrailer";
    let kept = sanitize_lines(content);

    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].trim(), "<a>x</a>");
    assert_eq!(kept[1].trim(), "<b/>");
}

/// Test that sanitizing all-junk content yields zero lines, which is allowed
#[test]
fn test_sanitize_lines_withNoMarkup_shouldYieldEmpty() {
    assert!(sanitize_lines("junk\nmore junk").is_empty());
}

/// Test that a field not in the target language is translated
#[tokio::test]
async fn test_translate_document_withForeignField_shouldTranslate() -> Result<()> {
    let translator = MockTranslator::new().with_translation("Bonjour", "Hello");
    let detector = MockDetector::new().with_language("Bonjour", "fr");

    let output = nfo_processor::translate_document(
        "<movie><plot>Bonjour</plot><title>X</title></movie>",
        "test.nfo",
        &translator,
        &detector,
        "en",
    )
    .await?;

    let output = String::from_utf8(output)?;
    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(output.contains("<plot>Hello</plot>"));
    assert!(output.contains("<title>X</title>"));

    Ok(())
}

/// Test the idempotence guard: a field already in the target language is
/// left untouched and the translator is never called
#[tokio::test]
async fn test_translate_document_withFieldInTargetLanguage_shouldNotTranslate() -> Result<()> {
    let translator = MockTranslator::new();
    let detector = MockDetector::new().with_language("Hello", "en");

    let output = nfo_processor::translate_document(
        "<movie><plot>Hello</plot></movie>",
        "test.nfo",
        &translator,
        &detector,
        "en",
    )
    .await?;

    let output = String::from_utf8(output)?;
    assert!(output.contains("<plot>Hello</plot>"));
    assert!(translator.recorded_calls().is_empty());

    Ok(())
}

/// Test that re-running translation on an already-translated document is a
/// fixed point
#[tokio::test]
async fn test_translate_document_withTranslatedDocument_shouldBeFixedPoint() -> Result<()> {
    let translator = MockTranslator::new()
        .with_translation("Bonjour", "Hello")
        .with_translation("Drame", "Drama");
    let first_detector = MockDetector::new()
        .with_language("Bonjour", "fr")
        .with_language("Drame", "fr");
    let second_detector = MockDetector::new()
        .with_language("Hello", "en")
        .with_language("Drama", "en");

    let first = nfo_processor::translate_document(
        "<movie><plot>Bonjour</plot><genre>Drame</genre></movie>",
        "test.nfo",
        &translator,
        &first_detector,
        "en",
    )
    .await?;
    let first = String::from_utf8(first)?;

    let second_translator = MockTranslator::new();
    let second = nfo_processor::translate_document(
        &first,
        "test.nfo",
        &second_translator,
        &second_detector,
        "en",
    )
    .await?;
    let second = String::from_utf8(second)?;

    assert_eq!(first, second);
    assert!(second_translator.recorded_calls().is_empty());

    Ok(())
}

/// Test that one field's translation failure keeps the original text and
/// does not block sibling fields
#[tokio::test]
async fn test_translate_document_withOneFailingField_shouldKeepOriginalAndContinue() -> Result<()> {
    let translator = MockTranslator::new()
        .with_translation("Guten Tag", "Good day")
        .failing_on("Bonjour");
    let detector = MockDetector::new()
        .with_language("Bonjour", "fr")
        .with_language("Guten Tag", "de");

    let output = nfo_processor::translate_document(
        "<movie><plot>Bonjour</plot><overview>Guten Tag</overview></movie>",
        "test.nfo",
        &translator,
        &detector,
        "en",
    )
    .await?;

    let output = String::from_utf8(output)?;
    assert!(output.contains("<plot>Bonjour</plot>"));
    assert!(output.contains("<overview>Good day</overview>"));

    Ok(())
}

/// Test that only the leading text segment of a translatable element is
/// translated; tail text after an empty child element stays as-is
#[tokio::test]
async fn test_translate_document_withEmptyChildInPlot_shouldNotTranslateTail() -> Result<()> {
    let translator = MockTranslator::new().with_translation("Part one.", "Premiere partie.");
    let detector = MockDetector::new();

    let output = nfo_processor::translate_document(
        "<movie><plot>Part one.<br/>Part two.</plot></movie>",
        "test.nfo",
        &translator,
        &detector,
        "fr",
    )
    .await?;

    let output = String::from_utf8(output)?;
    assert!(output.contains("<plot>Premiere partie.<br/>Part two.</plot>"));
    assert_eq!(translator.recorded_calls(), vec!["Part one.".to_string()]);

    Ok(())
}

/// Test that the skip path leaves the field byte-for-byte untouched,
/// surrounding whitespace included
#[tokio::test]
async fn test_translate_document_withPaddedFieldInTargetLanguage_shouldKeepWhitespace()
-> Result<()> {
    let translator = MockTranslator::new();
    let detector = MockDetector::new().with_language("Hello", "en");

    let output = nfo_processor::translate_document(
        "<movie><plot>  Hello  </plot></movie>",
        "test.nfo",
        &translator,
        &detector,
        "en",
    )
    .await?;

    let output = String::from_utf8(output)?;
    assert!(output.contains("<plot>  Hello  </plot>"));
    assert!(translator.recorded_calls().is_empty());

    Ok(())
}

/// Test that an undetectable field still goes through translation
#[tokio::test]
async fn test_translate_document_withUndetectableField_shouldTranslate() -> Result<()> {
    let translator = MockTranslator::new().with_translation("???", "!!!");
    let detector = MockDetector::new();

    let output = nfo_processor::translate_document(
        "<movie><plot>???</plot></movie>",
        "test.nfo",
        &translator,
        &detector,
        "en",
    )
    .await?;

    let output = String::from_utf8(output)?;
    assert!(output.contains("<plot>!!!</plot>"));

    Ok(())
}

/// Test that malformed markup is a parse error
#[tokio::test]
async fn test_translate_document_withMalformedMarkup_shouldFail() {
    let result = nfo_processor::translate_document(
        "<movie><plot>unclosed</movie>",
        "test.nfo",
        &MockTranslator::new(),
        &MockDetector::new(),
        "en",
    )
    .await;

    assert!(matches!(result, Err(MetadataError::MalformedMarkup { .. })));
}

/// Test that an empty file is reported as its own error condition
#[tokio::test]
async fn test_process_file_withEmptyFile_shouldFailWithEmptyFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file_path = common::create_test_file(temp_dir.path(), "empty.nfo", "")?;

    let result = nfo_processor::process_file(
        &file_path,
        &MockTranslator::new(),
        &MockDetector::new(),
        "en",
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Empty file"));

    Ok(())
}

/// Test that a file failing to parse after sanitizing is left byte-for-byte
/// intact on disk
#[tokio::test]
async fn test_process_file_withMalformedFile_shouldPreserveOriginal() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = "junk line\n<movie><plot>text</movei></movie>\n";
    let file_path = common::create_test_file(temp_dir.path(), "broken.nfo", original)?;

    let result = nfo_processor::process_file(
        &file_path,
        &MockTranslator::new(),
        &MockDetector::new(),
        "en",
    )
    .await;

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&file_path)?, original);

    Ok(())
}

/// Test that processing a well-formed polluted file strips the junk lines
/// and writes the declaration header
#[tokio::test]
async fn test_process_file_withPollutedFile_shouldSanitizeAndRewrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file_path = common::create_test_nfo(temp_dir.path(), "movie.nfo", "Bonjour")?;

    let translator = MockTranslator::new().with_translation("Bonjour", "Hello");
    let detector = MockDetector::new().with_language("Bonjour", "fr");

    nfo_processor::process_file(&file_path, &translator, &detector, "en").await?;

    let content = fs::read_to_string(&file_path)?;
    assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(!content.contains("Scraped by"));
    assert!(content.contains("<plot>Hello</plot>"));

    Ok(())
}
