/*!
 * Tests for parsing oracle responses into translations
 */

use lyricvid::app_config::ResponseFormat;
use lyricvid::errors::AttemptOutcome;
use lyricvid::translation::response::{parse_response, strip_code_fences};

fn sources(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

/// Test a fenced pairs block with surrounding blank lines
#[test]
fn test_parseResponse_withFencedPairs_shouldReturnTranslations() {
    let response = "\n```\nこんにちは世界,Hello world\n\nありがとう,Thank you\n```\n";
    let result = parse_response(ResponseFormat::Pairs, response, &sources(&["こんにちは世界", "ありがとう"]));
    assert_eq!(result, Ok(vec!["Hello world".to_string(), "Thank you".to_string()]));
}

/// Test that a line echoing a comma-bearing original is left untranslated
#[test]
fn test_parseResponse_withEchoedOriginal_shouldYieldEmptyTranslation() {
    let response = "oh, yeah\nありがとう,Thank you";
    let result = parse_response(ResponseFormat::Pairs, response, &sources(&["oh, yeah", "ありがとう"]));
    assert_eq!(result, Ok(vec![String::new(), "Thank you".to_string()]));
}

/// Test that an introductory sentence breaks the line count
#[test]
fn test_parseResponse_withPreamble_shouldRejectOnLineCount() {
    let response = "Here are the translations:\na,A\nb,B";
    let result = parse_response(ResponseFormat::Pairs, response, &sources(&["a", "b"]));
    assert_eq!(result, Err(AttemptOutcome::LineCount(3)));
}

/// Test that an empty response is a zero line count
#[test]
fn test_parseResponse_withEmptyResponse_shouldReportZeroLines() {
    let result = parse_response(ResponseFormat::Pairs, "   \n\n", &sources(&["a"]));
    assert_eq!(result, Err(AttemptOutcome::LineCount(0)));
}

/// Test a JSON array with the wrong number of items
#[test]
fn test_parseResponse_withShortJsonArray_shouldReportCount() {
    let result = parse_response(ResponseFormat::JsonArray, r#"["one"]"#, &sources(&["一", "二"]));
    assert_eq!(result, Err(AttemptOutcome::LineCount(1)));
}

/// Test that fences are removed but their content kept
#[test]
fn test_stripCodeFences_shouldKeepInnerLines() {
    let stripped = strip_code_fences("```json\n[1]\n```");
    assert_eq!(stripped.trim(), "[1]");
}
