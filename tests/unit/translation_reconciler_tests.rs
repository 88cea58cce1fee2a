/*!
 * Tests for line-count exact translation with temperature escalation
 */

use std::time::Duration;

use lyricvid::app_config::{ResponseFormat, TranslationCommonConfig};
use lyricvid::errors::{AttemptOutcome, TranslationError};
use lyricvid::lyrics::{LineTimeline, LyricLine};
use lyricvid::translation::TranslationReconciler;
use crate::common;
use crate::common::mock_oracles::{Reply, ScriptedOracle};

fn reconciler() -> TranslationReconciler {
    TranslationReconciler::new("ja", "en", &TranslationCommonConfig::default())
}

/// Test that a correct first response needs a single attempt
#[tokio::test]
async fn test_translate_withExactResponse_shouldUseOneAttempt() {
    let lines = common::sample_source_lines();
    let oracle = ScriptedOracle::always(common::pairs_response(&lines));

    let translations = reconciler().translate(&lines, &oracle).await.unwrap();

    assert_eq!(translations, vec!["translation 0", "translation 1", "translation 2"]);
    assert_eq!(oracle.call_count(), 1);
    assert_eq!(oracle.temperatures(), vec![0.0]);
}

/// Test that a permanently wrong line count exhausts the schedule
#[tokio::test]
async fn test_translate_withAlwaysWrongLineCount_shouldFailAfterSixAttempts() {
    let lines = common::sample_source_lines();
    let oracle = ScriptedOracle::always("only,one line");

    let error = reconciler().translate(&lines, &oracle).await.unwrap_err();

    assert_eq!(oracle.call_count(), 6);
    assert_eq!(oracle.temperatures(), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    match error {
        TranslationError::FormatError { expected, attempts } => {
            assert_eq!(expected, 3);
            assert_eq!(attempts.len(), 6);
            assert!(attempts.iter().all(|a| a.outcome == AttemptOutcome::LineCount(1)));
            let temps: Vec<f32> = attempts.iter().map(|a| a.temperature).collect();
            assert_eq!(temps, vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        }
        other => panic!("expected FormatError, got {:?}", other),
    }
}

/// Test that escalation stops at the first acceptable response
#[tokio::test]
async fn test_translate_withSuccessOnThirdAttempt_shouldStopEscalating() {
    let lines = common::sample_source_lines();
    let oracle = ScriptedOracle::new(vec![
        Reply::Text("a,b".to_string()),
        Reply::Text("a,b\nc,d\ne,f\ng,h".to_string()),
        Reply::Text(common::pairs_response(&lines)),
        Reply::Text("never reached".to_string()),
    ]);

    let translations = reconciler().translate(&lines, &oracle).await.unwrap();

    assert_eq!(translations.len(), 3);
    assert_eq!(oracle.temperatures(), vec![0.0, 0.2, 0.4]);
}

/// Test that oracle failures count as failed attempts
#[tokio::test]
async fn test_translate_withOracleFailure_shouldRetryAtNextTemperature() {
    let lines = common::sample_source_lines();
    let oracle = ScriptedOracle::new(vec![
        Reply::Fail,
        Reply::Text(common::pairs_response(&lines)),
    ]);

    let translations = reconciler().translate(&lines, &oracle).await.unwrap();

    assert_eq!(translations[0], "translation 0");
    assert_eq!(oracle.temperatures(), vec![0.0, 0.2]);
}

/// Test that an oracle that never answers is cut off and counted
#[tokio::test]
async fn test_translate_withHangingOracle_shouldTimeOutAttempt() {
    let lines = vec!["一".to_string()];
    let oracle = ScriptedOracle::new(vec![Reply::Hang]);

    let error = reconciler()
        .with_temperatures(vec![0.0, 0.5])
        .with_attempt_timeout(Duration::from_millis(20))
        .translate(&lines, &oracle)
        .await
        .unwrap_err();

    match error {
        TranslationError::FormatError { attempts, .. } => {
            assert_eq!(attempts.len(), 2);
            assert!(attempts
                .iter()
                .all(|a| matches!(&a.outcome, AttemptOutcome::OracleFailure(reason) if reason.contains("timed out"))));
        }
        other => panic!("expected FormatError, got {:?}", other),
    }
}

/// Test that every attempt carries the same seed and prompt
#[tokio::test]
async fn test_translate_shouldSendFixedSeedAndSamePrompt() {
    let lines = common::sample_source_lines();
    let oracle = ScriptedOracle::new(vec![
        Reply::Text("wrong".to_string()),
        Reply::Text(common::pairs_response(&lines)),
    ]);

    reconciler().translate(&lines, &oracle).await.unwrap();

    let requests = oracle.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.seed == 42));
    assert_eq!(requests[0].prompt, requests[1].prompt);
    assert_eq!(requests[0].system, requests[1].system);
    assert!(requests[0].system.contains("Japanese"));
    assert!(requests[0].system.contains("English"));
    assert!(requests[0].prompt.ends_with(&lines.join("\n")));
}

/// Test that empty input never reaches the oracle
#[tokio::test]
async fn test_translate_withNoLines_shouldNotCallOracle() {
    let oracle = ScriptedOracle::always("anything");

    let translations = reconciler().translate(&[], &oracle).await.unwrap();

    assert!(translations.is_empty());
    assert_eq!(oracle.call_count(), 0);
}

/// Test the JSON array response format end to end
#[tokio::test]
async fn test_translate_withJsonArrayFormat_shouldParseArray() {
    let common_config = TranslationCommonConfig {
        response_format: ResponseFormat::JsonArray,
        ..Default::default()
    };
    let lines = vec!["一".to_string(), "二".to_string()];
    let oracle = ScriptedOracle::always("```json\n[\"one\", \"two\"]\n```");

    let translations = TranslationReconciler::new("ja", "en", &common_config)
        .translate(&lines, &oracle)
        .await
        .unwrap();

    assert_eq!(translations, vec!["one", "two"]);
}

/// Test that translate_timeline attaches translations under the language key
#[tokio::test]
async fn test_translateTimeline_shouldAttachTranslationsInOrder() {
    let mut timeline = LineTimeline::from_lines(vec![
        LyricLine::new("こんにちは世界", 0.0, 2.5),
        LyricLine::new("ありがとう", 2.5, 4.0),
    ]);
    let oracle = ScriptedOracle::always("こんにちは世界,Hello world\nありがとう,Thank you");

    reconciler().translate_timeline(&mut timeline, "en", &oracle).await.unwrap();

    assert_eq!(timeline.lines()[0].translation("en"), Some("Hello world"));
    assert_eq!(timeline.lines()[1].translation("en"), Some("Thank you"));
    assert_eq!(timeline.lines()[0].end, 2.5);
}

/// Test that a failed translation leaves the timeline untouched
#[tokio::test]
async fn test_translateTimeline_withFormatError_shouldLeaveTimelineUnchanged() {
    let mut timeline = LineTimeline::from_lines(vec![LyricLine::new("a", 0.0, 1.0), LyricLine::new("b", 1.0, 2.0)]);
    let before = timeline.clone();
    let oracle = ScriptedOracle::always("a,A");

    let result = reconciler()
        .with_temperatures(vec![0.0])
        .translate_timeline(&mut timeline, "en", &oracle)
        .await;

    assert!(matches!(result, Err(TranslationError::FormatError { expected: 2, .. })));
    assert_eq!(timeline, before);
}
