/*!
 * Tests for reconciling oracle timestamps against the source lyrics
 */

use lyricvid::errors::TimelineError;
use lyricvid::lyrics::{LineTimeline, LyricLine};
use lyricvid::timeline::{TimelineReconciler, DEFAULT_PADDING_SECONDS};
use crate::common;

fn source(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

/// Test the two-line example: padding is cut short by the next start
#[test]
fn test_reconcile_withPaddingPastNextStart_shouldClampToNextStart() {
    let aligned = LineTimeline::from_lines(vec![
        LyricLine::new("こんにちわ世界", 0.0, 2.0),
        LyricLine::new("ありがと", 2.5, 4.0),
    ]);

    let result = TimelineReconciler::default()
        .reconcile(&source(&["こんにちは世界", "ありがとう"]), aligned)
        .unwrap();

    let lines = result.lines();
    assert_eq!(lines[0].text, "こんにちは世界");
    assert_eq!(lines[0].start, 0.0);
    assert_eq!(lines[0].end, 2.5);
    assert_eq!(lines[1].text, "ありがとう");
    assert_eq!(lines[1].start, 2.5);
    assert_eq!(lines[1].end, 4.0);
}

/// Test that a wide gap receives the full padding
#[test]
fn test_reconcile_withWideGap_shouldAddFullPadding() {
    let aligned = common::aligned_timeline(&[(0.0, 2.0), (10.0, 12.0)]);
    let result = TimelineReconciler::default()
        .reconcile(&source(&["a", "b"]), aligned)
        .unwrap();

    assert_eq!(result.lines()[0].end, 2.0 + DEFAULT_PADDING_SECONDS);
    assert_eq!(result.lines()[1].end, 12.0);
}

/// Test that every oracle text is replaced and start times never move
#[test]
fn test_reconcile_withMisheardText_shouldRestoreSourceAndKeepStarts() {
    let spans = [(0.5, 1.0), (1.2, 3.0), (3.1, 3.5), (6.0, 7.0)];
    let aligned = common::aligned_timeline(&spans);
    let lyrics = source(&["one", "two", "three", "four"]);

    let result = TimelineReconciler::new(0.75).reconcile(&lyrics, aligned).unwrap();

    assert_eq!(result.texts(), lyrics);
    for (line, &(start, _)) in result.iter().zip(spans.iter()) {
        assert_eq!(line.start, start);
    }
    assert!(result.overlapping_pairs().is_empty());
}

/// Test that overlapping oracle output is repaired
#[test]
fn test_reconcile_withOverlappingOracleLines_shouldRemoveOverlap() {
    let aligned = common::aligned_timeline(&[(0.0, 5.0), (3.0, 6.0), (6.0, 8.0)]);
    let result = TimelineReconciler::default()
        .reconcile(&source(&["a", "b", "c"]), aligned)
        .unwrap();

    assert_eq!(result.lines()[0].end, 3.0);
    assert_eq!(result.lines()[1].end, 6.0);
    assert_eq!(result.lines()[2].end, 8.0);
    assert!(result.overlapping_pairs().is_empty());
}

/// Test that a different line count is an alignment mismatch
#[test]
fn test_reconcile_withLineCountMismatch_shouldFail() {
    let aligned = common::aligned_timeline(&[(0.0, 1.0), (1.0, 2.0)]);
    let result = TimelineReconciler::default().reconcile(&source(&["a", "b", "c"]), aligned);

    assert_eq!(result, Err(TimelineError::AlignmentMismatch { expected: 3, actual: 2 }));
}

/// Test that translations on the oracle lines survive reconciliation
#[test]
fn test_reconcile_withExistingTranslations_shouldKeepThem() {
    let aligned = LineTimeline::from_lines(vec![LyricLine::new("x", 0.0, 1.0).with_translation("en", "X")]);
    let result = TimelineReconciler::default().reconcile(&source(&["y"]), aligned).unwrap();

    assert_eq!(result.lines()[0].text, "y");
    assert_eq!(result.lines()[0].translation("en"), Some("X"));
}
