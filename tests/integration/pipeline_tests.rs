/*!
 * Integration tests for the create pipeline
 *
 * The controller is driven end to end with scripted oracles and a recording
 * renderer in place of the network services and ffmpeg.
 */

use std::fs;

use anyhow::Result;
use lyricvid::alignment;
use lyricvid::app_config::{AlignmentProvider, Config, TranslationProvider};
use lyricvid::app_controller::{Controller, CreateRequest};
use lyricvid::errors::{AppError, TimelineError, TranslationError};
use lyricvid::lyrics::LineTimeline;
use lyricvid::subtitle::SubtitleRole;
use crate::common::{self, PipelineInputs};
use crate::common::mock_oracles::{FixedAligner, RecordingRenderer, ScriptedOracle};

fn create_request(inputs: &PipelineInputs) -> CreateRequest {
    CreateRequest {
        lyrics: inputs.lyrics.clone(),
        audio: inputs.audio.clone(),
        image: inputs.image.clone(),
        output: inputs.output.clone(),
        timeline_out: None,
        translate: true,
        force_overwrite: false,
    }
}

fn sample_aligner() -> FixedAligner {
    FixedAligner::new(common::aligned_timeline(&[(0.0, 2.0), (2.5, 4.0), (6.0, 9.0)]))
}

/// Test a full run: align, translate, build the subtitles and render
#[tokio::test]
async fn test_run_withAllStages_shouldRenderBilingualSubtitles() -> Result<()> {
    common::init_logging();
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let controller = Controller::new_for_test()?;
    let aligner = sample_aligner();
    let oracle = ScriptedOracle::always(common::pairs_response(&common::sample_source_lines()));
    let renderer = RecordingRenderer::new(60.0);

    let report = controller
        .run_with(create_request(&inputs), &aligner, Some(&oracle), &renderer)
        .await?
        .expect("pipeline should not be skipped");

    assert_eq!(report.line_count, 3);
    assert_eq!(report.entry_count, 6);
    assert_eq!(report.skipped_count, 0);
    assert_eq!(report.missing_translation_count, 0);
    assert_eq!(report.output, inputs.output);
    assert!(inputs.output.exists());

    let requests = aligner.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].iter().map(|l| l.text.clone()).collect::<Vec<_>>(),
        common::sample_source_lines()
    );
    assert!(requests[0].iter().all(|l| l.language == "japanese"));

    assert_eq!(oracle.call_count(), 1);
    assert_eq!(renderer.render_count(), 1);

    let subtitles = renderer.last_rendered().expect("renderer should have been called");
    let primary: Vec<_> = subtitles.entries_with_role(SubtitleRole::Primary).collect();
    assert_eq!(primary[0].text, "こんにちは世界");
    assert_eq!(primary[0].end, 2.5);
    assert_eq!(primary[1].end, 5.0);
    assert_eq!(primary[2].end, 9.0);

    let translations: Vec<_> = subtitles
        .entries_with_role(SubtitleRole::Translation)
        .map(|e| e.text.clone())
        .collect();
    assert_eq!(translations, vec!["translation 0", "translation 1", "translation 2"]);

    Ok(())
}

/// Test that an existing output is left alone without force
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipWithoutForce() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    fs::create_dir_all(inputs.output.parent().unwrap())?;
    fs::write(&inputs.output, "previous render")?;

    let controller = Controller::new_for_test()?;
    let aligner = sample_aligner();
    let renderer = RecordingRenderer::new(60.0);

    let report = controller
        .run_with(create_request(&inputs), &aligner, None, &renderer)
        .await?;

    assert!(report.is_none());
    assert!(aligner.requests().is_empty());
    assert_eq!(renderer.render_count(), 0);
    assert_eq!(fs::read_to_string(&inputs.output)?, "previous render");

    Ok(())
}

/// Test that force overwrite replaces an existing output
#[tokio::test]
async fn test_run_withExistingOutputAndForce_shouldRenderAgain() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    fs::create_dir_all(inputs.output.parent().unwrap())?;
    fs::write(&inputs.output, "previous render")?;

    let controller = Controller::new_for_test()?;
    let renderer = RecordingRenderer::new(60.0);
    let request = CreateRequest {
        force_overwrite: true,
        ..create_request(&inputs)
    };

    let report = controller.run_with(request, &sample_aligner(), None, &renderer).await?;

    assert!(report.is_some());
    assert_eq!(fs::read_to_string(&inputs.output)?, "mock video");

    Ok(())
}

/// Test a run without translation
#[tokio::test]
async fn test_run_withoutTranslation_shouldRenderPrimaryOnly() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let controller = Controller::new_for_test()?;
    let renderer = RecordingRenderer::new(60.0);

    let report = controller
        .run_with(create_request(&inputs), &sample_aligner(), None, &renderer)
        .await?
        .expect("pipeline should not be skipped");

    assert_eq!(report.entry_count, 3);
    assert_eq!(report.missing_translation_count, 3);
    let subtitles = renderer.last_rendered().expect("renderer should have been called");
    assert_eq!(subtitles.entries_with_role(SubtitleRole::Translation).count(), 0);

    Ok(())
}

/// Test that the reconciled, translated timeline can be saved for reuse
#[tokio::test]
async fn test_run_withTimelineOut_shouldSaveTranslatedTimeline() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let timeline_path = inputs.dir.path().join("song.timeline.json");
    let controller = Controller::new_for_test()?;
    let oracle = ScriptedOracle::always(common::pairs_response(&common::sample_source_lines()));
    let renderer = RecordingRenderer::new(60.0);
    let request = CreateRequest {
        timeline_out: Some(timeline_path.clone()),
        ..create_request(&inputs)
    };

    controller.run_with(request, &sample_aligner(), Some(&oracle), &renderer).await?;

    let saved = LineTimeline::load(&timeline_path)?;
    assert_eq!(saved.texts(), common::sample_source_lines());
    assert_eq!(saved.lines()[0].end, 2.5);
    assert_eq!(saved.lines()[2].translation("en"), Some("translation 2"));
    assert!(saved.overlapping_pairs().is_empty());

    Ok(())
}

/// Test that lines past the media end are clamped or skipped
#[tokio::test]
async fn test_run_withShortMedia_shouldClampAndSkip() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let controller = Controller::new_for_test()?;
    let renderer = RecordingRenderer::new(3.0);

    let report = controller
        .run_with(create_request(&inputs), &sample_aligner(), None, &renderer)
        .await?
        .expect("pipeline should not be skipped");

    assert_eq!(report.entry_count, 2);
    assert_eq!(report.skipped_count, 1);
    let subtitles = renderer.last_rendered().expect("renderer should have been called");
    assert!(subtitles.iter().all(|e| e.end <= 3.0));

    Ok(())
}

/// Test that a failed translation stops the pipeline before rendering
#[tokio::test]
async fn test_run_withTranslationFormatError_shouldNotRender() -> Result<()> {
    common::init_logging();
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let controller = Controller::new_for_test()?;
    let oracle = ScriptedOracle::always("one line only");
    let renderer = RecordingRenderer::new(60.0);

    let result = controller
        .run_with(create_request(&inputs), &sample_aligner(), Some(&oracle), &renderer)
        .await;

    match result {
        Err(AppError::Translation(TranslationError::FormatError { expected, attempts })) => {
            assert_eq!(expected, 3);
            assert_eq!(attempts.len(), 6);
        }
        other => panic!("expected translation format error, got {:?}", other),
    }
    assert_eq!(oracle.call_count(), 6);
    assert_eq!(renderer.render_count(), 0);
    assert!(!inputs.output.exists());

    Ok(())
}

/// Test that an alignment line count mismatch is reported
#[tokio::test]
async fn test_run_withAlignmentMismatch_shouldFail() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let controller = Controller::new_for_test()?;
    let aligner = FixedAligner::new(common::aligned_timeline(&[(0.0, 1.0), (1.0, 2.0)]));
    let renderer = RecordingRenderer::new(60.0);

    let result = controller
        .run_with(create_request(&inputs), &aligner, None, &renderer)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Timeline(TimelineError::AlignmentMismatch { expected: 3, actual: 2 }))
    ));
    assert_eq!(renderer.render_count(), 0);

    Ok(())
}

/// Test that renderer failures surface as render errors
#[tokio::test]
async fn test_run_withFailingRenderer_shouldReturnRenderError() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let controller = Controller::new_for_test()?;
    let renderer = RecordingRenderer::failing(60.0);

    let result = controller
        .run_with(create_request(&inputs), &sample_aligner(), None, &renderer)
        .await;

    assert!(matches!(result, Err(AppError::Render(_))));
    assert_eq!(renderer.render_count(), 1);

    Ok(())
}

/// Test that inputs of the wrong kind are rejected up front
#[tokio::test]
async fn test_run_withImageAsLyrics_shouldFailBeforeAlignment() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let controller = Controller::new_for_test()?;
    let aligner = sample_aligner();
    let renderer = RecordingRenderer::new(60.0);
    let request = CreateRequest {
        lyrics: inputs.image.clone(),
        ..create_request(&inputs)
    };

    let result = controller.run_with(request, &aligner, None, &renderer).await;

    assert!(matches!(result, Err(AppError::File(_))));
    assert!(aligner.requests().is_empty());

    Ok(())
}

/// Test that blank lyrics produce an empty video without calling any oracle
#[tokio::test]
async fn test_run_withBlankLyrics_shouldSkipOracles() -> Result<()> {
    let inputs = common::create_pipeline_inputs("\n   \n")?;
    let controller = Controller::new_for_test()?;
    let aligner = sample_aligner();
    let oracle = ScriptedOracle::always("unused");
    let renderer = RecordingRenderer::new(60.0);

    let report = controller
        .run_with(create_request(&inputs), &aligner, Some(&oracle), &renderer)
        .await?
        .expect("pipeline should not be skipped");

    assert_eq!(report.line_count, 0);
    assert_eq!(report.entry_count, 0);
    assert!(aligner.requests().is_empty());
    assert_eq!(oracle.call_count(), 0);

    Ok(())
}

/// Test the offline aligner through the configured factory
#[tokio::test]
async fn test_run_withUniformAligner_shouldSpaceLinesEvenly() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let mut config = Config::default();
    config.alignment.provider = AlignmentProvider::Uniform;
    config.alignment.uniform_spacing_secs = 4.0;
    config.alignment.uniform_duration_secs = 1.0;
    let aligner = alignment::from_config(&config.alignment);
    let controller = Controller::with_config(config)?;
    let renderer = RecordingRenderer::new(60.0);

    controller
        .run_with(create_request(&inputs), aligner.as_ref(), None, &renderer)
        .await?;

    let subtitles = renderer.last_rendered().expect("renderer should have been called");
    let spans: Vec<(f64, f64)> = subtitles.iter().map(|e| (e.start, e.end)).collect();
    assert_eq!(spans, vec![(0.0, 2.0), (4.0, 6.0), (8.0, 9.0)]);

    Ok(())
}

/// Test that an output naming one of the inputs is refused without touching it
#[tokio::test]
async fn test_run_withOutputOverAudio_shouldFailWithoutOverwriting() -> Result<()> {
    let inputs = common::create_pipeline_inputs(common::SAMPLE_LYRICS)?;
    let controller = Controller::new_for_test()?;
    let aligner = sample_aligner();
    let renderer = RecordingRenderer::new(60.0);
    let request = CreateRequest {
        output: inputs.audio.clone(),
        force_overwrite: true,
        ..create_request(&inputs)
    };

    let result = controller.run_with(request, &aligner, None, &renderer).await;

    assert!(matches!(result, Err(AppError::File(_))), "got {:?}", result);
    assert!(aligner.requests().is_empty());
    assert_eq!(renderer.render_count(), 0);
    assert_eq!(fs::read_to_string(&inputs.audio)?, "not really audio");

    Ok(())
}

/// Test that an unreachable translation provider fails before any request is sent
#[tokio::test]
async fn test_runTranslate_withUnreachableProvider_shouldFailConnectionCheck() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let timeline_path = dir.path().join("song.timeline.json");
    common::aligned_timeline(&[(0.0, 2.0), (2.5, 4.0)]).save(&timeline_path)?;

    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config.translation.active_provider_config_mut().endpoint = "http://127.0.0.1:9".to_string();
    config.translation.active_provider_config_mut().timeout_secs = 2;
    let controller = Controller::with_config(config)?;

    let result = controller.run_translate(&timeline_path).await;

    assert!(matches!(result, Err(AppError::Provider(_))), "got {:?}", result);

    Ok(())
}
