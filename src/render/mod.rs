/*!
 * Media rendering.
 *
 * A renderer composes the background image, the audio track and the
 * subtitle entries into a video file. It also reports the media duration
 * that the subtitle builder clamps against.
 */

use std::path::Path;

use async_trait::async_trait;

use crate::errors::RenderError;
use crate::subtitle::SubtitleTimeline;

pub mod ffmpeg;

pub use ffmpeg::FfmpegRenderer;

/// Everything needed to render one video
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    pub subtitles: &'a SubtitleTimeline,
    pub image: &'a Path,
    pub audio: &'a Path,
    pub output: &'a Path,
    /// Scratch directory owned by the request
    pub workdir: &'a Path,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Duration of a media file in seconds
    async fn media_duration(&self, media: &Path) -> Result<f64, RenderError>;

    /// Render the job to `job.output`
    async fn render(&self, job: &RenderJob<'_>) -> Result<(), RenderError>;
}
