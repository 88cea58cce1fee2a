use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::process::Command;

use crate::app_config::RenderConfig;
use crate::errors::RenderError;
use crate::render::{RenderJob, Renderer};
use crate::subtitle::{SubtitleEntry, SubtitleRole, VerticalAnchor};

// @module: ffmpeg/ffprobe backed renderer

/// Name of the filter script written to the work directory
const FILTER_SCRIPT_NAME: &str = "captions.filter";

/// Renderer driving the ffmpeg and ffprobe binaries
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    config: RenderConfig,
}

impl FfmpegRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    async fn run_tool(&self, tool: &str, args: &[String]) -> Result<Output, RenderError> {
        debug!("Running {} {}", tool, args.join(" "));
        Command::new(tool)
            .args(args)
            .output()
            .await
            .map_err(|e| RenderError::ToolUnavailable {
                tool: tool.to_string(),
                reason: e.to_string(),
            })
    }

    /// Duration of a media file in seconds
    pub async fn probe_duration(&self, path: &Path) -> Result<f64, RenderError> {
        let args = vec![
            "-v".to_string(), "error".to_string(),
            "-show_entries".to_string(), "format=duration".to_string(),
            "-of".to_string(), "default=noprint_wrappers=1:nokey=1".to_string(),
            path.to_string_lossy().to_string(),
        ];
        let output = self.run_tool(&self.config.ffprobe_path, &args).await?;
        if !output.status.success() {
            return Err(RenderError::Probe {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.trim().parse::<f64>().map_err(|e| RenderError::Probe {
            path: path.display().to_string(),
            reason: format!("unparseable duration '{}': {}", stdout.trim(), e),
        })
    }

    /// Width and height of an image or video stream
    pub async fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32), RenderError> {
        let args = vec![
            "-v".to_string(), "error".to_string(),
            "-select_streams".to_string(), "v:0".to_string(),
            "-show_entries".to_string(), "stream=width,height".to_string(),
            "-of".to_string(), "csv=s=x:p=0".to_string(),
            path.to_string_lossy().to_string(),
        ];
        let output = self.run_tool(&self.config.ffprobe_path, &args).await?;
        if !output.status.success() {
            return Err(RenderError::Probe {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_dimensions(stdout.trim()).ok_or_else(|| RenderError::Probe {
            path: path.display().to_string(),
            reason: format!("unparseable dimensions '{}'", stdout.trim()),
        })
    }

    /// Write caption text files and return the filter graph using them
    pub async fn write_filter_graph(
        &self,
        entries: &[SubtitleEntry],
        frame_width: u32,
        workdir: &Path,
    ) -> Result<String, RenderError> {
        // yuv420p needs even dimensions
        let mut filters = vec!["scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string()];
        let max_width = frame_width as f64 * self.config.caption_width_ratio;

        for (i, entry) in entries.iter().enumerate() {
            let text_path = workdir.join(format!("caption_{:04}.txt", i));
            let wrapped = wrap_caption(&entry.text, entry.font_size, max_width).join("\n");
            tokio::fs::write(&text_path, wrapped).await?;
            filters.push(self.drawtext(entry, &text_path));
        }

        Ok(format!("[0:v]{}[v]", filters.join(",")))
    }

    fn drawtext(&self, entry: &SubtitleEntry, text_path: &Path) -> String {
        let font = match entry.role {
            SubtitleRole::Primary => &self.config.primary_font,
            SubtitleRole::Translation => &self.config.translation_font,
        };

        let mut options = vec![
            format!("textfile='{}'", escape_filter_value(&text_path.to_string_lossy())),
            "expansion=none".to_string(),
            format!("font='{}'", escape_filter_value(font)),
            format!("fontsize={}", entry.font_size),
            format!("fontcolor={}", ffmpeg_color(&self.config.font_color)),
            "x=(w-text_w)/2".to_string(),
            format!("y={}", y_expression(&entry.anchor)),
        ];

        if self.config.outline_width > 0 {
            options.push(format!("borderw={}", self.config.outline_width));
            options.push(format!("bordercolor={}", ffmpeg_color(&self.config.outline_color)));
        }

        if let Some(alpha) = alpha_expression(entry) {
            options.push(format!("alpha='{}'", alpha));
        }

        options.push(format!("enable='between(t,{:.3},{:.3})'", entry.start, entry.end));
        format!("drawtext={}", options.join(":"))
    }

    /// Command-line arguments for the final encode
    pub fn build_args(&self, job: &RenderJob<'_>, filter_script: &Path) -> Vec<String> {
        let c = &self.config;
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(), "error".to_string(),
            "-loop".to_string(), "1".to_string(),
            "-framerate".to_string(), c.fps.to_string(),
            "-i".to_string(), job.image.to_string_lossy().to_string(),
            "-i".to_string(), job.audio.to_string_lossy().to_string(),
            "-filter_complex_script".to_string(), filter_script.to_string_lossy().to_string(),
            "-map".to_string(), "[v]".to_string(),
            "-map".to_string(), "1:a".to_string(),
            "-c:v".to_string(), c.video_codec.clone(),
            "-preset".to_string(), c.preset.clone(),
            "-tune".to_string(), "stillimage".to_string(),
            "-pix_fmt".to_string(), "yuv420p".to_string(),
            "-c:a".to_string(), c.audio_codec.clone(),
            "-threads".to_string(), c.threads.to_string(),
            "-t".to_string(), format!("{:.3}", job.subtitles.media_duration),
            "-shortest".to_string(),
            job.output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn media_duration(&self, media: &Path) -> Result<f64, RenderError> {
        self.probe_duration(media).await
    }

    async fn render(&self, job: &RenderJob<'_>) -> Result<(), RenderError> {
        let (width, height) = self.probe_dimensions(job.image).await?;
        debug!("Background image is {}x{}", width, height);

        let graph = self.write_filter_graph(&job.subtitles.entries, width, job.workdir).await?;
        let script_path: PathBuf = job.workdir.join(FILTER_SCRIPT_NAME);
        tokio::fs::write(&script_path, graph).await?;

        if let Some(parent) = job.output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let args = self.build_args(job, &script_path);
        let output = self.run_tool(&self.config.ffmpeg_path, &args).await?;
        if !output.status.success() {
            let stderr = filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr));
            error!("ffmpeg failed: {}", stderr);
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        info!(
            "Rendered {} captions to {}",
            job.subtitles.len(),
            job.output.display()
        );
        Ok(())
    }
}

fn parse_dimensions(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.lines().next()?.split_once('x')?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

/// Escape a value placed inside single quotes in a filter graph
fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// `#RRGGBB` to ffmpeg's `0xRRGGBB`; named colors pass through
fn ffmpeg_color(color: &str) -> String {
    match color.strip_prefix('#') {
        Some(hex) => format!("0x{}", hex),
        None => color.to_string(),
    }
}

fn y_expression(anchor: &VerticalAnchor) -> String {
    match *anchor {
        VerticalAnchor::AboveBottomMargin { margin } => format!("h-text_h-{}", margin),
        VerticalAnchor::BelowBottomMargin { margin, offset } => format!("h-{}+{}", margin, offset),
    }
}

/// Linear fade in and out, limited to half the entry's duration
fn alpha_expression(entry: &SubtitleEntry) -> Option<String> {
    let half = entry.duration() / 2.0;
    let fade_in = entry.fade_in.map(|f| f.min(half)).filter(|f| *f > 0.0);
    let fade_out = entry.fade_out.map(|f| f.min(half)).filter(|f| *f > 0.0);
    if fade_in.is_none() && fade_out.is_none() {
        return None;
    }

    let fade_out_part = match fade_out {
        Some(f) => format!("if(gt(t,{e:.3}-{f:.3}),({e:.3}-t)/{f:.3},1)", e = entry.end, f = f),
        None => "1".to_string(),
    };

    Some(match fade_in {
        Some(f) => format!(
            "if(lt(t,{s:.3}+{f:.3}),(t-{s:.3})/{f:.3},{rest})",
            s = entry.start,
            f = f,
            rest = fade_out_part
        ),
        None => fade_out_part,
    })
}

/// Approximate rendered width of `text` in pixels
pub fn estimate_width(text: &str, font_size: u32) -> f64 {
    text.chars()
        .map(|c| if c.is_ascii() { 0.55 } else { 1.0 })
        .sum::<f64>()
        * font_size as f64
}

/// Break a caption into lines no wider than `max_width` pixels
///
/// Breaks at spaces where possible. Words wider than a line (and unspaced
/// CJK text) are broken between characters.
pub fn wrap_caption(text: &str, font_size: u32, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if estimate_width(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        for ch in word.chars() {
            current.push(ch);
            if current.chars().count() > 1 && estimate_width(&current, font_size) > max_width {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Keep only meaningful ffmpeg error lines
fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "libav",
        "libsw",
        "libpostproc",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
