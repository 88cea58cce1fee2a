use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::alignment::{AlignedLine, AlignmentOracle, AlignmentRequestLine, aligned_to_timeline};
use crate::app_config::AlignmentConfig;
use crate::errors::{AlignmentError, ProviderError};
use crate::lyrics::LineTimeline;

/// Result key holding the aligned lyrics
const ALIGNED_LYRICS_KEY: &str = "aligned_lyrics";

/// Music.ai workflow client for lyric alignment
#[derive(Debug)]
pub struct MusicAiAligner {
    client: Client,
    api_key: String,
    endpoint: String,
    workflow_slug: String,
    poll_interval: Duration,
    job_timeout: Duration,
    timeout_secs: u64,
}

/// Signed URLs for one upload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrls {
    pub upload_url: String,
    pub download_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobParams {
    music_url: String,
    lyrics_url: String,
}

#[derive(Debug, Serialize)]
struct CreateJobRequest {
    name: String,
    workflow: String,
    params: JobParams,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    id: String,
}

/// Job state as reported by `GET /api/job/{id}`
#[derive(Debug, Deserialize)]
pub struct JobInfo {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
}

/// Decoded `aligned_lyrics` value
#[derive(Debug, PartialEq)]
pub enum AlignedLyricsPayload {
    /// Lines delivered inline
    Lines(Vec<AlignedLine>),
    /// Lines must be downloaded from this URL
    Url(String),
}

/// Interpret an `aligned_lyrics` result value
///
/// The workflow may deliver a JSON-encoded string, a JSON array, or a URL
/// pointing at the JSON document.
pub fn decode_aligned_lyrics(value: &Value) -> Result<AlignedLyricsPayload, AlignmentError> {
    match value {
        Value::Array(_) => serde_json::from_value(value.clone())
            .map(AlignedLyricsPayload::Lines)
            .map_err(|e| AlignmentError::MalformedResult(e.to_string())),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('[') {
                serde_json::from_str(trimmed)
                    .map(AlignedLyricsPayload::Lines)
                    .map_err(|e| AlignmentError::MalformedResult(e.to_string()))
            } else if Url::parse(trimmed).is_ok() {
                Ok(AlignedLyricsPayload::Url(trimmed.to_string()))
            } else {
                Err(AlignmentError::MalformedResult(format!(
                    "'{}' is neither a JSON array nor a URL",
                    trimmed
                )))
            }
        }
        other => Err(AlignmentError::MalformedResult(format!(
            "unexpected {} value",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" | "aac" => "audio/mp4",
        "ogg" | "opus" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

impl MusicAiAligner {
    pub fn from_config(config: &AlignmentConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            workflow_slug: config.workflow_slug.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            timeout_secs: config.timeout_secs,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.endpoint, path)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        Err(ProviderError::from_status(status.as_u16(), text))
    }

    /// Application info for the API key, used as a connection check
    pub async fn application_info(&self) -> Result<Value, ProviderError> {
        let response = self.client.get(self.api_url("application"))
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;
        self.check(response).await?
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Upload bytes and return the download URL the workflow can read
    pub async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ProviderError> {
        let response = self.client.get(self.api_url("upload"))
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;
        let urls = self.check(response).await?
            .json::<UploadUrls>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Invalid upload response: {}", e)))?;

        let response = self.client.put(&urls.upload_url)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;
        self.check(response).await?;

        debug!("Uploaded {} to {}", content_type, urls.download_url);
        Ok(urls.download_url)
    }

    async fn create_job(&self, music_url: String, lyrics_url: String) -> Result<String, ProviderError> {
        let request = CreateJobRequest {
            name: uuid::Uuid::new_v4().to_string(),
            workflow: self.workflow_slug.clone(),
            params: JobParams { music_url, lyrics_url },
        };

        let response = self.client.post(self.api_url("job"))
            .header("Authorization", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;
        let job = self.check(response).await?
            .json::<CreateJobResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Invalid job response: {}", e)))?;
        Ok(job.id)
    }

    /// Current state of a job
    pub async fn get_job(&self, job_id: &str) -> Result<JobInfo, ProviderError> {
        let response = self.client.get(self.api_url(&format!("job/{}", job_id)))
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;
        self.check(response).await?
            .json::<JobInfo>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Invalid job info: {}", e)))
    }

    async fn wait_for_job(&self, job_id: &str) -> Result<JobInfo, AlignmentError> {
        loop {
            let job = self.get_job(job_id).await?;
            match job.status.as_str() {
                "SUCCEEDED" => return Ok(job),
                "FAILED" => {
                    return Err(AlignmentError::JobFailed {
                        job_id: job_id.to_string(),
                        status: job.status,
                    });
                }
                status => debug!("Job {} is {}", job_id, status),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn fetch_aligned_lines(&self, url: &str) -> Result<Vec<AlignedLine>, AlignmentError> {
        let response = self.client.get(url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;
        let response = self.check(response).await?;
        response.json::<Vec<AlignedLine>>()
            .await
            .map_err(|e| AlignmentError::MalformedResult(e.to_string()))
    }
}

#[async_trait]
impl AlignmentOracle for MusicAiAligner {
    async fn align(&self, audio: &Path, lines: &[AlignmentRequestLine]) -> Result<LineTimeline, AlignmentError> {
        // Fail on a bad key or endpoint before uploading anything
        let application = self.application_info().await?;
        debug!(
            "Connected to music.ai as {}",
            application.get("name").and_then(Value::as_str).unwrap_or("unnamed application")
        );

        let audio_bytes = tokio::fs::read(audio).await?;
        let lyrics_bytes = serde_json::to_vec(lines)
            .map_err(|e| AlignmentError::MalformedResult(e.to_string()))?;

        let music_url = self.upload(audio_bytes, content_type_for(audio)).await?;
        let lyrics_url = self.upload(lyrics_bytes, "application/json").await?;

        let job_id = self.create_job(music_url, lyrics_url).await?;
        info!("Created alignment job {} ({})", job_id, self.workflow_slug);

        let job = tokio::time::timeout(self.job_timeout, self.wait_for_job(&job_id))
            .await
            .map_err(|_| ProviderError::Timeout(self.job_timeout.as_secs()))??;

        let value = job.result
            .as_ref()
            .and_then(|result| result.get(ALIGNED_LYRICS_KEY))
            .ok_or_else(|| AlignmentError::MalformedResult(format!(
                "job {} has no '{}' result",
                job_id, ALIGNED_LYRICS_KEY
            )))?;

        let aligned = match decode_aligned_lyrics(value)? {
            AlignedLyricsPayload::Lines(lines) => lines,
            AlignedLyricsPayload::Url(url) => self.fetch_aligned_lines(&url).await?,
        };

        info!("Alignment job {} returned {} lines", job_id, aligned.len());
        Ok(aligned_to_timeline(aligned))
    }

    fn name(&self) -> &str {
        "music.ai"
    }
}
