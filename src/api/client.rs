use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::{multipart, Body, Client, StatusCode};
use tokio_util::io::ReaderStream;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    JobSnapshot, ProcessingOutcome, StageKind, StageResultEnvelope, StageResultResponse,
};
use crate::submit::{PipelineOptions, UploadCandidate, UploadProgress};

/// Abstract contract of the remote pipeline service.
///
/// The tracker consumes five operations: a read-many job list, a read-one
/// job detail, a best-effort per-stage result fetch, the one-shot
/// submission, and a playable stream reference. Implementations must treat
/// a 404 on the per-stage fetch as a normal outcome, never an error.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Fetch the full job list snapshot.
    async fn list_jobs(&self) -> Result<Vec<JobSnapshot>>;

    /// Fetch one job's snapshot.
    async fn get_job(&self, id: &str) -> Result<JobSnapshot>;

    /// Fetch one stage's retained result. `Ok(None)` means the stage has
    /// not yet produced output, the server did not retain it, or the stage
    /// has no standalone result endpoint.
    async fn stage_result(&self, id: &str, stage: StageKind)
        -> Result<Option<StageResultEnvelope>>;

    /// Submit a file for end-to-end processing. Long-lived: the response
    /// arrives only after the server-side pipeline has run to termination.
    /// Byte-level transport progress is reported through `progress`.
    async fn process_video(
        &self,
        upload: &UploadCandidate,
        options: &PipelineOptions,
        progress: UploadProgress,
    ) -> Result<ProcessingOutcome>;

    /// Playable reference for a job's final artifact; only meaningful once
    /// the job's overall status is completed.
    fn stream_url(&self, id: &str) -> String;
}

/// HTTP implementation of [`PipelineApi`] over the pipeline service's REST
/// surface.
pub struct HttpPipelineApi {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl HttpPipelineApi {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .connect_timeout(config.api.connect_timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeouts: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.api.request_timeout(),
            upload_timeout: config.upload.timeout(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.client
            .get(self.url(path))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.request_timeout))
    }

    async fn error_for_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PipelineApi for HttpPipelineApi {
    async fn list_jobs(&self) -> Result<Vec<JobSnapshot>> {
        let response = self.get("/videos/").await?;
        let response = self.error_for_status(response).await?;
        response
            .json::<Vec<JobSnapshot>>()
            .await
            .map_err(|e| Error::from_reqwest(e, self.request_timeout))
    }

    async fn get_job(&self, id: &str) -> Result<JobSnapshot> {
        let response = self.get(&format!("/videos/{}", id)).await?;
        let response = self.error_for_status(response).await?;
        response
            .json::<JobSnapshot>()
            .await
            .map_err(|e| Error::from_reqwest(e, self.request_timeout))
    }

    async fn stage_result(
        &self,
        id: &str,
        stage: StageKind,
    ) -> Result<Option<StageResultEnvelope>> {
        let Some(endpoint) = stage.result_endpoint() else {
            return Ok(None);
        };
        let response = self.get(&format!("/processing/{}/{}", endpoint, id)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.error_for_status(response).await?;
        let payload = response
            .json::<StageResultResponse>()
            .await
            .map_err(|e| Error::from_reqwest(e, self.request_timeout))?;
        Ok(Some(payload.into_envelope(stage)))
    }

    async fn process_video(
        &self,
        upload: &UploadCandidate,
        options: &PipelineOptions,
        progress: UploadProgress,
    ) -> Result<ProcessingOutcome> {
        let file = tokio::fs::File::open(&upload.path).await?;
        let body = ProgressBody {
            inner: ReaderStream::new(file),
            sent: 0,
            total: upload.size_bytes,
            progress,
        };

        let part = multipart::Part::stream_with_length(Body::wrap_stream(body), upload.size_bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| Error::Validation(format!("Type de contenu invalide: {}", e)))?;

        let form = multipart::Form::new()
            .part("video_file", part)
            .text(
                "language_detection_duration",
                options.language_detection_duration.to_string(),
            )
            .text("target_resolution", options.target_resolution.as_str())
            .text("crf", options.crf.to_string())
            .text("subtitle_model", options.subtitle_model.as_str())
            .text("subtitle_language", options.subtitle_language.clone())
            .text(
                "enable_animal_detection",
                options.enable_animal_detection.to_string(),
            )
            .text(
                "animal_confidence_threshold",
                options.animal_confidence_threshold.to_string(),
            );

        let response = self
            .client
            .post(self.url("/processing/process-video"))
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.upload_timeout))?;

        let response = self.error_for_status(response).await?;
        response
            .json::<ProcessingOutcome>()
            .await
            .map_err(|e| Error::from_reqwest(e, self.upload_timeout))
    }

    fn stream_url(&self, id: &str) -> String {
        self.url(&format!("/videos/stream/{}", id))
    }
}

/// Streaming upload body that reports transport progress as chunks are
/// handed off.
struct ProgressBody<S> {
    inner: S,
    sent: u64,
    total: u64,
    progress: UploadProgress,
}

impl<S> Stream for ProgressBody<S>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                this.progress.advance(this.sent, this.total);
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(None) => {
                // End of stream: guarantee the completion signal even when
                // the declared size did not match the bytes read.
                this.progress.finish();
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
