//! Attachment upload with ordered fallback strategies.
//!
//! Two strategies are tried in fixed priority order, stopping at the
//! first success: a direct multipart upload against the task's
//! attachments endpoint, then a generic file upload followed by a
//! comment embedding the file descriptor. Failure here never aborts the
//! request; the caller folds it into a degraded-success response.

use async_trait::async_trait;
use snaptask_core::{AttachmentOutcome, AttachmentRef, ImagePayload, StrategyKind};
use tracing::{error, info, warn};

use crate::client::TodoistClient;

/// One way of associating an uploaded file with a task.
#[async_trait]
pub trait UploadStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Attempt the upload. `Err` carries a diagnostic string (status
    /// codes, bodies) for the failure log, not a pipeline error.
    async fn attempt(
        &self,
        task_id: &str,
        bytes: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<AttachmentRef, String>;
}

/// Strategy 1: single multipart POST to the task's attachments endpoint.
struct DirectAttachment {
    client: TodoistClient,
}

#[async_trait]
impl UploadStrategy for DirectAttachment {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DirectAttachment
    }

    async fn attempt(
        &self,
        task_id: &str,
        bytes: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<AttachmentRef, String> {
        let attachment = self
            .client
            .attach_to_task(task_id, bytes.to_vec(), mime_type, filename)
            .await?;
        Ok(AttachmentRef::Attachment { attachment })
    }
}

/// Strategy 2: upload the file to the generic endpoint, then post a
/// comment carrying the file descriptor. Both sub-steps must succeed.
struct UploadAndComment {
    client: TodoistClient,
}

#[async_trait]
impl UploadStrategy for UploadAndComment {
    fn kind(&self) -> StrategyKind {
        StrategyKind::UploadAndComment
    }

    async fn attempt(
        &self,
        task_id: &str,
        bytes: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<AttachmentRef, String> {
        let file_url = self
            .client
            .upload_file(bytes.to_vec(), mime_type, filename)
            .await?
            .ok_or_else(|| "upload succeeded but returned no file_url".to_string())?;

        let comment_id = self
            .client
            .comment_with_file(task_id, &file_url, mime_type, filename)
            .await?;

        Ok(AttachmentRef::FileComment { file_url, comment_id })
    }
}

/// Runs the ordered strategy list for one task.
pub struct AttachmentUploader {
    strategies: Vec<Box<dyn UploadStrategy>>,
}

impl AttachmentUploader {
    pub fn new(client: TodoistClient) -> Self {
        Self {
            strategies: vec![
                Box::new(DirectAttachment { client: client.clone() }),
                Box::new(UploadAndComment { client }),
            ],
        }
    }

    /// Try each strategy in order until one succeeds. Never returns an
    /// error: an undecodable payload short-circuits to `NotAttempted`,
    /// and exhausting all strategies yields `Failed` with diagnostics.
    pub async fn upload(
        &self,
        task_id: &str,
        image: &ImagePayload,
        mime_type: &str,
        filename: Option<&str>,
    ) -> AttachmentOutcome {
        let Some(bytes) = image.as_bytes() else {
            warn!("image payload was not usable, skipping attachment upload");
            return AttachmentOutcome::NotAttempted;
        };
        if bytes.is_empty() {
            return AttachmentOutcome::NotAttempted;
        }

        let filename = filename
            .map(str::to_string)
            .unwrap_or_else(|| format!("screenshot_{}.jpg", chrono::Utc::now().timestamp()));
        let mime_type = if mime_type.is_empty() { "image/jpeg" } else { mime_type };

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            match strategy.attempt(task_id, &bytes, mime_type, &filename).await {
                Ok(reference) => {
                    info!("attachment uploaded via {:?} for task {}", strategy.kind(), task_id);
                    return AttachmentOutcome::Attached { strategy: strategy.kind(), reference };
                }
                Err(detail) => {
                    warn!("attachment strategy {:?} failed: {}", strategy.kind(), detail);
                    failures.push(format!("{:?}: {}", strategy.kind(), detail));
                }
            }
        }

        let detail = failures.join("; ");
        error!(
            "all attachment strategies failed for task {} ({} bytes): {}",
            task_id,
            bytes.len(),
            detail
        );
        AttachmentOutcome::Failed { detail }
    }
}
