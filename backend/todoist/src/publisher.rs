//! Task publishing: create the remote task, then best-effort attach the
//! original screenshot.

use snaptask_config::AppConfig;
use snaptask_core::{AttachmentOutcome, ScreenshotInput, SnapError, TaskRecord};
use tracing::info;

use crate::attachments::AttachmentUploader;
use crate::client::{extract_id, TodoistClient};

pub struct TaskPublisher {
    client: TodoistClient,
    uploader: AttachmentUploader,
}

impl TaskPublisher {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        let client = TodoistClient::new(http, config);
        let uploader = AttachmentUploader::new(client.clone());
        Self { client, uploader }
    }

    /// Create the task, then upload the screenshot as an attachment.
    ///
    /// Task creation failing is the only abort here. The attachment
    /// outcome is folded into the record whatever it is; a failed upload
    /// still returns `Ok` with `file_attached = false`.
    pub async fn publish(
        &self,
        content: &str,
        image: Option<&ScreenshotInput>,
    ) -> Result<TaskRecord, SnapError> {
        let task = self.client.create_task(content).await?;
        let id = extract_id(&task["id"]).unwrap_or_default();
        info!("task {} created", id);

        let attachment = match image {
            Some(input) if !input.is_empty() => {
                self.uploader
                    .upload(&id, &input.image, &input.mime_type, input.filename.as_deref())
                    .await
            }
            _ => AttachmentOutcome::NotAttempted,
        };

        Ok(TaskRecord {
            id,
            content: task["content"].as_str().unwrap_or(content).to_string(),
            due_hint: "today".to_string(),
            url: task["url"].as_str().map(str::to_string),
            attachment,
        })
    }
}
