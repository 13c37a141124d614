//! Low-level Todoist HTTP calls.
//!
//! `create_task` is the only call whose failure aborts a request; the
//! upload/comment calls report failure as diagnostic strings that the
//! strategy layer folds into a non-fatal outcome.

use snaptask_config::AppConfig;
use snaptask_core::SnapError;
use tracing::info;

/// Authenticated client for the task store.
#[derive(Clone)]
pub struct TodoistClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TodoistClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            api_key: config.todoist_api_key.clone(),
            base_url: config.todoist_base_url.clone(),
        }
    }

    /// Create a task with the given content, due "today".
    pub async fn create_task(&self, content: &str) -> Result<serde_json::Value, SnapError> {
        info!("creating task: {}", content);
        let resp = self
            .http
            .post(format!("{}/rest/v2/tasks", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "content": content, "due_string": "today" }))
            .send()
            .await
            .map_err(|e| SnapError::upstream("task store", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SnapError::TaskCreation { status: status.as_u16(), body });
        }
        resp.json()
            .await
            .map_err(|e| SnapError::upstream("task store", e))
    }

    /// Multipart upload directly against the task's attachments endpoint.
    /// Returns the response body on HTTP 200/201.
    pub async fn attach_to_task(
        &self,
        task_id: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<serde_json::Value, String> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| format!("invalid mime type {mime_type}: {e}"))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(format!("{}/rest/v2/tasks/{}/attachments", self.base_url, task_id))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("attachment upload transport failure: {e}"))?;

        let status = resp.status();
        if status.as_u16() == 200 || status.as_u16() == 201 {
            resp.json()
                .await
                .map_err(|e| format!("attachment response was not JSON: {e}"))
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(format!("attachment endpoint returned {status}: {body}"))
        }
    }

    /// Multipart upload to the generic file-upload endpoint, with no task
    /// association. Returns the file URL when the store provides one.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<Option<String>, String> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| format!("invalid mime type {mime_type}: {e}"))?;
        let form = reqwest::multipart::Form::new()
            .text("file_name", filename.to_string())
            .part("file", part);

        let resp = self
            .http
            .post(format!("{}/sync/v9/uploads/add", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("file upload transport failure: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("upload endpoint returned {status}: {body}"));
        }
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| format!("upload response was not JSON: {e}"))?;
        Ok(json["file_url"].as_str().map(str::to_string))
    }

    /// Post a comment on the task carrying a file-attachment descriptor
    /// that points at an already-uploaded file. Returns the comment id.
    pub async fn comment_with_file(
        &self,
        task_id: &str,
        file_url: &str,
        mime_type: &str,
        filename: &str,
    ) -> Result<String, String> {
        let body = serde_json::json!({
            "task_id": task_id,
            "content": "Screenshot",
            "attachment": {
                "resource_type": "file",
                "file_url": file_url,
                "file_type": mime_type,
                "file_name": filename
            }
        });
        let resp = self
            .http
            .post(format!("{}/rest/v2/comments", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("comment transport failure: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("comment endpoint returned {status}: {body}"));
        }
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| format!("comment response was not JSON: {e}"))?;
        Ok(extract_id(&json["id"]).unwrap_or_default())
    }
}

/// Todoist ids arrive as strings in v2 and integers in older payloads.
pub fn extract_id(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::to_string)
        .or_else(|| value.as_u64().map(|n| n.to_string()))
}
