//! Pipeline orchestration.
//!
//! Sequences analysis → formatting → publishing for one screenshot and
//! assembles the caller-facing payload. Strictly linear: the only
//! branch is the early `Rejected` exit when no image is present, and
//! only the attachment uploader embeds any fallback behavior.

use serde::Serialize;
use snaptask_config::AppConfig;
use snaptask_core::{AnalysisResult, ScreenshotInput, SnapError, TaskRecord};
use snaptask_todoist::TaskPublisher;
use snaptask_vision::VisionAnalyzer;
use tracing::info;

/// Progress of one request through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Analyzed,
    Published,
    Completed,
    Rejected,
    Failed,
}

/// Everything produced by a completed run, rendered verbose or minimal
/// depending on the caller's flag.
#[derive(Debug)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub analysis: AnalysisResult,
    pub task: TaskRecord,
}

impl PipelineReport {
    pub fn to_payload(&self, verbose: bool) -> serde_json::Value {
        if verbose {
            serde_json::json!({
                "status": "success",
                "state": self.state,
                "task": self.task,
                "title": self.analysis.title(),
                "duration_code": self.analysis.duration_code(),
                "format_matched": self.analysis.format_matched(),
                "model_reply": self.analysis.raw,
                "token_usage": self.analysis.usage,
                "file_attached": self.task.attachment.file_attached(),
            })
        } else {
            serde_json::json!({
                "status": "success",
                "title": self.analysis.title(),
                "file_attached": self.task.attachment.file_attached(),
            })
        }
    }
}

/// Sequences VisionAnalyzer → formatting → TaskPublisher.
pub struct Orchestrator {
    analyzer: VisionAnalyzer,
    publisher: TaskPublisher,
}

impl Orchestrator {
    pub fn new(config: &AppConfig) -> Self {
        let http = reqwest::Client::new();
        Self {
            analyzer: VisionAnalyzer::new(http.clone(), config),
            publisher: TaskPublisher::new(http, config),
        }
    }

    /// Run the full pipeline for one screenshot. No component retries;
    /// vision or task-creation failure is terminal for the request.
    pub async fn run(&self, input: ScreenshotInput) -> Result<PipelineReport, SnapError> {
        if input.is_empty() {
            info!("rejecting request with no image payload");
            return Err(SnapError::NoImage);
        }

        let Some(bytes) = input.image.as_bytes() else {
            info!("rejecting request with undecodable image payload");
            return Err(SnapError::NoImage);
        };

        info!(state = ?PipelineState::Received, "pipeline started");
        let analysis = self.analyzer.analyze(&bytes, &input.mime_type).await?;
        info!(state = ?PipelineState::Analyzed, "analysis complete: {}", analysis.content());

        let task = self.publisher.publish(analysis.content(), Some(&input)).await?;
        info!(state = ?PipelineState::Published, task_id = %task.id, "task published");

        Ok(PipelineReport {
            state: PipelineState::Completed,
            analysis,
            task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaptask_core::ImagePayload;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn orchestrator_for(server: &MockServer) -> Orchestrator {
        let env = HashMap::from([
            ("ANTHROPIC_API_KEY".to_string(), "sk-test".to_string()),
            ("TODOIST_API_KEY".to_string(), "td-test".to_string()),
            ("ANTHROPIC_BASE_URL".to_string(), server.uri()),
            ("TODOIST_BASE_URL".to_string(), server.uri()),
        ]);
        Orchestrator::new(&AppConfig::from_map(&env).unwrap())
    }

    fn input() -> ScreenshotInput {
        ScreenshotInput::new(ImagePayload::Bytes(b"jpeg".to_vec()), None, None)
    }

    async fn mount_vision_reply(server: &MockServer, reply: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{ "type": "text", "text": reply }],
                "usage": { "input_tokens": 640, "output_tokens": 12 }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_analysis() {
        let server = MockServer::start().await;
        let empty = ScreenshotInput::new(ImagePayload::Bytes(Vec::new()), None, None);
        let err = orchestrator_for(&server).run(empty).await.unwrap_err();
        assert!(matches!(err, SnapError::NoImage));
    }

    #[tokio::test]
    async fn full_run_attaches_screenshot_and_reports_success() {
        let server = MockServer::start().await;
        mount_vision_reply(&server, "Here is the task.\n05: Fix the sink\nDone.").await;
        Mock::given(method("POST"))
            .and(path("/rest/v2/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "9", "content": "05: Fix the sink"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v2/tasks/9/attachments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "att-9"
            })))
            .mount(&server)
            .await;

        let report = orchestrator_for(&server).run(input()).await.unwrap();
        assert_eq!(report.state, PipelineState::Completed);
        assert_eq!(report.task.content, "05: Fix the sink");
        assert!(report.task.attachment.file_attached());

        let minimal = report.to_payload(false);
        assert_eq!(minimal["status"], "success");
        assert_eq!(minimal["title"], "Fix the sink");
        assert_eq!(minimal["file_attached"], true);
        assert!(minimal.get("model_reply").is_none());

        let verbose = report.to_payload(true);
        assert_eq!(verbose["duration_code"], "05");
        assert_eq!(verbose["token_usage"]["input_tokens"], 640);
        assert!(verbose["model_reply"].as_str().unwrap().contains("Fix the sink"));
    }

    #[tokio::test]
    async fn vision_failure_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = orchestrator_for(&server).run(input()).await.unwrap_err();
        match err {
            SnapError::VisionProvider { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected VisionProvider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn format_miss_publishes_whole_reply_as_content() {
        let server = MockServer::start().await;
        mount_vision_reply(&server, "I could not determine a clear task.").await;
        Mock::given(method("POST"))
            .and(path("/rest/v2/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "3", "content": "I could not determine a clear task."
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v2/tasks/3/attachments"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sync/v9/uploads/add"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let report = orchestrator_for(&server).run(input()).await.unwrap();
        let verbose = report.to_payload(true);
        assert_eq!(verbose["format_matched"], false);
        assert_eq!(verbose["title"], "I could not determine a clear task.");
        assert_eq!(verbose["file_attached"], false);
        assert_eq!(verbose["duration_code"], serde_json::Value::Null);
    }
}
