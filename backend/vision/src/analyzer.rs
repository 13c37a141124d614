//! Vision provider client.
//!
//! One single-turn multimodal request per call: the image (base64, with
//! its MIME type) followed by the fixed task-analysis instruction. No
//! retries; transport and provider failures are terminal for the request.

use base64::{engine::general_purpose::STANDARD, Engine};
use snaptask_config::AppConfig;
use snaptask_core::{AnalysisResult, SnapError, TokenUsage};
use tracing::info;

use crate::parse::parse_reply;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Instruction sent alongside every screenshot. The model must answer
/// with a short title and a two-digit duration code in `XY: Title` form.
pub const TASK_PROMPT: &str = "\
Below is an image of a task. Please analyze the image and determine the task's title \
in no more than 5-7 words. Also, estimate the required time to complete this task and \
express it in a two-digit format where the first digit is the number of hours and the \
second digit is the number of tens of minutes (e.g., '02' means 0 hours and 20 minutes). \
Return your answer strictly in the following format:

XY: *Title of Task*

For example, if the task takes 20 minutes and is 'Buy groceries', you should output:
02: Buy groceries

Now, please analyze the following image and provide the result.";

/// Client for the vision provider.
pub struct VisionAnalyzer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl VisionAnalyzer {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            api_key: config.anthropic_api_key.clone(),
            model: config.vision_model.clone(),
            base_url: config.anthropic_base_url.clone(),
        }
    }

    /// Send the image to the vision model and parse its reply.
    pub async fn analyze(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
    ) -> Result<AnalysisResult, SnapError> {
        info!(
            "calling vision model {} with {} bytes of {}",
            self.model,
            image_bytes.len(),
            mime_type
        );

        let b64 = STANDARD.encode(image_bytes);
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "image",
                      "source": { "type": "base64", "media_type": mime_type, "data": b64 } },
                    { "type": "text", "text": TASK_PROMPT }
                ]
            }]
        });

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| SnapError::upstream("vision provider", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SnapError::VisionProvider { status: status.as_u16(), body });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SnapError::upstream("vision provider", e))?;

        let reply = json["content"][0]["text"].as_str().unwrap_or("").to_string();
        let usage = match (
            json["usage"]["input_tokens"].as_u64(),
            json["usage"]["output_tokens"].as_u64(),
        ) {
            (Some(input_tokens), Some(output_tokens)) => {
                Some(TokenUsage { input_tokens, output_tokens })
            }
            _ => None,
        };

        Ok(parse_reply(reply, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn analyzer_for(server: &MockServer) -> VisionAnalyzer {
        let env = HashMap::from([
            ("ANTHROPIC_API_KEY".to_string(), "sk-test".to_string()),
            ("TODOIST_API_KEY".to_string(), "td-test".to_string()),
            ("ANTHROPIC_BASE_URL".to_string(), server.uri()),
        ]);
        let config = AppConfig::from_map(&env).unwrap();
        VisionAnalyzer::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn sends_image_block_and_parses_reply() {
        let server = MockServer::start().await;
        let b64 = STANDARD.encode(b"jpeg");
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(serde_json::json!({
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "image",
                          "source": { "type": "base64", "media_type": "image/jpeg", "data": b64 } },
                        { "type": "text", "text": TASK_PROMPT }
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{ "type": "text", "text": "02: Buy groceries" }],
                "usage": { "input_tokens": 512, "output_tokens": 9 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = analyzer_for(&server).analyze(b"jpeg", "image/jpeg").await.unwrap();
        assert_eq!(result.content(), "02: Buy groceries");
        assert_eq!(result.title(), "Buy groceries");
        assert_eq!(result.usage.unwrap().input_tokens, 512);
    }

    #[tokio::test]
    async fn non_success_response_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let err = analyzer_for(&server).analyze(b"jpeg", "image/jpeg").await.unwrap_err();
        match err {
            SnapError::VisionProvider { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal");
            }
            other => panic!("expected VisionProvider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_upstream_connect() {
        let env = HashMap::from([
            ("ANTHROPIC_API_KEY".to_string(), "sk-test".to_string()),
            ("TODOIST_API_KEY".to_string(), "td-test".to_string()),
            // Nothing listens here.
            ("ANTHROPIC_BASE_URL".to_string(), "http://127.0.0.1:9".to_string()),
        ]);
        let analyzer =
            VisionAnalyzer::new(reqwest::Client::new(), &AppConfig::from_map(&env).unwrap());
        let err = analyzer.analyze(b"jpeg", "image/jpeg").await.unwrap_err();
        assert!(matches!(err, SnapError::UpstreamConnect { .. }));
    }
}
