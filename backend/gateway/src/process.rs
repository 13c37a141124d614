//! The `/process-screenshot` endpoint.
//!
//! Pulls the image out of the multipart body, runs the pipeline, and
//! maps typed pipeline errors to response codes at this boundary only.
//! Every error response carries a correlation id that also appears in
//! the logs for that request.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use snaptask_core::{ImagePayload, ScreenshotInput, SnapError};
use tracing::{error, info};
use uuid::Uuid;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcessParams {
    /// When set, the response carries the full debug payload (raw model
    /// reply, token usage, attachment diagnostics).
    #[serde(default)]
    pub verbose: bool,
}

/// Error wrapper that renders as a structured JSON error response.
pub struct ApiError {
    pub error: SnapError,
    pub correlation_id: Uuid,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.error {
            SnapError::NoImage => StatusCode::BAD_REQUEST,
            SnapError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            SnapError::UpstreamConnect { .. }
            | SnapError::VisionProvider { .. }
            | SnapError::TaskCreation { .. } => StatusCode::BAD_GATEWAY,
            SnapError::Config(_) | SnapError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn state(&self) -> &'static str {
        match self.error {
            SnapError::NoImage => "rejected",
            _ => "failed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": "error",
            "state": self.state(),
            "kind": self.error.kind(),
            "error": self.error.to_string(),
            "correlation_id": self.correlation_id,
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// POST /process-screenshot — multipart field `image`, optional
/// `?verbose=true` flag.
pub async fn process_screenshot(
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let correlation_id = Uuid::new_v4();
    let fail = |error: SnapError| ApiError { error, correlation_id };

    let mut input: Option<ScreenshotInput> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                error!(%correlation_id, "malformed multipart body: {}", err);
                return Err(fail(SnapError::NoImage));
            }
        };
        if field.name() != Some("image") {
            continue;
        }
        let mime_type = field.content_type().map(str::to_string);
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|err| {
            error!(%correlation_id, "failed reading image field: {}", err);
            fail(SnapError::NoImage)
        })?;
        input = Some(ScreenshotInput::new(
            ImagePayload::Bytes(bytes.to_vec()),
            mime_type,
            filename,
        ));
        break;
    }

    let Some(input) = input else {
        error!(%correlation_id, "no image file in request");
        return Err(fail(SnapError::NoImage));
    };

    info!(
        %correlation_id,
        "processing screenshot ({} bytes, {})",
        match &input.image {
            ImagePayload::Bytes(b) => b.len(),
            ImagePayload::Base64(s) => s.len(),
        },
        input.mime_type
    );

    match state.orchestrator.run(input).await {
        Ok(report) => {
            let mut payload = report.to_payload(params.verbose);
            if params.verbose {
                payload["correlation_id"] = serde_json::json!(correlation_id);
            }
            Ok(Json(payload))
        }
        Err(error) => {
            error!(%correlation_id, kind = error.kind(), "pipeline failed: {}", error);
            Err(fail(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(error: SnapError) -> ApiError {
        ApiError { error, correlation_id: Uuid::new_v4() }
    }

    #[test]
    fn validation_maps_to_400() {
        assert_eq!(api(SnapError::NoImage).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(api(SnapError::NoImage).state(), "rejected");
    }

    #[test]
    fn upstream_failures_map_to_gateway_codes() {
        let timeout = SnapError::UpstreamTimeout { provider: "vision provider".into() };
        assert_eq!(api(timeout).status_code(), StatusCode::GATEWAY_TIMEOUT);

        let vision = SnapError::VisionProvider { status: 429, body: "overloaded".into() };
        assert_eq!(api(vision).status_code(), StatusCode::BAD_GATEWAY);

        let task = SnapError::TaskCreation { status: 403, body: "forbidden".into() };
        let wrapped = api(task);
        assert_eq!(wrapped.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(wrapped.state(), "failed");
    }

    #[test]
    fn config_and_internal_map_to_500() {
        assert_eq!(
            api(SnapError::Config("missing key".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
