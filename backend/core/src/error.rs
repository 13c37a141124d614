use thiserror::Error;

/// Top-level error type for the snaptask pipeline.
///
/// Attachment-upload failures are deliberately absent: they are recorded
/// as an `AttachmentOutcome::Failed` value on the task record, never
/// raised through this type.
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("no image file provided")]
    NoImage,

    #[error("upstream timeout calling {provider}")]
    UpstreamTimeout { provider: String },

    #[error("failed to reach {provider}: {detail}")]
    UpstreamConnect { provider: String, detail: String },

    #[error("vision provider error ({status}): {body}")]
    VisionProvider { status: u16, body: String },

    #[error("task creation failed ({status}): {body}")]
    TaskCreation { status: u16, body: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SnapError {
    /// Classify a reqwest transport failure against a named provider.
    pub fn upstream(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SnapError::UpstreamTimeout { provider: provider.to_string() }
        } else {
            SnapError::UpstreamConnect {
                provider: provider.to_string(),
                detail: err.to_string(),
            }
        }
    }

    /// Short machine-readable kind tag, used in API error payloads and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SnapError::NoImage => "validation",
            SnapError::UpstreamTimeout { .. } => "upstream_timeout",
            SnapError::UpstreamConnect { .. } => "upstream_connect",
            SnapError::VisionProvider { .. } => "vision_provider",
            SnapError::TaskCreation { .. } => "task_creation",
            SnapError::Config(_) => "config",
            SnapError::Other(_) => "internal",
        }
    }
}
