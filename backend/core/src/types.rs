//! Shared data model for the screenshot → to-do pipeline.
//!
//! Every value here is created fresh per request and dropped once the
//! response has been written; nothing holds process-wide state.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use tracing::warn;

/// One incoming screenshot awaiting processing. Owned exclusively by the
/// pipeline invocation that received it.
#[derive(Debug, Clone)]
pub struct ScreenshotInput {
    pub image: ImagePayload,
    pub mime_type: String,
    pub filename: Option<String>,
}

impl ScreenshotInput {
    pub fn new(image: ImagePayload, mime_type: Option<String>, filename: Option<String>) -> Self {
        Self {
            image,
            mime_type: mime_type.unwrap_or_else(|| "image/jpeg".to_string()),
            filename,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.image {
            ImagePayload::Bytes(b) => b.is_empty(),
            ImagePayload::Base64(s) => s.is_empty(),
        }
    }
}

/// Image data as handed to us by the caller: either raw bytes or a
/// base64 string (possibly a full `data:` URI).
#[derive(Debug, Clone)]
pub enum ImagePayload {
    Bytes(Vec<u8>),
    Base64(String),
}

impl ImagePayload {
    /// Resolve to raw bytes. Base64 payloads are decoded after stripping
    /// any `...base64,` data-URI prefix; an undecodable payload yields
    /// `None`, which callers treat as "no attachment attempted" rather
    /// than an error.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            ImagePayload::Bytes(b) => Some(b.clone()),
            ImagePayload::Base64(s) => {
                let encoded = match s.find("base64,") {
                    Some(idx) => &s[idx + "base64,".len()..],
                    None => s.as_str(),
                };
                match STANDARD.decode(encoded.trim()) {
                    Ok(bytes) => Some(bytes),
                    Err(err) => {
                        warn!("could not decode base64 image payload: {}", err);
                        None
                    }
                }
            }
        }
    }
}

/// Token accounting reported by the vision provider, surfaced in the
/// verbose response payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Parsed outcome of one vision call.
///
/// If any reply line matched the expected `DD: Title` format, it is kept
/// in `parsed_line`; otherwise the whole trimmed reply doubles as the
/// task content, and `format_matched()` reports the miss.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub raw: String,
    pub parsed_line: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl AnalysisResult {
    /// The task content string: the matched line, or the full trimmed
    /// reply when the model ignored the format contract.
    pub fn content(&self) -> &str {
        self.parsed_line.as_deref().unwrap_or_else(|| self.raw.trim())
    }

    /// Whether the reply honored the `DD: Title` output contract.
    pub fn format_matched(&self) -> bool {
        self.parsed_line.is_some()
    }

    /// Human title for the task. When the content carries the two-digit
    /// duration prefix, the title is the content with its first four
    /// characters stripped and trimmed; otherwise the content verbatim.
    pub fn title(&self) -> String {
        let content = self.content();
        if duration_prefixed(content) {
            // Prefix is two ASCII digits + ": ", so byte offset 4 is a
            // valid char boundary.
            content[4..].trim().to_string()
        } else {
            content.to_string()
        }
    }

    /// Two-digit duration code (hours, then tens of minutes). The digits
    /// are not range-checked; any digit pair is accepted.
    pub fn duration_code(&self) -> Option<&str> {
        let content = self.content();
        duration_prefixed(content).then(|| &content[..2])
    }
}

/// True when `s` starts with two ASCII digits followed by `": "` and has
/// at least one character after the prefix.
pub fn duration_prefixed(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 5 && b[0].is_ascii_digit() && b[1].is_ascii_digit() && &b[2..4] == b": "
}

/// Which upload strategy produced an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    DirectAttachment,
    UploadAndComment,
}

/// Reference to a stored attachment, depending on which strategy landed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentRef {
    /// Direct attachment endpoint: the provider's response body.
    Attachment { attachment: serde_json::Value },
    /// Two-phase upload: file URL plus the comment that carries it.
    FileComment { file_url: String, comment_id: String },
}

/// Result of the attachment-upload sequence. A `Failed` outcome degrades
/// the response, it never aborts it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttachmentOutcome {
    NotAttempted,
    Attached {
        strategy: StrategyKind,
        reference: AttachmentRef,
    },
    Failed {
        detail: String,
    },
}

impl AttachmentOutcome {
    pub fn file_attached(&self) -> bool {
        matches!(self, AttachmentOutcome::Attached { .. })
    }
}

/// A task as created in the remote store, plus the attachment outcome
/// folded in by the publisher.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub content: String,
    pub due_hint: String,
    pub url: Option<String>,
    pub attachment: AttachmentOutcome,
}
