pub mod error;
pub mod types;

pub use error::SnapError;
pub use types::{
    AnalysisResult, AttachmentOutcome, AttachmentRef, ImagePayload, ScreenshotInput,
    StrategyKind, TaskRecord, TokenUsage,
};
