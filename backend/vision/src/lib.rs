//! Vision analysis — turn a screenshot into a `DD: Title` task line.
//!
//! Sends the image with a fixed instruction to a vision-capable model
//! and parses the reply into an [`AnalysisResult`].

pub mod analyzer;
pub mod parse;

pub use analyzer::{VisionAnalyzer, TASK_PROMPT};
pub use parse::parse_reply;
