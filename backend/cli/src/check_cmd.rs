//! `snaptask check` — manual integration harness.
//!
//! Runs the vision call against a local image and prints what the
//! pipeline would do with it, optionally going on to create the task.

use std::path::Path;

use anyhow::{Context, Result};
use snaptask_config::AppConfig;
use snaptask_core::{ImagePayload, ScreenshotInput};
use snaptask_todoist::TaskPublisher;
use snaptask_vision::VisionAnalyzer;

/// Guess the MIME type from the file extension, defaulting to JPEG.
fn guess_mime(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

pub async fn run(config: &AppConfig, image_path: &Path, skip_todoist: bool) -> Result<()> {
    let bytes = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("could not read image file {}", image_path.display()))?;
    let mime_type = guess_mime(image_path);
    println!("Sending {} ({} bytes, {}) to the vision model...", image_path.display(), bytes.len(), mime_type);

    let http = reqwest::Client::new();
    let analysis = VisionAnalyzer::new(http.clone(), config)
        .analyze(&bytes, mime_type)
        .await?;

    println!("Model reply:\n{}", analysis.raw.trim());
    if analysis.format_matched() {
        println!("Extracted task line: {}", analysis.content());
        println!("Title: {}", analysis.title());
        println!("Duration code: {}", analysis.duration_code().unwrap_or("--"));
    } else {
        println!("Warning: reply did not match the expected XY: Title format");
    }

    if skip_todoist {
        println!("Skipping task creation (--skip-todoist)");
        return Ok(());
    }

    let filename = image_path.file_name().and_then(|n| n.to_str()).map(str::to_string);
    let input = ScreenshotInput::new(
        ImagePayload::Bytes(bytes),
        Some(mime_type.to_string()),
        filename,
    );
    let record = TaskPublisher::new(http, config)
        .publish(analysis.content(), Some(&input))
        .await?;

    println!("Task {} created (due {})", record.id, record.due_hint);
    if let Some(url) = &record.url {
        println!("URL: {url}");
    }
    println!("File attached: {}", record.attachment.file_attached());

    Ok(())
}
