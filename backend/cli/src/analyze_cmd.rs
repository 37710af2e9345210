//! CLI Analyze Command
//!
//! Runs the same pipeline as the server against a local file.

use std::path::Path;

use anyhow::{Context, Result};

use framewise_config::FramewiseConfig;
use framewise_core::ConversationHistory;
use framewise_understanding::frame_timeline;

pub async fn run(config: &FramewiseConfig, file: &Path, prompt: &str) -> Result<()> {
    let pipeline = framewise_gateway::build_pipeline(config).await?;
    let history = ConversationHistory::shared(config.history_max_turns());

    let report = pipeline
        .analyze_path(file, prompt, &history)
        .await
        .with_context(|| format!("Failed to analyse {}", file.display()))?;

    if let Some(duration) = report.duration_secs {
        println!("Duration: {duration:.1}s");
    }
    if !report.frames.is_empty() {
        println!("Frames:\n{}\n", frame_timeline(&report.frames));
    }
    if let Some(detail) = &report.transcript_detail {
        println!(
            "Transcript: {} chars, {} speaker turns, {} chapters\n",
            detail.text.chars().count(),
            detail.speakers.len(),
            detail.chapters.len()
        );
    }
    println!("{}", report.narrative);
    Ok(())
}
