//! Index command implementation.

use super::preflight_or_report;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(video: &str, settings: Settings) -> Result<()> {
    preflight_or_report(Operation::Index)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching transcript and building index...");
    let result = orchestrator.process_video(video).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&result.message());
            Output::kv("Index", &result.index_name);
            Output::kv("Chunks", &result.chunks_indexed.to_string());
        }
        Err(e) => {
            Output::error(&format!("Failed to process video: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
