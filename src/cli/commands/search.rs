//! Search command implementation.

use super::{preflight_or_report, select_video};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    video: Option<&str>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    preflight_or_report(if video.is_some() { Operation::Index } else { Operation::Search })?;

    let orchestrator = Orchestrator::new(settings)?;
    select_video(&orchestrator, video).await?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok(hits) => {
            Output::success(&format!("Found {} results", hits.len()));
            for hit in &hits {
                Output::chunk(&hit.record, Some(hit.score));
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
