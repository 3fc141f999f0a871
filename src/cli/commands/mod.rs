//! CLI command implementations.

mod ask;
mod config;
mod index;
mod list;
mod search;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use index::run_index;
pub use list::run_list;
pub use search::run_search;
pub use serve::run_serve;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run pre-flight checks, reporting failures through the CLI output.
fn preflight_or_report(operation: Operation) -> Result<()> {
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }
    Ok(())
}

/// Make a video's index active, building it first when needed.
///
/// Without a video, the configured startup index is used if there is one.
async fn select_video(orchestrator: &Orchestrator, video: Option<&str>) -> Result<()> {
    match video {
        Some(video) => {
            let spinner = Output::spinner("Preparing video index...");
            let result = orchestrator.process_video(video).await;
            spinner.finish_and_clear();
            let result = result?;
            Output::info(&result.message());
        }
        None => {
            if let Some(name) = orchestrator.settings().rag.startup_index.clone() {
                orchestrator.activate(&name).await?;
                Output::info(&format!("Using index {}", name));
            }
        }
    }
    Ok(())
}
