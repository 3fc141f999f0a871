//! Ask command implementation.

use super::{preflight_or_report, select_video};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    video: Option<&str>,
    top_k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    preflight_or_report(if video.is_some() { Operation::Index } else { Operation::Ask })?;

    if let Some(k) = top_k {
        settings.rag.top_k = k;
    }

    let orchestrator = Orchestrator::new(settings)?;
    select_video(&orchestrator, video).await?;

    let spinner = Output::spinner("Thinking...");
    let result = orchestrator.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("\n{}\n", answer.answer);

            if !answer.sources.is_empty() {
                Output::header("Sources");
                for source in &answer.sources {
                    Output::chunk(source, None);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
