//! List command implementation.

use super::preflight_or_report;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{create_store, ArtifactStore, VectorIndex};
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    preflight_or_report(Operation::List)?;

    let store = create_store(&settings)?;
    let names = store.list().await?;

    if names.is_empty() {
        Output::info("No videos indexed yet. Use 'vidask index <url>' to add one.");
        return Ok(());
    }

    Output::header(&format!("Indexes ({})", names.len()));
    println!();

    for name in &names {
        match VectorIndex::load(store.as_ref(), name).await {
            Ok(index) => Output::list_item(&format!(
                "{} ({} chunks, {})",
                name,
                index.count(),
                index.embedding_model()
            )),
            Err(e) => Output::warning(&format!("{}: {}", name, e)),
        }
    }

    println!();
    Output::kv("Location", &store.location());

    Ok(())
}
