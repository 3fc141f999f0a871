//! Answer generation from retrieved transcript context.

mod openai;

pub use openai::OpenAIGenerator;

use crate::chunking::ChunkRecord;
use crate::error::Result;
use async_trait::async_trait;

/// Produces an answer to a question given retrieved context.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Answer `question` using `context` as the only source of facts.
    async fn answer(&self, context: &str, question: &str) -> Result<String>;
}

/// Join retrieved chunk texts into a single context block, in rank order.
pub fn format_context(records: &[ChunkRecord]) -> String {
    records
        .iter()
        .map(|record| record.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
