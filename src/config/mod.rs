//! Configuration module for vidask.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, IndexStoreSettings, PromptSettings,
    RagSettings, ServerSettings, Settings, TranscriptSettings,
};
