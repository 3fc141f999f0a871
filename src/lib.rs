//! vidask - question answering over YouTube video transcripts.
//!
//! A video's transcript is split into overlapping word windows, embedded and
//! stored in a per-video cosine index. The index is persisted once and reused
//! on later requests; questions are answered from the closest chunks.
//!
//! # Architecture
//!
//! - `chunking` - word-window transcript chunking
//! - `vector_store` - cosine index and persisted artifact stores
//! - `lifecycle` - build-once, reuse-thereafter index management
//! - `retrieval` - index build and nearest-chunk queries
//! - `session` - the active index shared across requests
//! - `transcript` - video references and caption fetching
//! - `embedding` / `generation` - model collaborators
//! - `orchestrator` - pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vidask::config::Settings;
//! use vidask::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(Settings::load()?)?;
//!
//!     let result = orchestrator.process_video("https://youtu.be/dQw4w9WgXcQ").await?;
//!     println!("{}", result.message());
//!
//!     let answer = orchestrator.ask("What is the song about?").await?;
//!     println!("{}", answer.answer);
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod lifecycle;
pub mod openai;
pub mod orchestrator;
pub mod retrieval;
pub mod session;
pub mod transcript;
pub mod vector_store;

pub use error::{Result, VidaskError};
