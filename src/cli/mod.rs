//! CLI module for vidask.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// vidask - ask questions about YouTube videos
///
/// Indexes a video's transcript once, then answers questions from the
/// passages most similar to each question.
#[derive(Parser, Debug)]
#[command(name = "vidask")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDASK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a video's transcript and build its index (reused if it exists)
    Index {
        /// YouTube URL or video ID
        video: String,
    },

    /// Ask a question about a video
    Ask {
        /// The question to ask
        question: String,

        /// Video URL or ID to answer from (indexed on demand)
        #[arg(long)]
        video: Option<String>,

        /// Number of transcript chunks used as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show the transcript chunks most similar to a query
    Search {
        /// Search query
        query: String,

        /// Video URL or ID to search (indexed on demand)
        #[arg(long)]
        video: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// List persisted indexes
    List,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
