//! Pipeline orchestrator for vidask.
//!
//! Coordinates transcript fetch, index build or reuse, the active session and
//! answer generation.

use crate::chunking::{ChunkRecord, WordWindowChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, VidaskError};
use crate::generation::{format_context, Generator, OpenAIGenerator};
use crate::lifecycle::{artifact_name, IndexLifecycle};
use crate::retrieval::RetrievalService;
use crate::session::{ActiveIndex, HealthReport, Session};
use crate::transcript::{TranscriptSource, VideoRef, YoutubeTranscriptSource};
use crate::vector_store::{create_store, validate_artifact_name, ArtifactStore, SearchHit};
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for the vidask pipeline.
pub struct Orchestrator {
    settings: Settings,
    transcripts: Arc<dyn TranscriptSource>,
    retrieval: RetrievalService,
    lifecycle: IndexLifecycle,
    generator: Arc<dyn Generator>,
    session: Session,
}

impl Orchestrator {
    /// Create an orchestrator with the providers selected in settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let transcripts: Arc<dyn TranscriptSource> =
            Arc::new(YoutubeTranscriptSource::new(&settings.transcript)?);
        let embedder = create_embedder(&settings.embedding)?;
        let generator: Arc<dyn Generator> =
            Arc::new(OpenAIGenerator::new(&settings.rag)?.with_prompts(prompts));
        let store = create_store(&settings)?;

        info!(
            "Using {} embeddings ({} dims), {} for answers",
            embedder.model_id(),
            embedder.dimensions(),
            settings.rag.model
        );

        Self::with_components(settings, transcripts, embedder, generator, store)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        transcripts: Arc<dyn TranscriptSource>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        store: Arc<dyn ArtifactStore>,
    ) -> Result<Self> {
        let chunker =
            WordWindowChunker::with_sizes(settings.chunking.chunk_size, settings.chunking.overlap)?;
        let lifecycle = IndexLifecycle::new(store)
            .with_expected_embedding(embedder.model_id(), embedder.dimensions());

        Ok(Self {
            settings,
            transcripts,
            retrieval: RetrievalService::new(embedder, chunker),
            lifecycle,
            generator,
            session: Session::new(),
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Build (or reuse) the index for a video and make it the active one.
    #[instrument(skip(self))]
    pub async fn process_video(&self, video_url: &str) -> Result<ProcessResult> {
        let video = VideoRef::parse(video_url)?;
        info!("Processing video: {}", video.id);

        let ensured = self
            .lifecycle
            .ensure_index(&video.id, || async {
                let text = self.transcripts.fetch(&video).await?;
                if text.trim().is_empty() {
                    return Err(VidaskError::NotFound(
                        "Transcript is empty after fetch/clean.".to_string(),
                    ));
                }
                self.retrieval
                    .build_from_text(&text, &video.id, &video.url)
                    .await
            })
            .await?;

        let result = ProcessResult {
            video_id: video.id.clone(),
            index_name: ensured.name.clone(),
            chunks_indexed: ensured.index.count(),
            reused: ensured.reused,
        };

        self.session.swap(ActiveIndex {
            name: ensured.name,
            video_id: Some(video.id),
            index: ensured.index,
        })?;

        info!("{}", result.message());
        Ok(result)
    }

    /// Answer a question from the active index.
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = validate_question(question)?;
        let active = self.session.require()?;

        let sources = self
            .retrieval
            .query(&active.index, question, self.settings.rag.top_k)
            .await?;
        let context = format_context(&sources);

        let answer = self.generator.answer(&context, question).await?;
        Ok(Answer { answer, sources })
    }

    /// Rank chunks of the active index against `question` without generating.
    #[instrument(skip(self))]
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<SearchHit>> {
        let question = validate_question(question)?;
        let active = self.session.require()?;
        self.retrieval.search(&active.index, question, k).await
    }

    /// Load a persisted index by artifact name and make it active.
    #[instrument(skip(self))]
    pub async fn activate(&self, name: &str) -> Result<usize> {
        validate_artifact_name(name)?;
        let index = self.lifecycle.load(name).await?;
        let count = index.count();

        self.session.swap(ActiveIndex {
            name: name.to_string(),
            video_id: name.strip_prefix("video_").map(str::to_string),
            index,
        })?;
        Ok(count)
    }

    /// Activate the persisted index of a video given by URL or id.
    pub async fn activate_video(&self, video: &str) -> Result<usize> {
        let video = VideoRef::parse(video)?;
        self.activate(&artifact_name(&video.id)?).await
    }

    pub fn health(&self) -> Result<HealthReport> {
        self.session.health()
    }

    /// Names of all persisted indexes.
    pub async fn list_indexes(&self) -> Result<Vec<String>> {
        self.lifecycle.list().await
    }
}

fn validate_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(VidaskError::InvalidInput(
            "Question cannot be empty".to_string(),
        ));
    }
    Ok(question)
}

/// Result of processing a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub video_id: String,
    pub index_name: String,
    pub chunks_indexed: usize,
    /// True when an existing index was loaded instead of built.
    pub reused: bool,
}

impl ProcessResult {
    /// Human-readable outcome.
    pub fn message(&self) -> String {
        if self.reused {
            format!("Video {} loaded from existing index", self.video_id)
        } else {
            format!(
                "Video {} processed successfully. {} chunks indexed.",
                self.video_id, self.chunks_indexed
            )
        }
    }
}

/// A generated answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,
    /// Retrieved chunks, best first.
    pub sources: Vec<ChunkRecord>,
}
