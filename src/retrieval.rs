//! Retrieval over a per-video index.
//!
//! Build and query share one embedder so stored and query vectors live in the
//! same space.

use crate::chunking::{ChunkRecord, WordWindowChunker};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchHit, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Builds indexes from transcript text and answers nearest-chunk queries.
pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    chunker: WordWindowChunker,
}

impl RetrievalService {
    pub fn new(embedder: Arc<dyn Embedder>, chunker: WordWindowChunker) -> Self {
        Self { embedder, chunker }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn chunker(&self) -> &WordWindowChunker {
        &self.chunker
    }

    /// Chunk `text`, embed every chunk in one batch and load a fresh index.
    ///
    /// Records are stamped with the video's id and URL before embedding.
    #[instrument(skip(self, text), fields(words = text.split_whitespace().count()))]
    pub async fn build_from_text(
        &self,
        text: &str,
        video_id: &str,
        video_url: &str,
    ) -> Result<VectorIndex> {
        let records: Vec<ChunkRecord> = self
            .chunker
            .chunk(text)
            .into_iter()
            .map(|record| record.with_source(video_id, video_url))
            .collect();

        info!("Embedding {} chunks for video {}", records.len(), video_id);

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let mut index = VectorIndex::new(self.embedder.model_id(), self.embedder.dimensions());
        index.add(vectors, records)?;

        debug!("Built index with {} entries", index.count());
        Ok(index)
    }

    /// Embed `question` and return the `k` nearest records with scores.
    #[instrument(skip(self, index))]
    pub async fn search(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let query = self.embedder.embed(question).await?;
        index.search(&query, k)
    }

    /// Embed `question` and return the `k` nearest records in rank order.
    pub async fn query(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
    ) -> Result<Vec<ChunkRecord>> {
        Ok(self
            .search(index, question, k)
            .await?
            .into_iter()
            .map(|hit| hit.record)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VidaskError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds text as counts of the letters a, b and c.
    struct LetterEmbedder {
        batch_calls: AtomicUsize,
    }

    impl LetterEmbedder {
        fn new() -> Self {
            Self {
                batch_calls: AtomicUsize::new(0),
            }
        }

        fn vector(text: &str) -> Vec<f32> {
            ['a', 'b', 'c']
                .iter()
                .map(|letter| text.chars().filter(|c| c == letter).count() as f32)
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(Self::vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            "letters"
        }
    }

    /// Returns one vector too few.
    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]; texts.len().saturating_sub(1)])
        }

        fn dimensions(&self) -> usize {
            1
        }

        fn model_id(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_build_from_text_stamps_and_embeds_once() {
        let embedder = Arc::new(LetterEmbedder::new());
        let service = RetrievalService::new(
            embedder.clone(),
            WordWindowChunker::with_sizes(2, 0).unwrap(),
        );

        let index = service
            .build_from_text("aaa aa bbb bb ccc cc", "vid12345678", "https://youtu.be/vid12345678")
            .await
            .unwrap();

        assert_eq!(index.count(), 3);
        assert_eq!(index.embedding_model(), "letters");
        assert_eq!(index.dimension(), 3);
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
        for record in index.records() {
            assert_eq!(record.video_id, "vid12345678");
            assert_eq!(record.video_url, "https://youtu.be/vid12345678");
        }
    }

    #[tokio::test]
    async fn test_query_returns_ranked_records() {
        let service = RetrievalService::new(
            Arc::new(LetterEmbedder::new()),
            WordWindowChunker::with_sizes(2, 0).unwrap(),
        );
        let index = service
            .build_from_text("aaa aa bbb bb ccc cc", "vid12345678", "url")
            .await
            .unwrap();

        let records = service.query(&index, "bbbb", 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "bbb bb");

        let hits = service.search(&index, "cc", 1).await.unwrap();
        assert_eq!(hits[0].record.text, "ccc cc");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_text_builds_empty_index() {
        let service =
            RetrievalService::new(Arc::new(LetterEmbedder::new()), WordWindowChunker::default());
        let index = service.build_from_text("   ", "vid12345678", "url").await.unwrap();
        assert!(index.is_empty());
        assert!(service.query(&index, "abc", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedder_arity_mismatch_surfaces() {
        let service = RetrievalService::new(
            Arc::new(ShortEmbedder),
            WordWindowChunker::with_sizes(1, 0).unwrap(),
        );
        let err = service.build_from_text("one two", "vid12345678", "url").await.unwrap_err();
        assert!(matches!(err, VidaskError::ArityMismatch { vectors: 1, records: 2 }));
    }
}
