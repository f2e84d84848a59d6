/// Question-answering pipeline
///
/// Drives a document through chunking, embedding and indexing, then answers
/// questions against the resulting index:
/// - process_document: Unprocessed → Chunked → Embedded → Indexed → Ready
/// - answer_question: Received → QuestionEmbedded → Retrieved →
///   ContextAssembled → Generated → Answered
mod answer;
mod index;
mod lifecycle;
mod timeout;

pub use answer::{Answer, AnswerStatus};
pub use index::{DocumentIndex, IndexMetadata, IndexSettings};
pub use lifecycle::{DocumentState, Lifecycle, QueryStage};
pub use timeout::answer_with_timeout;

use crate::chunking::{self, Document};
use crate::config::Config;
use crate::embedding::{build_index, ExactIndex, HnswParams, IndexStrategy, VectorIndex};
use crate::error::{DocQaError, Result};
use crate::generation::{extract_citations, ContextAssembler};
use crate::models::ModelContext;
use crate::retrieval::{RetrievalResult, Retriever};
use crate::storage::IndexStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Index and retrieval behavior that is fixed for a pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub strategy: IndexStrategy,
    pub hnsw: HnswParams,
    /// Fail on documents with no text instead of indexing them empty
    pub reject_empty: bool,
    pub max_distance: Option<f32>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            strategy: config.indexing.strategy,
            hnsw: config.indexing.hnsw_params(),
            reject_empty: config.indexing.reject_empty,
            max_distance: config.retrieval.max_distance,
        }
    }
}

pub struct QaPipeline {
    models: Arc<ModelContext>,
    settings: PipelineSettings,
}

impl QaPipeline {
    pub fn new(models: Arc<ModelContext>, settings: PipelineSettings) -> Self {
        Self { models, settings }
    }

    pub fn from_config(models: Arc<ModelContext>, config: &Config) -> Self {
        Self::new(models, PipelineSettings::from_config(config))
    }

    pub fn models(&self) -> &ModelContext {
        &self.models
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Chunk, embed and index `document`.
    ///
    /// Invalid chunk parameters are rejected before any work. Failures after
    /// that come back as `Processing` carrying the last state reached.
    pub fn process_document(
        &self,
        document: Document,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<DocumentIndex> {
        chunking::validate_params(chunk_size, chunk_overlap)?;

        let mut lifecycle = Lifecycle::new(document.id());
        match self.build(&document, chunk_size, chunk_overlap, &mut lifecycle) {
            Ok(index) => {
                info!(
                    "Document {} ready: {} chunks, {} index",
                    index.document_id(),
                    index.len(),
                    index.vectors().strategy()
                );
                Ok(index)
            }
            Err(e) => {
                let stage = lifecycle.last_good();
                lifecycle.fail();
                warn!("Processing document {} failed after {}: {}", document.id(), stage, e);
                Err(DocQaError::Processing {
                    stage,
                    source: Box::new(e),
                })
            }
        }
    }

    fn build(
        &self,
        document: &Document,
        chunk_size: usize,
        chunk_overlap: usize,
        lifecycle: &mut Lifecycle,
    ) -> Result<DocumentIndex> {
        let encoder = self.models.encoder_info()?;

        // Whitespace-only text has nothing to retrieve
        let chunks = if document.text().trim().is_empty() {
            Vec::new()
        } else {
            chunking::chunk(document.text(), chunk_size, chunk_overlap)?
        };
        lifecycle.advance();
        debug!("Document {} split into {} chunks", document.id(), chunks.len());

        let vectors: Box<dyn VectorIndex> = if chunks.is_empty() {
            if self.settings.reject_empty {
                return Err(DocQaError::EmptyDocument {
                    id: document.id().to_string(),
                });
            }
            info!("Document {} has no text; building an empty index", document.id());
            lifecycle.advance();
            lifecycle.advance();
            Box::new(ExactIndex::empty(encoder.dimension))
        } else {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.models.encode(&texts)?;
            lifecycle.advance();

            let index = build_index(self.settings.strategy, embeddings, &self.settings.hnsw)?;
            lifecycle.advance();
            index
        };

        let metadata = IndexMetadata {
            document_id: document.id().to_string(),
            content_hash: document.content_hash(),
            settings: IndexSettings {
                chunk_size,
                chunk_overlap,
                encoder_model: encoder.model_name,
                dimension: encoder.dimension,
                strategy: vectors.strategy(),
                hnsw: self.settings.hnsw,
            },
            created_at: Utc::now(),
        };
        let index = DocumentIndex::from_parts(metadata, chunks, vectors)?;
        lifecycle.advance();
        Ok(index)
    }

    /// Nearest `top_k` chunks to `question`, without generation
    pub fn retrieve(
        &self,
        index: &DocumentIndex,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        Retriever::new(&self.models)
            .with_max_distance(self.settings.max_distance)
            .retrieve(question, index, top_k)
    }

    /// Answer `question` from the chunks of `index`.
    ///
    /// When nothing relevant survives retrieval and the context budget, the
    /// fixed not-found answer is returned and the generator is not called.
    pub fn answer_question(
        &self,
        index: &DocumentIndex,
        question: &str,
        top_k: usize,
        max_context_chars: usize,
    ) -> Result<Answer> {
        if max_context_chars == 0 {
            return Err(DocQaError::invalid_config(
                "retrieval.max_context_chars",
                "max_context_chars must be greater than 0",
            ));
        }
        debug!("Query {}: {:?}", QueryStage::Received, question);

        let results = self.retrieve(index, question, top_k)?;
        debug!("Query {}: {} results", QueryStage::Retrieved, results.len());

        let prompt = ContextAssembler::new(max_context_chars).assemble(question, results);
        debug!(
            "Query {}: {} chunks, {} chars, {} dropped",
            QueryStage::ContextAssembled,
            prompt.sources().len(),
            prompt.context_chars(),
            prompt.dropped()
        );

        if !prompt.has_context() {
            info!("No relevant context for question; answering not found");
            return Ok(Answer::not_found(question));
        }

        let text = self.models.generate(prompt.text())?;
        let text = text.trim().to_string();
        debug!("Query {}: {} chars", QueryStage::Generated, text.chars().count());

        let status = if answer::is_no_information(&text) {
            AnswerStatus::NotFound
        } else {
            AnswerStatus::Generated
        };
        let dropped = prompt.dropped();
        let sources = prompt.into_sources();
        let citations = extract_citations(&text, &sources);

        debug!("Query {}", QueryStage::Answered);
        Ok(Answer {
            question: question.to_string(),
            text,
            status,
            sources,
            citations,
            dropped,
        })
    }

    /// Check that a stored index can be queried with the loaded encoder
    pub fn validate_index(&self, index: &DocumentIndex) -> Result<()> {
        index.check_compatible(&self.models.encoder_info()?)
    }

    /// Load the index held by `store`, refusing one built by another encoder
    /// Reject a context budget that cannot hold one full chunk of `index`.
    ///
    /// `answer_question` itself accepts any non-zero budget; callers that
    /// take the budget from configuration check it here first so a bad
    /// setting is not reported as a not-found answer.
    pub fn check_context_budget(
        &self,
        index: &DocumentIndex,
        max_context_chars: usize,
    ) -> Result<()> {
        let chunk_size = index.settings().chunk_size;
        if !index.is_empty() && max_context_chars < chunk_size {
            return Err(DocQaError::invalid_config(
                "retrieval.max_context_chars",
                format!(
                    "max_context_chars ({}) is smaller than the index chunk size ({})",
                    max_context_chars, chunk_size
                ),
            ));
        }
        Ok(())
    }

    pub fn load_index(&self, store: &IndexStore) -> Result<DocumentIndex> {
        let index = store.load()?;
        self.validate_index(&index)?;
        Ok(index)
    }
}
