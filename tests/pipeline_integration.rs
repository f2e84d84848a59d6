//! End-to-end question answering over a small document

mod common;

use common::{pipeline_with, RecordingGenerator, VocabularyEncoder, SAMPLE};
use docqa::chunking::{chunk, Document};
use docqa::embedding::{
    EmbeddingProvider, ExactIndex, HashingProvider, IndexStrategy, VectorIndex,
};
use docqa::error::ErrorKind;
use docqa::generation::NO_INFORMATION_ANSWER;
use docqa::models::ModelContext;
use docqa::pipeline::{AnswerStatus, DocumentState, PipelineSettings, QaPipeline};
use std::sync::Arc;

#[test]
fn test_alice_bob_scenario() {
    let generator = RecordingGenerator::replying("Alice uses Python [Chunk 0].");
    let qa = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings::default(),
    );

    let index = qa
        .process_document(Document::new("people", SAMPLE), 25, 5)
        .unwrap();
    assert_eq!(index.state(), DocumentState::Ready);
    assert_eq!(index.len(), 3);

    let question = "What programming language does Alice use?";
    let results = qa.retrieve(&index, question, 3).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].chunk.index, 0);
    assert_eq!(results[0].chunk.text, "Alice is a Python enginee");

    let answer = qa.answer_question(&index, question, 3, 2000).unwrap();
    assert_eq!(answer.status, AnswerStatus::Generated);
    assert_eq!(answer.sources[0].chunk.index, 0);
    assert_eq!(answer.citations, vec![0]);

    let prompts = generator.calls();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(question));
    assert!(prompts[0].contains("Alice is a Python enginee"));

    let question = "What language does Alice know?";
    let answer = qa.answer_question(&index, question, 1, 2000).unwrap();
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].chunk.index, 0);
    assert_eq!(answer.sources[0].chunk.text, "Alice is a Python enginee");

    let prompts = generator.calls();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains(question));
    assert!(prompts[1].contains("Alice is a Python enginee"));
}

#[test]
fn test_generator_failure_is_generation_failed() {
    let generator = RecordingGenerator::failing();
    let qa = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings::default(),
    );
    let index = qa
        .process_document(Document::new("people", SAMPLE), 25, 5)
        .unwrap();

    let err = qa
        .answer_question(&index, "What language does Alice know?", 1, 2000)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.is_operational());
    // No retry
    assert_eq!(generator.calls().len(), 1);
}

#[test]
fn test_empty_document_scenario() {
    let generator = RecordingGenerator::replying("unused");
    let qa = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings::default(),
    );

    let index = qa.process_document(Document::new("blank", ""), 500, 50).unwrap();
    assert_eq!(index.state(), DocumentState::Ready);
    assert!(index.is_empty());

    let answer = qa
        .answer_question(&index, "What does Alice do?", 3, 2000)
        .unwrap();
    assert_eq!(answer.text, NO_INFORMATION_ANSWER);
    assert_eq!(answer.status, AnswerStatus::NotFound);
    assert!(answer.sources.is_empty());
    assert!(generator.calls().is_empty());
}

#[test]
fn test_budget_smaller_than_any_chunk_skips_generator() {
    let generator = RecordingGenerator::replying("unused");
    let qa = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings::default(),
    );
    let index = qa
        .process_document(Document::new("people", SAMPLE), 25, 5)
        .unwrap();

    let answer = qa.answer_question(&index, "Alice?", 3, 5).unwrap();
    assert_eq!(answer.status, AnswerStatus::NotFound);
    assert!(generator.calls().is_empty());
}

#[test]
fn test_context_budget_drops_whole_chunks() {
    let generator = RecordingGenerator::replying("Python");
    let qa = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings::default(),
    );
    let index = qa
        .process_document(Document::new("people", SAMPLE), 25, 5)
        .unwrap();

    // The first two results fit in 50 chars, the third does not
    let answer = qa.answer_question(&index, "Alice?", 3, 50).unwrap();
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.dropped, 1);
    let used: usize = answer.sources.iter().map(|s| s.chunk.char_len()).sum();
    assert!(used <= 50);
}

#[test]
fn test_top_k_bound_and_ordering() {
    let models = ModelContext::new(Box::new(HashingProvider::new(64).unwrap()), None);
    let qa = QaPipeline::new(Arc::new(models), PipelineSettings::default());

    let text = "Rust has ownership. Borrowing is checked at compile time. \
                Lifetimes name scopes. Traits describe behavior. Macros generate code.";
    let index = qa.process_document(Document::new("rust", text), 30, 10).unwrap();
    let n = index.len();
    assert!(n > 3);

    for k in [1, 2, 3, n, n + 5] {
        let results = qa.retrieve(&index, "What is borrowing?", k).unwrap();
        assert_eq!(results.len(), k.min(n));
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
}

#[test]
fn test_processing_is_deterministic() {
    let models = Arc::new(ModelContext::new(
        Box::new(HashingProvider::new(32).unwrap()),
        None,
    ));
    let qa = QaPipeline::new(models, PipelineSettings::default());

    let a = qa.process_document(Document::new("d", SAMPLE), 20, 4).unwrap();
    let b = qa.process_document(Document::new("d", SAMPLE), 20, 4).unwrap();

    assert_eq!(a.chunks(), b.chunks());
    assert_eq!(a.vectors().vectors(), b.vectors().vectors());
    assert_eq!(a.metadata().content_hash, b.metadata().content_hash);
    assert_eq!(a.chunks(), chunk(SAMPLE, 20, 4).unwrap().as_slice());
}

#[test]
fn test_every_vector_retrieves_itself() {
    let provider = HashingProvider::new(48).unwrap();
    let chunks = chunk(SAMPLE, 12, 3).unwrap();
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

    let vectors = provider.embed_batch(&texts).unwrap();
    let index = ExactIndex::build(vectors.clone()).unwrap();

    for (i, vector) in vectors.iter().enumerate() {
        let top = index.query(vector, 1).unwrap();
        assert_eq!(top[0].distance, 0.0);
        // Identical chunk texts share a vector; the lowest index wins
        assert_eq!(texts[top[0].index], texts[i]);
        assert!(top[0].index <= i);
    }
}

#[test]
fn test_hnsw_strategy_matches_exact_top_result() {
    let generator = RecordingGenerator::replying("Java");
    let exact = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings::default(),
    );
    let hnsw = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings {
            strategy: IndexStrategy::Hnsw,
            ..Default::default()
        },
    );

    let a = exact
        .process_document(Document::new("p", SAMPLE), 25, 5)
        .unwrap();
    let b = hnsw
        .process_document(Document::new("p", SAMPLE), 25, 5)
        .unwrap();
    assert_eq!(b.vectors().strategy(), IndexStrategy::Hnsw);

    let ra = exact.retrieve(&a, "Which language does Bob know?", 1).unwrap();
    let rb = hnsw.retrieve(&b, "Which language does Bob know?", 1).unwrap();
    assert_eq!(ra[0].chunk.index, 1);
    assert_eq!(ra, rb);
}

#[test]
fn test_max_distance_filters_results() {
    let generator = RecordingGenerator::replying("unused");
    let qa = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings {
            max_distance: Some(0.9),
            ..Default::default()
        },
    );
    let index = qa
        .process_document(Document::new("people", SAMPLE), 25, 5)
        .unwrap();

    let results = qa.retrieve(&index, "Alice", 3).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.index, 0);
}

#[test]
fn test_nothing_close_enough_skips_generator() {
    let generator = RecordingGenerator::replying("unused");
    let qa = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings {
            max_distance: Some(0.1),
            ..Default::default()
        },
    );
    let index = qa
        .process_document(Document::new("people", SAMPLE), 25, 5)
        .unwrap();

    let answer = qa.answer_question(&index, "Bob's language?", 3, 2000).unwrap();
    assert_eq!(answer.status, AnswerStatus::NotFound);
    assert!(answer.sources.is_empty());
    assert!(generator.calls().is_empty());
}

#[test]
fn test_processing_error_reports_stage() {
    let generator = RecordingGenerator::replying("unused");
    let qa = pipeline_with(
        VocabularyEncoder::people(),
        &generator,
        PipelineSettings {
            reject_empty: true,
            ..Default::default()
        },
    );

    let err = qa
        .process_document(Document::new("blank", "\n\n"), 500, 50)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyDocument);
    assert!(err.to_string().contains("chunked"));
}
