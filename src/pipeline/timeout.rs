//! Bounded answering for interactive callers

use super::{Answer, DocumentIndex, QaPipeline};
use crate::error::{DocQaError, Result};
use crate::generation::GenerationError;
use std::sync::Arc;
use std::time::Duration;

/// Run `answer_question` on the blocking pool and give up after `timeout`.
///
/// The blocking call keeps running in the background after a timeout; its
/// result is discarded.
pub async fn answer_with_timeout(
    pipeline: Arc<QaPipeline>,
    index: Arc<DocumentIndex>,
    question: String,
    top_k: usize,
    max_context_chars: usize,
    timeout: Duration,
) -> Result<Answer> {
    let task = tokio::task::spawn_blocking(move || {
        pipeline.answer_question(&index, &question, top_k, max_context_chars)
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(DocQaError::GenerationFailed(format!(
            "answer task aborted: {}",
            join_error
        ))),
        Err(_) => {
            tracing::warn!("Answer not ready after {:?}", timeout);
            Err(GenerationError::TimedOut(timeout).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Document;
    use crate::embedding::HashingProvider;
    use crate::error::ErrorKind;
    use crate::generation::AnswerGenerator;
    use crate::models::ModelContext;
    use crate::pipeline::PipelineSettings;

    struct Slow(Duration);

    impl AnswerGenerator for Slow {
        fn generate(&self, _prompt: &str) -> std::result::Result<String, GenerationError> {
            std::thread::sleep(self.0);
            Ok("done".to_string())
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    fn setup(delay: Duration) -> (Arc<QaPipeline>, Arc<DocumentIndex>) {
        let models = ModelContext::new(
            Box::new(HashingProvider::new(16).unwrap()),
            Some(Box::new(Slow(delay))),
        );
        let qa = QaPipeline::new(Arc::new(models), PipelineSettings::default());
        let index = qa
            .process_document(Document::new("d", "Some document text."), 100, 10)
            .unwrap();
        (Arc::new(qa), Arc::new(index))
    }

    #[tokio::test]
    async fn test_answer_within_timeout() {
        let (qa, index) = setup(Duration::from_millis(0));
        let answer = answer_with_timeout(qa, index, "What?".into(), 3, 500, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(answer.text, "done");
    }

    #[tokio::test]
    async fn test_slow_generator_times_out() {
        let (qa, index) = setup(Duration::from_millis(500));
        let err = answer_with_timeout(qa, index, "What?".into(), 3, 500, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    }
}
