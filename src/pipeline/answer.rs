//! Answers with source attribution

use crate::generation::NO_INFORMATION_ANSWER;
use crate::retrieval::RetrievalResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// Generator produced an answer from retrieved context
    Generated,
    /// The document holds nothing relevant
    NotFound,
}

/// Result of one question-answer cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    pub status: AnswerStatus,
    /// Chunks given to the generator, most similar first
    pub sources: Vec<RetrievalResult>,
    /// Sequence indices the answer cites as `[Chunk N]`
    pub citations: Vec<usize>,
    /// Retrieved chunks left out of the context budget
    pub dropped: usize,
}

impl Answer {
    /// The fixed answer for a question the document cannot answer
    pub fn not_found(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            text: NO_INFORMATION_ANSWER.to_string(),
            status: AnswerStatus::NotFound,
            sources: Vec::new(),
            citations: Vec::new(),
            dropped: 0,
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == AnswerStatus::Generated
    }

    /// Human-readable answer followed by its sources and confidence
    pub fn render(&self, preview_chars: usize) -> String {
        let mut output = format!("Answer:\n{}\n", self.text);

        if self.sources.is_empty() {
            return output;
        }

        output.push_str("\nSources (confidence):\n");
        for (rank, source) in self.sources.iter().enumerate() {
            let cited = if self.citations.contains(&source.chunk.index) {
                " [cited]"
            } else {
                ""
            };
            output.push_str(&format!(
                "\n{}. Chunk {} (chars {}-{}), relevance {}{}\n   {}\n",
                rank + 1,
                source.chunk.index,
                source.chunk.start,
                source.chunk.end,
                source.confidence(),
                cited,
                source.chunk.preview(preview_chars).replace('\n', " ")
            ));
        }
        output
    }
}

/// True when generated text is the not-found reply
pub(crate) fn is_no_information(text: &str) -> bool {
    let trimmed = text.trim().trim_matches('"').trim();
    trimmed.eq_ignore_ascii_case(NO_INFORMATION_ANSWER)
        || trimmed.eq_ignore_ascii_case(NO_INFORMATION_ANSWER.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    #[test]
    fn test_not_found() {
        let answer = Answer::not_found("Who?");
        assert!(!answer.is_found());
        assert!(answer.sources.is_empty());
        assert_eq!(answer.text, NO_INFORMATION_ANSWER);
        assert_eq!(answer.render(50), format!("Answer:\n{}\n", NO_INFORMATION_ANSWER));
    }

    #[test]
    fn test_render_lists_sources() {
        let answer = Answer {
            question: "Language?".to_string(),
            text: "Python [Chunk 0]".to_string(),
            status: AnswerStatus::Generated,
            sources: vec![RetrievalResult {
                chunk: Chunk {
                    index: 0,
                    text: "Alice is a Python engineer".to_string(),
                    start: 0,
                    end: 26,
                },
                distance: 1.0,
            }],
            citations: vec![0],
            dropped: 0,
        };

        let rendered = answer.render(5);
        assert!(rendered.contains("1. Chunk 0 (chars 0-26), relevance 50.0% [cited]"));
        assert!(rendered.contains("Alice..."));
    }

    #[test]
    fn test_no_information_detection() {
        assert!(is_no_information(NO_INFORMATION_ANSWER));
        assert!(is_no_information(&format!("\"{}\"", NO_INFORMATION_ANSWER)));
        assert!(is_no_information(
            "i could not find information about that in the document"
        ));
        assert!(!is_no_information("Alice knows Python."));
    }
}
