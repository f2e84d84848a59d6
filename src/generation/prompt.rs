//! Grounded prompt assembly from retrieved chunks

use crate::retrieval::RetrievalResult;

/// Fixed reply when the document holds nothing relevant to the question
pub const NO_INFORMATION_ANSWER: &str =
    "I could not find information about that in the document.";

const CHUNK_SEPARATOR: &str = "\n\n";

/// Prompt text plus the retrieved chunks it actually contains
#[derive(Debug, Clone)]
pub struct Prompt {
    text: String,
    question: String,
    sources: Vec<RetrievalResult>,
    dropped: usize,
    context_chars: usize,
}

impl Prompt {
    /// Full prompt text handed to the generator
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Chunks included in the context, most similar first
    pub fn sources(&self) -> &[RetrievalResult] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<RetrievalResult> {
        self.sources
    }

    /// False when the prompt is the no-information fallback
    pub fn has_context(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Retrieved chunks left out to respect the context budget
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Characters of chunk text in the context
    pub fn context_chars(&self) -> usize {
        self.context_chars
    }
}

/// Builds bounded, source-tagged prompts
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_context_chars: usize,
    tag_chunks: bool,
}

impl ContextAssembler {
    pub fn new(max_context_chars: usize) -> Self {
        Self {
            max_context_chars,
            tag_chunks: true,
        }
    }

    /// Prefix each chunk with `[Chunk N]` (on by default)
    pub fn with_tags(mut self, tag_chunks: bool) -> Self {
        self.tag_chunks = tag_chunks;
        self
    }

    /// Concatenate chunks in the order given until the next whole chunk
    /// would push the chunk text past `max_context_chars`.
    pub fn assemble(&self, question: &str, results: Vec<RetrievalResult>) -> Prompt {
        let retrieved = results.len();
        let mut sources = Vec::with_capacity(retrieved);
        let mut used = 0usize;

        for result in results {
            let len = result.chunk.char_len();
            if used + len > self.max_context_chars {
                break;
            }
            used += len;
            sources.push(result);
        }
        let dropped = retrieved - sources.len();

        if dropped > 0 {
            tracing::debug!(
                "Context budget {} chars: kept {} of {} chunks",
                self.max_context_chars,
                sources.len(),
                retrieved
            );
        }

        let text = if sources.is_empty() {
            Self::fallback_prompt(question)
        } else {
            let context = sources
                .iter()
                .map(|r| {
                    if self.tag_chunks {
                        format!("[Chunk {}] {}", r.chunk.index, r.chunk.text)
                    } else {
                        r.chunk.text.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(CHUNK_SEPARATOR);
            Self::grounded_prompt(question, &context)
        };

        Prompt {
            text,
            question: question.to_string(),
            sources,
            dropped,
            context_chars: used,
        }
    }

    fn grounded_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Answer the question using ONLY the document context below.
Do not use outside knowledge. If the context does not contain the answer, reply exactly: "{not_found}"
When you use a chunk, cite it as [Chunk N].

QUESTION: {question}

DOCUMENT CONTEXT:
{context}

ANSWER:"#,
            not_found = NO_INFORMATION_ANSWER,
            question = question,
            context = context
        )
    }

    fn fallback_prompt(question: &str) -> String {
        format!(
            r#"No relevant content was found in the document for this question.
Reply exactly: "{not_found}"

QUESTION: {question}

ANSWER:"#,
            not_found = NO_INFORMATION_ANSWER,
            question = question
        )
    }
}
