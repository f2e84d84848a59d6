//! Document and query state machines

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing state of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    Unprocessed,
    Chunked,
    Embedded,
    Indexed,
    /// Only state from which questions are accepted
    Ready,
    Failed,
}

impl DocumentState {
    /// The state that follows this one on success
    fn successor(self) -> Option<Self> {
        match self {
            Self::Unprocessed => Some(Self::Chunked),
            Self::Chunked => Some(Self::Embedded),
            Self::Embedded => Some(Self::Indexed),
            Self::Indexed => Some(Self::Ready),
            Self::Ready | Self::Failed => None,
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unprocessed => "unprocessed",
            Self::Chunked => "chunked",
            Self::Embedded => "embedded",
            Self::Indexed => "indexed",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks a document through `Unprocessed → … → Ready`
#[derive(Debug, Clone)]
pub struct Lifecycle {
    document_id: String,
    state: DocumentState,
    last_good: DocumentState,
}

impl Lifecycle {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            state: DocumentState::Unprocessed,
            last_good: DocumentState::Unprocessed,
        }
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Last state reached before a failure (or the current state)
    pub fn last_good(&self) -> DocumentState {
        self.last_good
    }

    /// Move to the next state; returns false if already terminal
    pub fn advance(&mut self) -> bool {
        match self.state.successor() {
            Some(next) => {
                tracing::debug!("Document {}: {} -> {}", self.document_id, self.state, next);
                self.state = next;
                self.last_good = next;
                true
            }
            None => false,
        }
    }

    pub fn fail(&mut self) {
        tracing::debug!(
            "Document {}: {} -> {}",
            self.document_id,
            self.state,
            DocumentState::Failed
        );
        self.state = DocumentState::Failed;
    }
}

/// Stages of one question-answer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    Received,
    QuestionEmbedded,
    Retrieved,
    ContextAssembled,
    Generated,
    Answered,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::QuestionEmbedded => "question_embedded",
            Self::Retrieved => "retrieved",
            Self::ContextAssembled => "context_assembled",
            Self::Generated => "generated",
            Self::Answered => "answered",
        };
        f.write_str(name)
    }
}
