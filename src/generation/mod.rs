//! Answer generation: prompt assembly, the generator boundary and
//! citation linking

mod citation;
mod generator;
mod prompt;

pub use citation::extract_citations;
pub use generator::{AnswerGenerator, GenerationError, OllamaGenerator};
pub use prompt::{ContextAssembler, Prompt, NO_INFORMATION_ANSWER};
