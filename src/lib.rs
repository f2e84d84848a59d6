//! docqa - Grounded document question answering
//!
//! Splits one document into overlapping chunks, embeds them with a local
//! encoder, and answers questions by retrieving the nearest chunks and
//! handing only those to a text-generation model.

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod retrieval;
pub mod storage;

pub use error::{DocQaError, Result};
