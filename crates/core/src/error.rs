//! Shared error type for the RAG core
//!
//! Each crate defines its own typed error enum and converts into this one
//! at the boundary, so callers above the crate that raised it only ever
//! see a single `Error` type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    Store(String),

    #[error("routing error: {0}")]
    Router(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("post-processing error: {0}")]
    Postprocess(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}
