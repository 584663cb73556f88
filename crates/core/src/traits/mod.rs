//! Core traits for the RAG system
//!
//! All pluggable backends (embedding providers, rerankers, the public
//! knowledge-search entry point) implement these traits to enable swapping
//! implementations without code changes and testing with mocks.
//!
//! # Trait Hierarchy
//!
//! ```text
//! Retrieval:
//!   - Retriever: the public "knowledge search" entry point. Both the
//!     Search Service and this entry point call the same pure query router,
//!     so routing decisions stay consistent between the two callers.
//!
//! Embedding:
//!   - Embedder: text -> fixed-dimension vector
//!
//! Reranking:
//!   - Reranker: (query, candidates) -> reordered candidates
//! ```

mod embedder;
mod reranker;
mod retriever;

pub use embedder::Embedder;
pub use reranker::{Reranker, RerankCandidate, RerankScore};
pub use retriever::{ConversationContext, ConversationTurn, Document, Retriever, RetrieveOptions};
