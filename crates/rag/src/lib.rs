//! Retrieval pipeline for the agentic RAG core.
//!
//! - Keyword-weighted domain routing with a fallback chain
//! - HTTP embedding gateway with exponential-backoff retry
//! - Qdrant vector store client with a pure filter-dict translator
//! - Cross-encoder reranker with confidence-threshold early exit
//! - Search Service composing all of the above behind the core
//!   `Retriever` trait, with oversampling, content-hash dedup, and a
//!   single-flight query cache

pub mod embedding;
pub mod reranker;
pub mod router;
pub mod search;
pub mod store;

pub use embedding::{EmbeddingConfig, HttpEmbeddingProvider, MockEmbeddingProvider};
pub use reranker::{CrossEncoderReranker, RerankerConfig, SimpleScorer};
pub use router::QueryRouter;
pub use search::SearchService;
pub use store::{FilterOp, MetadataFilter, QdrantStoreClient, StoredPoint, VectorStoreClient, VectorStoreConfig};
