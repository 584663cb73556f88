//! Shared types and traits for the agentic RAG core
//!
//! This crate provides foundational types used across all other crates:
//! - The core `Error`/`Result` type
//! - Conversation turn types shared by memory, the orchestrator, and persistence
//! - The domain and collection-catalog model the Query Router scores against
//! - Pluggable-backend traits (`Retriever`, `Embedder`, `Reranker`)
//! - The communication analyzer's pure language/procedural/emotion detectors,
//!   shared by the orchestrator and the response post-processor

pub mod communication;
pub mod conversation;
pub mod domain;
pub mod error;
pub mod traits;

pub use communication::{acknowledgment_keywords, detect_language, has_emotional_content, is_procedural, Language, DEFAULT_LANGUAGE};
pub use conversation::{Turn, TurnMetadata, TurnRole};
pub use domain::{CollectionCatalog, CollectionEntry, Domain, RoutingDecision};
pub use error::{Error, Result};
pub use traits::{
    ConversationContext, ConversationTurn, Document, Embedder, Reranker, RerankCandidate,
    RerankScore, Retriever, RetrieveOptions,
};
