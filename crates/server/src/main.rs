//! Entry point: wires retrieval, the LLM backend, tools, and the agentic
//! orchestrator into an axum server.

use std::sync::Arc;

use rag_agent::AgenticOrchestrator;
use rag_config::load_settings;
use rag_core::Retriever;
use rag_llm::{BackendConfig, LlmBackend, OllamaBackend};
use rag_postprocess::PostProcessor;
use rag_retrieval::{
    CrossEncoderReranker, EmbeddingConfig, HttpEmbeddingProvider, QueryRouter, RerankerConfig,
    SearchService, VectorStoreConfig, QdrantStoreClient,
};
use rag_server::{create_router, init_metrics, AppState};
use rag_tools::{CalculatorTool, PricingLookupTool, SqlLookupTool, ToolRegistry, VectorSearchTool, VisionAnalyzeTool};
use std::collections::HashMap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    init_metrics();

    let settings = load_settings()?;
    tracing::info!(port = settings.server.port, "loaded settings");

    let embedder = Arc::new(HttpEmbeddingProvider::new(EmbeddingConfig {
        endpoint: settings.agent.llm.endpoint.clone(),
        ..EmbeddingConfig::default()
    })?);

    let store = Arc::new(QdrantStoreClient::new(VectorStoreConfig {
        endpoint: settings.agent.search.vector_store_endpoint.clone(),
        ..VectorStoreConfig::default()
    })?);

    let router = Arc::new(QueryRouter::new(Arc::new(settings.routing.clone())));

    let reranker = if settings.agent.search.reranking_enabled {
        Some(Arc::new(CrossEncoderReranker::new(RerankerConfig {
            early_exit_enabled: settings.agent.search.early_exit.enabled,
            confidence_threshold: settings.agent.search.early_exit.confidence_threshold,
            ..RerankerConfig::default()
        })?) as Arc<dyn rag_core::Reranker>)
    } else {
        None
    };

    let search_service: Arc<dyn Retriever> = Arc::new(SearchService::new(
        embedder,
        store,
        router,
        reranker,
        settings.agent.search.clone(),
    ));

    let llm_backend: Arc<dyn LlmBackend> = Arc::new(OllamaBackend::new(BackendConfig {
        llm: settings.agent.llm.clone(),
        ..BackendConfig::default()
    })?);

    let mut tool_registry = ToolRegistry::new();
    tool_registry.register(Arc::new(VectorSearchTool::new(search_service.clone())));
    tool_registry.register(Arc::new(CalculatorTool::default()));
    tool_registry.register(Arc::new(PricingLookupTool::new(search_service.clone(), "pricing")));

    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect_lazy(&settings.database.url)?;
    tool_registry.register(Arc::new(SqlLookupTool::new(db_pool, HashMap::new())));
    tool_registry.register(Arc::new(VisionAnalyzeTool::new(settings.agent.llm.endpoint.clone())));

    let postprocessor = Arc::new(PostProcessor::new(Some(llm_backend.clone())));

    let orchestrator = Arc::new(AgenticOrchestrator::new(
        settings.agent.clone(),
        settings.prompts.clone(),
        llm_backend,
        Arc::new(tool_registry),
        postprocessor,
    ));

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let app_state = AppState::new(settings, orchestrator, search_service);

    let app = create_router(app_state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
