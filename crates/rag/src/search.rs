//! Search service: composes the query router, vector store, and reranker
//! into the public knowledge-search entry point.
//!
//! Flow per query: route to a primary collection plus its (confidence-
//! truncated) fallback chain, fan every target collection out
//! concurrently — each carrying a tier filter when it applies to a tiered
//! collection — merge every collection's candidates, dedup by content
//! hash keeping the highest score per duplicate, apply the pricing boost
//! when the query was routed as pricing, skip reranking when the top
//! merged score already clears the early-exit threshold, otherwise rerank
//! with a cross-encoder (falling back to vector-score order if the
//! reranker errors), then resolve any remaining ties by effective date,
//! authority tier, and finally insertion order. Results are cached
//! single-flight per query for a short TTL since advisory answers don't
//! need per-request freshness.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use rag_config::SearchConfig;
use rag_core::{Document, Domain, Embedder, Reranker, RerankCandidate, Result, Retriever, RetrieveOptions};

use crate::router::QueryRouter;
use crate::store::{FilterOp, MetadataFilter, StoredPoint, VectorStoreClient};

/// Additive score boost applied when the query was routed (or detected)
/// as pricing.
const PRICING_BOOST: f32 = 0.15;
/// Vector score above which reranking is skipped entirely (step 7).
const EARLY_EXIT_VECTOR_SCORE: f32 = 0.9;

struct CacheEntry {
    inserted_at: Instant,
    documents: Vec<Document>,
}

pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStoreClient>,
    router: Arc<QueryRouter>,
    reranker: Option<Arc<dyn Reranker>>,
    config: SearchConfig,
    cache: DashMap<String, CacheEntry>,
    name: String,
}

impl SearchService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStoreClient>,
        router: Arc<QueryRouter>,
        reranker: Option<Arc<dyn Reranker>>,
        config: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            router,
            reranker,
            config,
            cache: DashMap::new(),
            name: "search_service".to_string(),
        }
    }

    fn cache_key(query: &str, options: &RetrieveOptions) -> String {
        let mut hasher = DefaultHasher::new();
        query.hash(&mut hasher);
        options.top_k.hash(&mut hasher);
        options.user_level.hash(&mut hasher);
        options.tier_filter.hash(&mut hasher);
        options.collection_override.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    fn cached(&self, key: &str) -> Option<Vec<Document>> {
        let entry = self.cache.get(key)?;
        if entry.inserted_at.elapsed() > Duration::from_secs(self.config.cache_ttl_seconds) {
            return None;
        }
        Some(entry.documents.clone())
    }

    fn store_cache(&self, key: String, documents: Vec<Document>) {
        self.cache.insert(
            key,
            CacheEntry { inserted_at: Instant::now(), documents },
        );
    }

    fn content_hash(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.trim().to_lowercase().hash(&mut hasher);
        hasher.finish()
    }

    async fn search_collection(
        &self,
        collection: &str,
        vector: &[f32],
        oversampled_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<StoredPoint>> {
        self.store.search(collection, vector, oversampled_k, filter).await
    }

    /// Builds the tier filter applied to tiered collections: documents
    /// whose required level clears the caller's `user_level`, narrowed
    /// further to an explicit tier when one was requested.
    fn tier_filter(options: &RetrieveOptions) -> MetadataFilter {
        let mut filter = MetadataFilter::new()
            .with("required_level", FilterOp::Lte(serde_json::Value::from(options.user_level)));
        if let Some(tier) = &options.tier_filter {
            filter = filter.with("tier", FilterOp::Eq(serde_json::Value::String(tier.clone())));
        }
        filter
    }

    /// Merges points from every searched collection, deduping by content
    /// hash and keeping the highest-scoring copy of each duplicate while
    /// preserving first-seen order for later tie-breaking. Applies the
    /// pricing boost before the dedup comparison so a boosted duplicate
    /// from a fallback collection can still win over an unboosted one.
    fn dedup(points: Vec<(String, StoredPoint)>, apply_pricing_boost: bool) -> Vec<Document> {
        let mut documents: Vec<Document> = Vec::with_capacity(points.len());
        let mut index: std::collections::HashMap<u64, usize> = std::collections::HashMap::new();

        for (source_collection, point) in points {
            let content = point
                .payload
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let hash = Self::content_hash(&content);
            let score = if apply_pricing_boost { point.score + PRICING_BOOST } else { point.score };

            let mut doc = Document::new(point.id, content, score, source_collection);
            for (k, v) in point.payload {
                doc = doc.with_metadata(k, v);
            }

            match index.get(&hash) {
                Some(&pos) => {
                    if doc.score > documents[pos].score {
                        documents[pos] = doc;
                    }
                }
                None => {
                    index.insert(hash, documents.len());
                    documents.push(doc);
                }
            }
        }

        documents
    }

    async fn rerank_or_fallback(&self, query: &str, mut documents: Vec<Document>, top_k: usize) -> Vec<Document> {
        let Some(reranker) = &self.reranker else {
            documents.sort_by(Self::tie_broken_order);
            documents.truncate(top_k);
            return documents;
        };

        let candidates: Vec<RerankCandidate> = documents
            .iter()
            .map(|d| (d.id.clone(), d.content.clone()))
            .collect();

        match reranker.rerank(query, &candidates, top_k).await {
            Ok(scored) => {
                let mut by_id: std::collections::HashMap<String, f32> = scored.into_iter().collect();
                documents.retain(|d| by_id.contains_key(&d.id));
                for doc in documents.iter_mut() {
                    if let Some(score) = by_id.remove(&doc.id) {
                        doc.score = score;
                    }
                }
                documents.sort_by(Self::tie_broken_order);
                documents.truncate(top_k);
                documents
            }
            Err(e) => {
                tracing::warn!(error = %e, "reranker unavailable, falling back to vector-score order");
                documents.sort_by(Self::tie_broken_order);
                documents.truncate(top_k);
                documents
            }
        }
    }

    /// Descending by score; ties broken by effective_date (newer wins),
    /// then authority_tier (lower value wins), then original insertion
    /// order (stable sort preserves it).
    fn tie_broken_order(a: &Document, b: &Document) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        match b.score.partial_cmp(&a.score) {
            Some(Ordering::Equal) | None => {}
            Some(ord) => return ord,
        }

        let a_date = a.metadata.get("effective_date").and_then(|v| v.as_str());
        let b_date = b.metadata.get("effective_date").and_then(|v| v.as_str());
        match (b_date, a_date) {
            (Some(bd), Some(ad)) if bd != ad => return bd.cmp(ad),
            _ => {}
        }

        let a_tier = a.metadata.get("authority_tier").and_then(|v| v.as_i64()).unwrap_or(i64::MAX);
        let b_tier = b.metadata.get("authority_tier").and_then(|v| v.as_i64()).unwrap_or(i64::MAX);
        a_tier.cmp(&b_tier)
    }
}

#[async_trait]
impl Retriever for SearchService {
    async fn retrieve(&self, query: &str, options: &RetrieveOptions) -> Result<Vec<Document>> {
        let key = Self::cache_key(query, options);
        if let Some(cached) = self.cached(&key) {
            return Ok(cached);
        }

        let vector = self.embedder.embed(query).await?;
        let oversampled_k = options.top_k * self.config.oversample_factor.max(1);

        let (target_collections, is_pricing) = if let Some(ref name) = options.collection_override {
            (vec![name.clone()], false)
        } else {
            let decision = self.router.route(query);
            let mut collections = vec![decision.primary_collection.clone()];
            collections.extend(decision.fallback_chain.iter().cloned());
            (collections, decision.primary_domain == Domain::Pricing)
        };

        let catalog = self.router.catalog();
        let filters: Vec<Option<MetadataFilter>> = target_collections
            .iter()
            .map(|collection| {
                if catalog.is_tiered_physical(collection) {
                    Some(Self::tier_filter(options))
                } else {
                    None
                }
            })
            .collect();

        // Every target collection is searched concurrently; a collection
        // that errors (including a timeout) contributes zero candidates
        // with a warning rather than failing the whole query.
        let searches = target_collections
            .iter()
            .zip(filters.iter())
            .map(|(collection, filter)| self.search_collection(collection, &vector, oversampled_k, filter.as_ref()));
        let results = join_all(searches).await;

        let mut points: Vec<(String, StoredPoint)> = Vec::new();
        for (collection, result) in target_collections.iter().zip(results) {
            match result {
                Ok(found) => points.extend(found.into_iter().map(|p| (collection.clone(), p))),
                Err(e) => tracing::warn!(collection = %collection, error = %e, "collection search failed, contributing zero candidates"),
            }
        }

        let documents = Self::dedup(points, is_pricing);
        let filtered: Vec<Document> = documents
            .into_iter()
            .filter(|d| d.score >= self.config.min_score)
            .collect();

        let top_vector_score = filtered.iter().map(|d| d.score).fold(f32::MIN, f32::max);

        let final_docs = if self.config.reranking_enabled && top_vector_score <= EARLY_EXIT_VECTOR_SCORE {
            self.rerank_or_fallback(query, filtered, options.top_k).await
        } else {
            if self.config.reranking_enabled {
                metrics::counter!("rag_search_rerank_early_exit_total").increment(1);
                tracing::info!(top_vector_score, "early exit: top vector score clears threshold, skipping rerank");
            }
            let mut docs = filtered;
            docs.sort_by(Self::tie_broken_order);
            docs.truncate(options.top_k);
            docs
        };

        self.store_cache(key, final_docs.clone());
        Ok(final_docs)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingProvider;
    use crate::router::QueryRouter;
    use crate::store::StoredPoint;
    use async_trait::async_trait;
    use rag_config::RoutingConfig;
    use std::collections::HashMap as StdHashMap;

    struct FakeStore {
        points: Vec<StoredPoint>,
    }

    #[async_trait]
    impl VectorStoreClient for FakeStore {
        async fn search(
            &self,
            _collection: &str,
            _vector: &[f32],
            top_k: usize,
            _filter: Option<&MetadataFilter>,
        ) -> Result<Vec<StoredPoint>> {
            Ok(self.points.iter().take(top_k).cloned().collect())
        }
    }

    impl Clone for StoredPoint {
        fn clone(&self) -> Self {
            Self {
                id: self.id.clone(),
                score: self.score,
                payload: self.payload.clone(),
            }
        }
    }

    fn point(id: &str, score: f32, content: &str) -> StoredPoint {
        let mut payload = StdHashMap::new();
        payload.insert("content".to_string(), serde_json::Value::String(content.to_string()));
        StoredPoint { id: id.to_string(), score, payload }
    }

    fn service(points: Vec<StoredPoint>) -> SearchService {
        SearchService::new(
            Arc::new(MockEmbeddingProvider::new(32)),
            Arc::new(FakeStore { points }),
            Arc::new(QueryRouter::new(Arc::new(RoutingConfig::default()))),
            None,
            SearchConfig { reranking_enabled: false, ..SearchConfig::default() },
        )
    }

    #[tokio::test]
    async fn retrieve_dedups_identical_content() {
        let service = service(vec![
            point("a", 0.9, "KITAS extension requires a sponsor letter"),
            point("b", 0.8, "kitas extension requires a sponsor letter"),
            point("c", 0.7, "NPWP registration takes five business days"),
        ]);

        let docs = service
            .retrieve("kitas extension", &RetrieveOptions::default())
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn retrieve_respects_min_score() {
        let service = service(vec![
            point("a", 0.9, "high relevance document"),
            point("b", 0.1, "low relevance document"),
        ]);

        let docs = service
            .retrieve("kitas", &RetrieveOptions::default())
            .await
            .unwrap();

        assert!(docs.iter().all(|d| d.score >= 0.5));
    }

    #[tokio::test]
    async fn retrieve_caches_identical_queries() {
        let service = service(vec![point("a", 0.9, "KITAS extension process")]);
        let options = RetrieveOptions::default();

        let first = service.retrieve("kitas extension", &options).await.unwrap();
        let second = service.retrieve("kitas extension", &options).await.unwrap();

        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].id, second[0].id);
    }

    struct MultiCollectionStore {
        by_collection: StdHashMap<String, Vec<StoredPoint>>,
        filters_seen: std::sync::Mutex<Vec<(String, Option<MetadataFilter>)>>,
    }

    #[async_trait]
    impl VectorStoreClient for MultiCollectionStore {
        async fn search(
            &self,
            collection: &str,
            _vector: &[f32],
            top_k: usize,
            filter: Option<&MetadataFilter>,
        ) -> Result<Vec<StoredPoint>> {
            self.filters_seen.lock().unwrap().push((collection.to_string(), filter.cloned()));
            Ok(self
                .by_collection
                .get(collection)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .take(top_k)
                .collect())
        }
    }

    fn multi_service(store: Arc<MultiCollectionStore>, reranking_enabled: bool) -> SearchService {
        SearchService::new(
            Arc::new(MockEmbeddingProvider::new(32)),
            store,
            Arc::new(QueryRouter::new(Arc::new(RoutingConfig::default()))),
            None,
            SearchConfig { reranking_enabled, ..SearchConfig::default() },
        )
    }

    #[tokio::test]
    async fn retrieve_fans_out_and_merges_across_collections() {
        // "visa legal requirements" lands at medium confidence, so the
        // router keeps exactly one fallback (legal) behind visa.
        let mut by_collection = StdHashMap::new();
        by_collection.insert(
            "visa_knowledge_base".to_string(),
            vec![point("v1", 0.8, "KITAS sponsor letter requirements")],
        );
        by_collection.insert(
            "legal_knowledge_base".to_string(),
            vec![point("l1", 0.75, "notarized agreement requirements")],
        );

        let store = Arc::new(MultiCollectionStore { by_collection, filters_seen: std::sync::Mutex::new(Vec::new()) });
        let service = multi_service(store, false);

        let docs = service
            .retrieve("visa legal requirements", &RetrieveOptions::default())
            .await
            .unwrap();

        let ids: std::collections::HashSet<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert!(ids.contains("v1"), "expected primary collection's candidate in merged results");
        assert!(ids.contains("l1"), "expected fallback collection's candidate in merged results");
    }

    #[tokio::test]
    async fn retrieve_only_filters_tiered_collections() {
        let mut by_collection = StdHashMap::new();
        by_collection.insert("visa_knowledge_base".to_string(), vec![point("v1", 0.8, "visa doc")]);
        by_collection.insert("kbli_knowledge_base".to_string(), vec![point("k1", 0.8, "kbli doc")]);

        let store = Arc::new(MultiCollectionStore { by_collection, filters_seen: std::sync::Mutex::new(Vec::new()) });
        let service = multi_service(store.clone(), false);

        // Visa (tiered) should carry a filter; kbli (not tiered) should not.
        service.retrieve("visa requirements", &RetrieveOptions::default()).await.unwrap();
        service.retrieve("kbli classification", &RetrieveOptions::default()).await.unwrap();

        let seen = store.filters_seen.lock().unwrap();
        let visa_filter = seen.iter().find(|(c, _)| c == "visa_knowledge_base").unwrap();
        let kbli_filter = seen.iter().find(|(c, _)| c == "kbli_knowledge_base").unwrap();
        assert!(visa_filter.1.is_some());
        assert!(kbli_filter.1.is_none());
    }

    #[tokio::test]
    async fn retrieve_applies_pricing_boost_when_query_is_pricing() {
        let mut by_collection = StdHashMap::new();
        by_collection.insert("pricing_catalog".to_string(), vec![point("p1", 0.7, "KITAS investor package price")]);

        let store = Arc::new(MultiCollectionStore { by_collection, filters_seen: std::sync::Mutex::new(Vec::new()) });
        let service = multi_service(store, false);

        let docs = service
            .retrieve("how much does a KITAS investor package cost?", &RetrieveOptions::default())
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert!((docs[0].score - (0.7 + super::PRICING_BOOST)).abs() < 1e-6);
    }

    struct FakeReranker {
        invoked: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl Reranker for FakeReranker {
        async fn rerank(
            &self,
            _query: &str,
            candidates: &[RerankCandidate],
            top_k: usize,
        ) -> Result<Vec<(String, f32)>> {
            self.invoked.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(candidates.iter().take(top_k).map(|(id, _)| (id.clone(), 0.42)).collect())
        }
    }

    #[tokio::test]
    async fn retrieve_skips_rerank_when_top_vector_score_clears_threshold() {
        let service = SearchService::new(
            Arc::new(MockEmbeddingProvider::new(32)),
            Arc::new(FakeStore { points: vec![point("a", 0.95, "KITAS extension process")] }),
            Arc::new(QueryRouter::new(Arc::new(RoutingConfig::default()))),
            Some(Arc::new(FakeReranker { invoked: std::sync::atomic::AtomicBool::new(false) })),
            SearchConfig { reranking_enabled: true, ..SearchConfig::default() },
        );

        let docs = service.retrieve("kitas extension", &RetrieveOptions::default()).await.unwrap();
        assert_eq!(docs[0].score, 0.95, "early exit should leave the vector score untouched");
    }

    #[tokio::test]
    async fn retrieve_reranks_when_top_vector_score_is_below_threshold() {
        let reranker = Arc::new(FakeReranker { invoked: std::sync::atomic::AtomicBool::new(false) });
        let service = SearchService::new(
            Arc::new(MockEmbeddingProvider::new(32)),
            Arc::new(FakeStore { points: vec![point("a", 0.6, "KITAS extension process")] }),
            Arc::new(QueryRouter::new(Arc::new(RoutingConfig::default()))),
            Some(reranker.clone()),
            SearchConfig { reranking_enabled: true, ..SearchConfig::default() },
        );

        service.retrieve("kitas extension", &RetrieveOptions::default()).await.unwrap();
        assert!(reranker.invoked.load(std::sync::atomic::Ordering::SeqCst));
    }
}
