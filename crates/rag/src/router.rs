//! Query router: scores a query against the domain keyword tables and
//! decides which collection to search first, and what to fall back to.
//!
//! Pure function of (query, config) with no module-level state, so the
//! public `search` entry point and the search service's own internal
//! routing call always agree on where a given query should land.

use std::collections::HashMap;
use std::sync::Arc;

use rag_config::RoutingConfig;
use rag_core::{CollectionCatalog, Domain, RoutingDecision};

/// Confidence at or above which the fallback chain is dropped entirely —
/// the primary collection alone is trusted.
const HIGH_CONFIDENCE: f32 = 0.7;
/// Below this, the full configured fallback chain is kept; in between,
/// only the first fallback is.
const LOW_CONFIDENCE: f32 = 0.3;

/// Phrase groups that mark a query as asking about price. Every word in a
/// group must appear in the (lowercased) query for the group to match.
/// Checked independently of the additive keyword score, the same way
/// `domain_boost::DomainBooster::detect_intent` classifies
/// `QueryIntent::RateInquiry` apart from its term-boost accumulation.
const PRICING_PHRASE_GROUPS: &[&[&str]] = &[
    &["how", "much"],
    &["how", "cost"],
    &["price", "of"],
    &["cost", "of"],
    &["quanto", "costa"],
    &["berapa", "harga"],
    &["berapa", "biaya"],
];

pub struct QueryRouter {
    config: Arc<RoutingConfig>,
}

impl QueryRouter {
    pub fn new(config: Arc<RoutingConfig>) -> Self {
        Self { config }
    }

    pub fn catalog(&self) -> &CollectionCatalog {
        &self.config.catalog
    }

    /// True when `query` matches one of the pricing phrase groups.
    pub fn is_pricing_query(query: &str) -> bool {
        let query_lower = query.to_lowercase();
        PRICING_PHRASE_GROUPS
            .iter()
            .any(|group| group.iter().all(|word| query_lower.contains(word)))
    }

    /// Score `query` against every domain's keyword table and pick the
    /// collection to search first.
    ///
    /// Ties are broken by `Domain::tie_break_priority`: lower priority
    /// value wins. A query that matches nothing routes to `Domain::General`
    /// with zero confidence rather than failing.
    ///
    /// The pricing detector runs first and, when it fires, overrides the
    /// keyword scoring entirely: it forces the primary collection to
    /// pricing and returns with no fallback chain (S4). Otherwise the
    /// fallback chain returned is truncated by the computed confidence:
    /// empty at `HIGH_CONFIDENCE` or above, one entry between
    /// `LOW_CONFIDENCE` and `HIGH_CONFIDENCE`, the full configured chain
    /// below `LOW_CONFIDENCE` (P2).
    pub fn route(&self, query: &str) -> RoutingDecision {
        let query_lower = query.to_lowercase();
        let mut scores: HashMap<Domain, f32> = HashMap::new();

        for domain in Domain::ALL {
            if domain == Domain::General {
                continue;
            }
            let mut score = 0.0f32;
            for keyword in self.config.keywords_for(domain) {
                if query_lower.contains(&keyword.term) {
                    score += keyword.weight;
                }
            }
            if score > 0.0 {
                scores.insert(domain, score);
            }
        }

        let domain_scores: HashMap<String, f32> = scores
            .iter()
            .map(|(&d, &s)| (d.as_str().to_string(), s))
            .collect();

        if Self::is_pricing_query(query) {
            let primary_collection = self.collection_for(Domain::Pricing);
            return RoutingDecision {
                primary_domain: Domain::Pricing,
                primary_collection,
                fallback_chain: Vec::new(),
                confidence: 1.0,
                domain_scores,
            };
        }

        let ranked = Self::rank(&scores);
        let (primary_domain, confidence) = match ranked.first() {
            Some(&(domain, score)) => {
                let total: f32 = scores.values().sum();
                let confidence = if total > 0.0 { score / total } else { 0.0 };
                (domain, confidence)
            }
            None => (Domain::General, 0.0),
        };

        let primary_collection = self.collection_for(primary_domain);
        let full_chain: Vec<String> = self
            .config
            .fallback_chain_for(primary_domain)
            .iter()
            .filter_map(|d| self.config.catalog.default_for_domain(*d))
            .map(|c| c.physical_name.clone())
            .collect();

        let fallback_chain = if confidence >= HIGH_CONFIDENCE {
            Vec::new()
        } else if confidence >= LOW_CONFIDENCE {
            full_chain.into_iter().take(1).collect()
        } else {
            full_chain
        };

        RoutingDecision {
            primary_domain,
            primary_collection,
            fallback_chain,
            confidence,
            domain_scores,
        }
    }

    fn collection_for(&self, domain: Domain) -> String {
        self.config
            .catalog
            .default_for_domain(domain)
            .map(|c| c.physical_name.clone())
            .unwrap_or_else(|| domain.as_str().to_string())
    }

    /// Sort (domain, score) descending by score, ties broken by
    /// ascending tie-break priority.
    fn rank(scores: &HashMap<Domain, f32>) -> Vec<(Domain, f32)> {
        let mut ranked: Vec<(Domain, f32)> = scores.iter().map(|(&d, &s)| (d, s)).collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.tie_break_priority().cmp(&b.0.tie_break_priority()))
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> QueryRouter {
        QueryRouter::new(Arc::new(RoutingConfig::default()))
    }

    #[test]
    fn routes_visa_query_to_visa_collection() {
        let decision = router().route("what documents do I need for a KITAS extension");
        assert_eq!(decision.primary_domain, Domain::Visa);
        assert!(decision.confidence > 0.0);
    }

    #[test]
    fn unmatched_query_routes_to_general_with_zero_confidence() {
        let decision = router().route("what's the weather like today");
        assert_eq!(decision.primary_domain, Domain::General);
        assert_eq!(decision.confidence, 0.0);
    }

    #[test]
    fn tie_break_prefers_pricing_over_visa() {
        let mut scores = HashMap::new();
        scores.insert(Domain::Visa, 1.0);
        scores.insert(Domain::Pricing, 1.0);
        let ranked = QueryRouter::rank(&scores);
        assert_eq!(ranked[0].0, Domain::Pricing);
    }

    #[test]
    fn fallback_chain_is_empty_at_high_confidence() {
        // Only visa keywords match, so confidence is 1.0 — no runner-up domain.
        let decision = router().route("KITAS sponsor requirements");
        assert!(decision.confidence >= HIGH_CONFIDENCE);
        assert!(decision.fallback_chain.is_empty());
    }

    #[test]
    fn fallback_chain_has_one_entry_at_medium_confidence() {
        let decision = router().route("visa legal requirements");
        assert!(decision.confidence >= LOW_CONFIDENCE && decision.confidence < HIGH_CONFIDENCE);
        assert_eq!(decision.fallback_chain.len(), 1);
    }

    #[test]
    fn fallback_chain_is_full_at_low_confidence() {
        let cfg = RoutingConfig::default();
        let decision = router().route("visa legal tax kbli property");
        assert!(decision.confidence < LOW_CONFIDENCE);

        let expected: Vec<String> = cfg
            .fallback_chain_for(decision.primary_domain)
            .iter()
            .filter_map(|d| cfg.catalog.default_for_domain(*d))
            .map(|c| c.physical_name.clone())
            .collect();
        assert_eq!(decision.fallback_chain, expected);
        assert!(!decision.fallback_chain.is_empty());
    }

    #[test]
    fn fallback_chain_never_exceeds_three() {
        for query in [
            "KITAS sponsor requirements",
            "visa legal requirements",
            "visa legal tax kbli property",
            "what's the weather like today",
        ] {
            let decision = router().route(query);
            assert!(decision.fallback_chain.len() <= 3);
        }
    }

    #[test]
    fn pricing_phrase_overrides_keyword_routing() {
        let decision = router().route("how much does a KITAS extension cost?");
        assert_eq!(decision.primary_domain, Domain::Pricing);
        assert!(decision.fallback_chain.is_empty());
        assert_eq!(decision.confidence, 1.0);
    }

    #[test]
    fn pricing_phrase_detector_is_independent_of_keyword_table() {
        assert!(QueryRouter::is_pricing_query("quanto costa il visto KITAS investor?"));
        assert!(QueryRouter::is_pricing_query("berapa biaya NPWP?"));
        assert!(!QueryRouter::is_pricing_query("what documents do I need for a KITAS extension"));
    }
}
