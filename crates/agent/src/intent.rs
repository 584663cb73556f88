//! Intent Classifier.
//!
//! Pattern-based (regex-free keyword) classifier mapping raw query text to
//! `{intent, tier}`. Pure and cheap enough to run inline before every turn —
//! no learned model, no network call. Rules are explicit lists reviewed in
//! this file, not weights in a trained checkpoint.

use rag_config::ModelTier;

/// Named categories the classifier recognizes, grouped by the tier they
/// route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentCategory {
    Greeting,
    Casual,
    Identity,
    BusinessSimple,
    BusinessComplex,
    Strategy,
    Analysis,
    Risk,
    Comparison,
    /// No category matched; defaults to `Pro` per spec.
    Unclassified,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Greeting => "greeting",
            IntentCategory::Casual => "casual",
            IntentCategory::Identity => "identity",
            IntentCategory::BusinessSimple => "business_simple",
            IntentCategory::BusinessComplex => "business_complex",
            IntentCategory::Strategy => "strategy",
            IntentCategory::Analysis => "analysis",
            IntentCategory::Risk => "risk",
            IntentCategory::Comparison => "comparison",
            IntentCategory::Unclassified => "unclassified",
        }
    }

    pub fn tier(&self) -> ModelTier {
        match self {
            IntentCategory::Greeting
            | IntentCategory::Casual
            | IntentCategory::Identity
            | IntentCategory::BusinessSimple => ModelTier::Fast,
            IntentCategory::BusinessComplex | IntentCategory::Unclassified => ModelTier::Pro,
            IntentCategory::Strategy | IntentCategory::Analysis | IntentCategory::Risk | IntentCategory::Comparison => {
                ModelTier::DeepThink
            }
        }
    }
}

/// Result of classifying one query.
#[derive(Debug, Clone)]
pub struct DetectedIntent {
    pub category: IntentCategory,
    pub tier: ModelTier,
    pub matched_keywords: Vec<String>,
}

struct CompiledCategory {
    category: IntentCategory,
    keywords: &'static [&'static str],
}

/// Checked in this order: the most specific, highest-reasoning categories
/// first, so a query that mentions both a simple fact and a comparison
/// ("costa di più rispetto a...") routes to the tier that needs the bigger
/// model, not the cheaper one.
fn categories() -> &'static [CompiledCategory] {
    const TABLE: &[CompiledCategory] = &[
        CompiledCategory {
            category: IntentCategory::Strategy,
            keywords: &["strategia", "strategy", "piano a lungo termine", "long-term plan", "roadmap"],
        },
        CompiledCategory {
            category: IntentCategory::Risk,
            keywords: &["rischio", "rischi", "risk", "pericolo", "conseguenze legali", "legal consequences"],
        },
        CompiledCategory {
            category: IntentCategory::Comparison,
            keywords: &["confronto", "rispetto a", "meglio di", "compare", "versus", "vs.", "differenza tra"],
        },
        CompiledCategory {
            category: IntentCategory::Analysis,
            keywords: &["analisi", "analizza", "analyze", "valutazione approfondita", "in-depth"],
        },
        CompiledCategory {
            category: IntentCategory::BusinessComplex,
            keywords: &["requisiti", "costi", "procedure", "documenti necessari", "requirements", "procedure completa"],
        },
        CompiledCategory {
            category: IntentCategory::Identity,
            keywords: &["chi sei", "cosa sei", "who are you", "what are you"],
        },
        CompiledCategory {
            category: IntentCategory::Greeting,
            keywords: &["ciao", "salve", "buongiorno", "buonasera", "hello", "hi ", "halo"],
        },
        CompiledCategory {
            category: IntentCategory::Casual,
            keywords: &["come stai", "grazie", "va bene", "ok", "how are you", "thanks"],
        },
        CompiledCategory {
            category: IntentCategory::BusinessSimple,
            keywords: &["quanto costa", "prezzo", "dove", "quando", "price", "where", "when"],
        },
    ];
    TABLE
}

/// Classifies `text` into an intent category and its model tier.
pub fn classify(text: &str) -> DetectedIntent {
    let lower = text.to_lowercase();

    for entry in categories() {
        let matched: Vec<String> = entry.keywords.iter().filter(|kw| lower.contains(**kw)).map(|kw| kw.to_string()).collect();
        if !matched.is_empty() {
            return DetectedIntent { category: entry.category, tier: entry.category.tier(), matched_keywords: matched };
        }
    }

    DetectedIntent { category: IntentCategory::Unclassified, tier: ModelTier::Pro, matched_keywords: Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_routes_to_fast() {
        let intent = classify("Ciao, come stai?");
        assert_eq!(intent.tier, ModelTier::Fast);
    }

    #[test]
    fn business_complex_keywords_route_to_pro() {
        let intent = classify("Quali sono i requisiti e i costi per il KITAS investor?");
        assert_eq!(intent.category.as_str(), "business_complex");
        assert_eq!(intent.tier, ModelTier::Pro);
    }

    #[test]
    fn strategy_and_risk_route_to_deep_think() {
        assert_eq!(classify("Qual è la strategia migliore per aprire una PT PMA?").tier, ModelTier::DeepThink);
        assert_eq!(classify("Quali sono i rischi legali di questa struttura?").tier, ModelTier::DeepThink);
    }

    #[test]
    fn comparison_beats_simple_pricing_keyword() {
        // Contains both a simple "price" keyword and a comparison marker;
        // the comparison category is checked first, so it must win.
        let intent = classify("Qual è il prezzo, a confronto con l'altra opzione?");
        assert_eq!(intent.category.as_str(), "comparison");
        assert_eq!(intent.tier, ModelTier::DeepThink);
    }

    #[test]
    fn no_match_defaults_to_pro() {
        let intent = classify("xyz random gibberish 12345");
        assert_eq!(intent.category.as_str(), "unclassified");
        assert_eq!(intent.tier, ModelTier::Pro);
    }
}
