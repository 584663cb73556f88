//! Domain and collection catalog types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical domains the Query Router scores queries against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Visa,
    Tax,
    Legal,
    Kbli,
    Property,
    Pricing,
    Team,
    /// Fallback when no domain scores above zero.
    General,
}

impl Domain {
    pub const ALL: [Domain; 8] = [
        Domain::Visa,
        Domain::Tax,
        Domain::Legal,
        Domain::Kbli,
        Domain::Property,
        Domain::Pricing,
        Domain::Team,
        Domain::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Visa => "visa",
            Domain::Tax => "tax",
            Domain::Legal => "legal",
            Domain::Kbli => "kbli",
            Domain::Property => "property",
            Domain::Pricing => "pricing",
            Domain::Team => "team",
            Domain::General => "general",
        }
    }

    /// Fixed priority used to break ties among equally-scored domains.
    /// Lower is higher priority.
    pub fn tie_break_priority(&self) -> u8 {
        match self {
            Domain::Pricing => 0,
            Domain::Visa => 1,
            Domain::Tax => 2,
            Domain::Legal => 3,
            Domain::Kbli => 4,
            Domain::Property => 5,
            Domain::Team => 6,
            Domain::General => 7,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static configuration entry for one logical collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionEntry {
    /// Logical name used by routing and tool calls.
    pub logical_name: String,
    /// Physical backing collection name in the vector store.
    pub physical_name: String,
    pub domain: Domain,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Collections that apply tier-based access filtering.
    #[serde(default)]
    pub tiered: bool,
}

/// The static collection catalog plus the routing tables derived from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionCatalog {
    pub collections: Vec<CollectionEntry>,
}

impl CollectionCatalog {
    /// Resolve an alias or logical name to its canonical physical collection.
    pub fn canonicalize(&self, name: &str) -> Option<&str> {
        self.collections.iter().find_map(|c| {
            if c.logical_name == name || c.aliases.iter().any(|a| a == name) {
                Some(c.physical_name.as_str())
            } else {
                None
            }
        })
    }

    pub fn by_logical_name(&self, name: &str) -> Option<&CollectionEntry> {
        self.collections.iter().find(|c| c.logical_name == name)
    }

    pub fn by_physical_name(&self, name: &str) -> Option<&CollectionEntry> {
        self.collections.iter().find(|c| c.physical_name == name)
    }

    pub fn is_tiered(&self, logical_name: &str) -> bool {
        self.by_logical_name(logical_name)
            .map(|c| c.tiered)
            .unwrap_or(false)
    }

    /// Same as `is_tiered`, keyed by the physical collection name the
    /// router and search service actually pass around.
    pub fn is_tiered_physical(&self, physical_name: &str) -> bool {
        self.by_physical_name(physical_name)
            .map(|c| c.tiered)
            .unwrap_or(false)
    }

    pub fn default_for_domain(&self, domain: Domain) -> Option<&CollectionEntry> {
        self.collections.iter().find(|c| c.domain == domain)
    }

    pub fn as_map(&self) -> HashMap<&str, &CollectionEntry> {
        self.collections
            .iter()
            .map(|c| (c.logical_name.as_str(), c))
            .collect()
    }
}

/// Output of the query router: which collection to search first, what to
/// fall back to if it comes back empty, and how confident the routing call
/// was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub primary_domain: Domain,
    pub primary_collection: String,
    pub fallback_chain: Vec<String>,
    /// 0.0 (no domain matched, routed to General by default) to 1.0
    /// (primary domain scored well clear of every runner-up).
    pub confidence: f32,
    /// Raw per-domain scores, keyed by `Domain::as_str()`, for logging.
    pub domain_scores: HashMap<String, f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_resolves_alias() {
        let catalog = CollectionCatalog {
            collections: vec![CollectionEntry {
                logical_name: "visa_docs".into(),
                physical_name: "visa_knowledge_base".into(),
                domain: Domain::Visa,
                aliases: vec!["visa_kb".into()],
                tiered: false,
            }],
        };

        assert_eq!(catalog.canonicalize("visa_kb"), Some("visa_knowledge_base"));
        assert_eq!(catalog.canonicalize("visa_docs"), Some("visa_knowledge_base"));
        assert_eq!(catalog.canonicalize("unknown"), None);
    }

    #[test]
    fn is_tiered_physical_matches_by_physical_name() {
        let catalog = CollectionCatalog {
            collections: vec![CollectionEntry {
                logical_name: "visa_docs".into(),
                physical_name: "visa_knowledge_base".into(),
                domain: Domain::Visa,
                aliases: vec![],
                tiered: true,
            }],
        };

        assert!(catalog.is_tiered_physical("visa_knowledge_base"));
        assert!(!catalog.is_tiered_physical("pricing_catalog"));
    }

    #[test]
    fn tie_break_priority_is_total_order() {
        let mut domains = Domain::ALL.to_vec();
        domains.sort_by_key(|d| d.tie_break_priority());
        assert_eq!(domains[0], Domain::Pricing);
    }
}
