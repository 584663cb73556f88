//! Collection catalog and routing tables, expressed as data rather than code.
//!
//! The query router and search service both need the same static picture
//! of which collections exist, which domain each belongs to, which
//! keywords boost them, and the fallback chain consulted when the primary
//! collection comes back empty. Keeping that picture here, loaded once at
//! startup, means changing vocabulary or adding a collection never touches
//! routing logic.

use std::collections::HashMap;

use rag_core::{CollectionCatalog, CollectionEntry, Domain};
use serde::{Deserialize, Serialize};

/// One weighted keyword entry used by the router's term matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainKeyword {
    pub term: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

/// Collection catalog, each domain's keyword vocabulary, and the fallback
/// chain consulted when the primary collection returns nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub catalog: CollectionCatalog,
    /// Keyed by `Domain::as_str()` rather than the enum directly, so this
    /// survives round-tripping through TOML/YAML where map keys must be
    /// plain strings.
    #[serde(default)]
    pub keywords: HashMap<String, Vec<DomainKeyword>>,
    #[serde(default)]
    pub fallback_chains: HashMap<String, Vec<Domain>>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let catalog = CollectionCatalog {
            collections: vec![
                CollectionEntry {
                    logical_name: "visa_docs".into(),
                    physical_name: "visa_knowledge_base".into(),
                    domain: Domain::Visa,
                    aliases: vec!["visa_kb".into(), "immigration".into()],
                    tiered: true,
                },
                CollectionEntry {
                    logical_name: "tax_docs".into(),
                    physical_name: "tax_knowledge_base".into(),
                    domain: Domain::Tax,
                    aliases: vec!["tax_kb".into(), "pajak".into()],
                    tiered: true,
                },
                CollectionEntry {
                    logical_name: "legal_docs".into(),
                    physical_name: "legal_knowledge_base".into(),
                    domain: Domain::Legal,
                    aliases: vec!["legal_kb".into(), "hukum".into()],
                    tiered: true,
                },
                CollectionEntry {
                    logical_name: "kbli_docs".into(),
                    physical_name: "kbli_knowledge_base".into(),
                    domain: Domain::Kbli,
                    aliases: vec!["kbli_kb".into(), "business_classification".into()],
                    tiered: false,
                },
                CollectionEntry {
                    logical_name: "property_docs".into(),
                    physical_name: "property_knowledge_base".into(),
                    domain: Domain::Property,
                    aliases: vec!["property_kb".into(), "real_estate".into()],
                    tiered: true,
                },
                CollectionEntry {
                    logical_name: "pricing_docs".into(),
                    physical_name: "pricing_catalog".into(),
                    domain: Domain::Pricing,
                    aliases: vec!["pricing".into(), "harga".into()],
                    tiered: false,
                },
                CollectionEntry {
                    logical_name: "team_docs".into(),
                    physical_name: "team_directory".into(),
                    domain: Domain::Team,
                    aliases: vec!["team".into(), "staff".into()],
                    tiered: false,
                },
                CollectionEntry {
                    logical_name: "general_docs".into(),
                    physical_name: "general_knowledge_base".into(),
                    domain: Domain::General,
                    aliases: vec!["general_kb".into(), "zantara_books".into()],
                    tiered: true,
                },
            ],
        };

        let mut keywords = HashMap::new();
        keywords.insert(Domain::Visa.as_str().to_string(), kw(&[
            ("kitas", 2.0), ("kitap", 2.0), ("visa", 1.5), ("sponsor", 1.2),
            ("immigration", 1.5), ("overstay", 1.8), ("extension", 1.0),
            ("visa on arrival", 1.5), ("working permit", 1.6), ("imigrasi", 1.5),
        ]));
        keywords.insert(Domain::Tax.as_str().to_string(), kw(&[
            ("npwp", 2.0), ("pph", 1.8), ("ppn", 1.8), ("tax", 1.5),
            ("pajak", 1.5), ("annual report", 1.2), ("withholding", 1.4),
            ("spt", 1.6), ("bpjs", 1.3),
        ]));
        keywords.insert(Domain::Legal.as_str().to_string(), kw(&[
            ("contract", 1.5), ("notary", 1.8), ("akta", 1.8), ("dispute", 1.4),
            ("legal", 1.2), ("hukum", 1.5), ("litigation", 1.6), ("agreement", 1.2),
        ]));
        keywords.insert(Domain::Kbli.as_str().to_string(), kw(&[
            ("kbli", 2.0), ("business classification", 1.8), ("nib", 1.6),
            ("oss", 1.5), ("business license", 1.4),
        ]));
        keywords.insert(Domain::Property.as_str().to_string(), kw(&[
            ("villa", 1.5), ("land", 1.3), ("hak pakai", 1.8), ("hak milik", 1.8),
            ("lease", 1.3), ("property", 1.4), ("tanah", 1.4),
        ]));
        keywords.insert(Domain::Pricing.as_str().to_string(), kw(&[
            ("price", 1.5), ("cost", 1.4), ("fee", 1.4), ("quote", 1.6),
            ("harga", 1.5), ("biaya", 1.4), ("package", 1.2),
        ]));
        keywords.insert(Domain::Team.as_str().to_string(), kw(&[
            ("who handles", 1.6), ("contact", 1.2), ("team member", 1.5),
            ("staff", 1.3), ("consultant", 1.3),
        ]));

        let mut fallback_chains = HashMap::new();
        fallback_chains.insert(Domain::Visa.as_str().to_string(), vec![Domain::Legal, Domain::General]);
        fallback_chains.insert(Domain::Tax.as_str().to_string(), vec![Domain::Kbli, Domain::General]);
        fallback_chains.insert(Domain::Legal.as_str().to_string(), vec![Domain::Visa, Domain::General]);
        fallback_chains.insert(Domain::Kbli.as_str().to_string(), vec![Domain::Tax, Domain::General]);
        fallback_chains.insert(Domain::Property.as_str().to_string(), vec![Domain::Legal, Domain::General]);
        fallback_chains.insert(Domain::Pricing.as_str().to_string(), vec![Domain::General]);
        fallback_chains.insert(Domain::Team.as_str().to_string(), vec![Domain::General]);
        fallback_chains.insert(Domain::General.as_str().to_string(), vec![]);

        Self { catalog, keywords, fallback_chains }
    }
}

fn kw(pairs: &[(&str, f32)]) -> Vec<DomainKeyword> {
    pairs
        .iter()
        .map(|(term, weight)| DomainKeyword { term: term.to_string(), weight: *weight })
        .collect()
}

impl RoutingConfig {
    pub fn fallback_chain_for(&self, domain: Domain) -> &[Domain] {
        self.fallback_chains.get(domain.as_str()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keywords_for(&self, domain: Domain) -> &[DomainKeyword] {
        self.keywords.get(domain.as_str()).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_covers_all_domains() {
        let cfg = RoutingConfig::default();
        for domain in Domain::ALL {
            assert!(
                cfg.catalog.default_for_domain(domain).is_some(),
                "missing catalog entry for {domain}"
            );
        }
    }

    #[test]
    fn fallback_chains_never_self_reference() {
        let cfg = RoutingConfig::default();
        for (domain, chain) in &cfg.fallback_chains {
            assert!(!chain.iter().any(|d| d.as_str() == domain));
        }
    }
}
