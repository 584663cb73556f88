//! Pairs the draft answer against `vector_search` tool-trace results and
//! emits a numbered "Sources" footer.

use serde_json::Value;

use crate::types::{Source, ToolTraceEntry};

/// Extracts one `Source` per vector-search result across the whole trace,
/// in trace order, highest-scoring documents first within each call.
pub fn collect_sources(tool_trace: &[ToolTraceEntry]) -> Vec<Source> {
    let mut sources = Vec::new();

    for entry in tool_trace {
        if entry.tool != "vector_search" || !entry.ok {
            continue;
        }

        let Some(results) = entry.result.get("results").and_then(Value::as_array) else {
            continue;
        };

        for result in results {
            let title = result
                .get("metadata")
                .and_then(|m| m.get("title"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string();
            let url = result
                .get("metadata")
                .and_then(|m| m.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let text = result.get("text").and_then(Value::as_str).unwrap_or_default();
            let snippet: String = text.chars().take(160).collect();
            let score = result.get("score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
            let authoritative = result
                .get("metadata")
                .and_then(|m| m.get("authority_tier"))
                .is_some();

            sources.push(Source { title, snippet, url, score, authoritative });
        }
    }

    sources.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    sources
}

/// Appends a numbered "Sources" footer to the draft, one line per source.
pub fn attach_citation_footer(draft: &str, sources: &[Source]) -> String {
    if sources.is_empty() {
        return draft.to_string();
    }

    let footer: String = sources
        .iter()
        .enumerate()
        .map(|(i, s)| match &s.url {
            Some(url) => format!("[{}] {} — {} ({url})", i + 1, s.title, s.snippet),
            None => format!("[{}] {} — {}", i + 1, s.title, s.snippet),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{draft}\n\n## Sources\n{footer}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_sources_from_vector_search_trace() {
        let trace = vec![ToolTraceEntry::new(
            "vector_search",
            json!({ "query": "kitas" }),
            json!({
                "results": [
                    { "text": "KITAS requires a sponsor letter", "metadata": { "title": "KITAS Guide" }, "score": 0.9 }
                ],
                "collection_used": "visa_kb"
            }),
            true,
            42,
        )];

        let sources = collect_sources(&trace);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "KITAS Guide");
    }

    #[test]
    fn marks_source_authoritative_when_metadata_carries_authority_tier() {
        let trace = vec![ToolTraceEntry::new(
            "vector_search",
            json!({ "query": "kitas" }),
            json!({
                "results": [
                    { "text": "KITAS requires a sponsor letter", "metadata": { "title": "KITAS Guide", "authority_tier": 1 }, "score": 0.9 },
                    { "text": "A forum post about KITAS", "metadata": { "title": "Forum" }, "score": 0.4 }
                ]
            }),
            true,
            42,
        )];

        let sources = collect_sources(&trace);
        let guide = sources.iter().find(|s| s.title == "KITAS Guide").unwrap();
        let forum = sources.iter().find(|s| s.title == "Forum").unwrap();
        assert!(guide.authoritative);
        assert!(!forum.authoritative);
    }

    #[test]
    fn ignores_failed_or_non_search_entries() {
        let trace = vec![
            ToolTraceEntry::new("calculator", json!({}), json!({"result": 4.0}), true, 1),
            ToolTraceEntry::new("vector_search", json!({}), json!({"results": []}), false, 1),
        ];
        assert!(collect_sources(&trace).is_empty());
    }

    #[test]
    fn attaches_numbered_footer() {
        let sources = vec![Source {
            title: "KITAS Guide".to_string(),
            snippet: "requires a sponsor letter".to_string(),
            url: None,
            score: 0.9,
            authoritative: false,
        }];
        let result = attach_citation_footer("Here is your answer.", &sources);
        assert!(result.contains("## Sources"));
        assert!(result.contains("[1] KITAS Guide"));
    }

    #[test]
    fn no_sources_leaves_draft_untouched() {
        assert_eq!(attach_citation_footer("plain answer", &[]), "plain answer");
    }
}
