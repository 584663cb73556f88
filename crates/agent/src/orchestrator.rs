//! Agentic Orchestrator: the Start → Reasoning → Acting → Finalize state
//! machine that drives one query end to end.
//!
//! `Reasoning` sends the accumulated messages to the tier the intent
//! classifier picked. The model either answers directly (→ `Finalize`) or
//! emits a `TOOL_CALL: {"name": ..., "arguments": {...}}` line (→ `Acting`).
//! `Acting` validates and dispatches through the tool registry — the only
//! side-effecting boundary this orchestrator may cross — appends the
//! observation, and loops back to `Reasoning`. Two failures of the same
//! tool, or exceeding the per-query tool budget, forces `Finalize` with
//! whatever was gathered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rag_config::{AgentConfig, ModelTier, PromptTemplates};
use rag_core::{Turn, TurnRole};
use rag_llm::{LlmBackend, Message, PromptBuilder};
use rag_postprocess::{PostProcessor, Source, ToolTraceEntry, VerificationTier};
use rag_tools::{ToolExecutor, ToolRegistry};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::intent::classify;
use crate::memory::ConversationMemory;
use crate::AgentError;

/// Lifecycle events emitted by the streaming variant of `process_query`.
#[derive(Debug, Clone)]
pub enum AgentStreamEvent {
    Token(String),
    ToolStart { tool: String, args: Value },
    ToolEnd { tool: String, ok: bool, latency_ms: u64 },
    Sources(Vec<Source>),
    Verification { score: u8, tier: String },
    Done,
    Cancelled,
}

/// Result of `process_query`.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Source>,
    pub verification_score: u8,
    pub verification_tier: VerificationTier,
    pub tool_trace: Vec<ToolTraceEntry>,
}

/// Streaming context threaded through the reasoning loop: where to emit
/// lifecycle events, and the flag the caller sets to request cancellation.
struct StreamContext<'a> {
    tx: &'a mpsc::Sender<AgentStreamEvent>,
    cancel: &'a AtomicBool,
}

pub struct AgenticOrchestrator {
    config: AgentConfig,
    templates: PromptTemplates,
    llm: Arc<dyn LlmBackend>,
    tools: Arc<ToolRegistry>,
    postprocessor: Arc<PostProcessor>,
}

impl AgenticOrchestrator {
    pub fn new(
        config: AgentConfig,
        templates: PromptTemplates,
        llm: Arc<dyn LlmBackend>,
        tools: Arc<ToolRegistry>,
        postprocessor: Arc<PostProcessor>,
    ) -> Self {
        Self { config, templates, llm, tools, postprocessor }
    }

    /// Runs one query to completion and returns the finalized answer.
    pub async fn process_query(
        &self,
        query: &str,
        conversation_history: &[Turn],
    ) -> Result<QueryResult, AgentError> {
        let intent = classify(query);
        let memory = ConversationMemory::from_history(conversation_history, self.config.memory.clone());
        let mut messages = self.build_initial_messages(query, intent.tier, &memory);
        let mut tool_trace = Vec::new();

        let draft = self
            .reasoning_loop(intent.tier, &mut messages, &mut tool_trace, None)
            .await?
            .expect("reasoning loop only returns None when a cancellation flag was supplied");

        let processed = self.postprocessor.process(&draft, query, &tool_trace).await;

        Ok(QueryResult {
            answer: processed.text,
            sources: processed.sources,
            verification_score: processed.verification_score,
            verification_tier: processed.verification_tier,
            tool_trace,
        })
    }

    /// Runs one query, emitting lifecycle events on `tx` as they happen.
    /// Checked against `cancel` at every reasoning step; if set, in-flight
    /// work stops and a `Cancelled` event is emitted instead of `Done`.
    /// Partial state is discarded — no post-processing runs.
    pub async fn process_query_stream(
        &self,
        query: &str,
        conversation_history: &[Turn],
        tx: mpsc::Sender<AgentStreamEvent>,
        cancel: Arc<AtomicBool>,
    ) -> Result<(), AgentError> {
        let intent = classify(query);
        let memory = ConversationMemory::from_history(conversation_history, self.config.memory.clone());
        let mut messages = self.build_initial_messages(query, intent.tier, &memory);
        let mut tool_trace = Vec::new();

        let stream = StreamContext { tx: &tx, cancel: cancel.as_ref() };
        let draft = match self.reasoning_loop(intent.tier, &mut messages, &mut tool_trace, Some(&stream)).await? {
            Some(draft) => draft,
            None => {
                let _ = tx.send(AgentStreamEvent::Cancelled).await;
                return Ok(());
            }
        };

        let processed = self.postprocessor.process(&draft, query, &tool_trace).await;
        let _ = tx.send(AgentStreamEvent::Sources(processed.sources)).await;
        let _ = tx
            .send(AgentStreamEvent::Verification {
                score: processed.verification_score,
                tier: processed.verification_tier.as_str().to_string(),
            })
            .await;
        let _ = tx.send(AgentStreamEvent::Done).await;
        Ok(())
    }

    /// The Reasoning/Acting loop. Returns `Ok(None)` only when cancellation
    /// was observed; otherwise the finalized draft text.
    async fn reasoning_loop(
        &self,
        tier: ModelTier,
        messages: &mut Vec<Message>,
        tool_trace: &mut Vec<ToolTraceEntry>,
        stream: Option<&StreamContext<'_>>,
    ) -> Result<Option<String>, AgentError> {
        let mut failed_tools: HashMap<String, u32> = HashMap::new();

        loop {
            if let Some(s) = stream {
                if s.cancel.load(Ordering::Relaxed) {
                    return Ok(None);
                }
            }

            let result = self.llm.generate(messages, tier).await?;

            match parse_tool_call(&result.text) {
                Some((tool_name, args)) if tool_trace.len() < self.config.max_tool_calls as usize => {
                    if let Some(s) = stream {
                        if s.tx.send(AgentStreamEvent::ToolStart { tool: tool_name.clone(), args: args.clone() }).await.is_err() {
                            return Ok(Some(self.best_effort_draft(tool_trace)));
                        }
                    }

                    let start = Instant::now();
                    let executor = ToolExecutor::new(self.tools.clone());
                    let outcome = executor.execute(&tool_name, args.clone()).await;
                    let latency_ms = start.elapsed().as_millis() as u64;
                    let ok = outcome.is_ok();

                    if let Some(s) = stream {
                        if s.tx.send(AgentStreamEvent::ToolEnd { tool: tool_name.clone(), ok, latency_ms }).await.is_err() {
                            return Ok(Some(self.best_effort_draft(tool_trace)));
                        }
                    }

                    match outcome {
                        Ok(output) => {
                            failed_tools.remove(&tool_name);
                            messages.push(Message::assistant(result.text.clone()));
                            messages.push(Message::tool(format!("Result of {tool_name}: {output}")));
                            tool_trace.push(ToolTraceEntry::new(tool_name, args, output, true, latency_ms));
                        }
                        Err(e) => {
                            let failures = failed_tools.entry(tool_name.clone()).or_insert(0);
                            *failures += 1;
                            let repeated_failure = *failures >= 2;
                            tool_trace.push(ToolTraceEntry::new(
                                tool_name.clone(),
                                args,
                                json!({ "error": e.to_string() }),
                                false,
                                latency_ms,
                            ));

                            if repeated_failure {
                                return Ok(Some(self.best_effort_draft(tool_trace)));
                            }

                            messages.push(Message::assistant(result.text.clone()));
                            messages.push(Message::tool(format!(
                                "Tool {tool_name} failed: {e}. Do not call it again with the same arguments; try a different approach or answer directly."
                            )));
                        }
                    }
                }
                // Tool budget exhausted: the model wants another call we won't make.
                Some(_) => return Ok(Some(self.best_effort_draft(tool_trace))),
                None => {
                    if let Some(s) = stream {
                        for word in result.text.split_inclusive(' ') {
                            if s.tx.send(AgentStreamEvent::Token(word.to_string())).await.is_err() {
                                break;
                            }
                        }
                    }
                    return Ok(Some(result.text));
                }
            }
        }
    }

    fn best_effort_draft(&self, tool_trace: &[ToolTraceEntry]) -> String {
        tool_trace
            .iter()
            .rev()
            .find(|t| t.ok)
            .and_then(|t| t.result.get("results").or_else(|| t.result.get("entries")))
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|r| r.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.templates.fallbacks.technical_issue.clone())
    }

    fn build_initial_messages(&self, query: &str, tier: ModelTier, memory: &ConversationMemory) -> Vec<Message> {
        let history: Vec<Message> = memory.recent_turns().iter().map(turn_to_message).collect();

        let mut messages = PromptBuilder::new()
            .system_prompt(tier, &self.templates)
            .with_memory(&memory.known_facts_summary())
            .with_history(&history)
            .user_message(query)
            .build();

        messages.insert(1, self.tool_catalog_message());
        messages
    }

    fn tool_catalog_message(&self) -> Message {
        let mut text = String::from(
            "## Tools\nWhen you need a tool, respond with exactly one line:\n\
             TOOL_CALL: {\"name\": \"<tool name>\", \"arguments\": {...}}\n\
             and nothing else on that turn. Otherwise, answer the user directly in plain text.\n\n\
             Available tools:\n",
        );
        for schema in self.tools.schemas() {
            text.push_str(&format!("- {}: {}\n", schema.name, schema.description));
        }
        Message::system(text)
    }
}

fn turn_to_message(turn: &Turn) -> Message {
    match turn.role {
        TurnRole::User => Message::user(turn.content.clone()),
        TurnRole::Assistant => Message::assistant(turn.content.clone()),
        TurnRole::System => Message::system(turn.content.clone()),
    }
}

/// Looks for a `TOOL_CALL: {...}` line and parses its JSON body. Any other
/// shape of response is treated as the model's final answer.
fn parse_tool_call(text: &str) -> Option<(String, Value)> {
    for line in text.lines() {
        let trimmed = line.trim();
        let body = trimmed.strip_prefix("TOOL_CALL:").or_else(|| trimmed.strip_prefix("tool_call:"))?;
        let value: Value = serde_json::from_str(body.trim()).ok()?;
        let name = value.get("name").and_then(Value::as_str)?.to_string();
        let arguments = value.get("arguments").cloned().unwrap_or_else(|| json!({}));
        return Some((name, arguments));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_tool_call() {
        let text = "TOOL_CALL: {\"name\": \"calculator\", \"arguments\": {\"expression\": \"2+2\"}}";
        let (name, args) = parse_tool_call(text).unwrap();
        assert_eq!(name, "calculator");
        assert_eq!(args["expression"], "2+2");
    }

    #[test]
    fn plain_answer_has_no_tool_call() {
        assert!(parse_tool_call("Il tuo KITAS richiede una sponsor letter.").is_none());
    }

    #[test]
    fn malformed_tool_call_json_is_ignored() {
        assert!(parse_tool_call("TOOL_CALL: not json").is_none());
    }
}
