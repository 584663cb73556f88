//! Prompt templates configuration
//!
//! System prompts and response fallbacks, kept as data so prompt wording
//! can change without touching the orchestrator that composes them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which model tier a system prompt applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Cheap, low-latency model for simple factual lookups.
    Fast,
    /// Mid-tier model for most advisory questions.
    Pro,
    /// Slow, high-reasoning model for multi-step or ambiguous questions.
    DeepThink,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Pro => "pro",
            ModelTier::DeepThink => "deep_think",
        }
    }
}

/// Prompt templates configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplates {
    /// Persona and base instructions shared by every tier.
    #[serde(default)]
    pub system_prompt: SystemPrompt,
    /// Per-tier guidance appended to the base system prompt.
    #[serde(default)]
    pub tier_prompts: HashMap<String, TierPrompt>,
    /// Error/fallback responses
    #[serde(default)]
    pub fallbacks: FallbackTemplates,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        let mut tier_prompts = HashMap::new();
        tier_prompts.insert(ModelTier::Fast.as_str().to_string(), TierPrompt::fast());
        tier_prompts.insert(ModelTier::Pro.as_str().to_string(), TierPrompt::pro());
        tier_prompts.insert(ModelTier::DeepThink.as_str().to_string(), TierPrompt::deep_think());

        Self {
            system_prompt: SystemPrompt::default(),
            tier_prompts,
            fallbacks: FallbackTemplates::default(),
        }
    }
}

/// Base system prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPrompt {
    /// Assistant role description
    pub role: String,
    /// Assistant name
    pub agent_name: String,
    /// Organization name
    pub company_name: String,
    /// Core instructions
    pub instructions: Vec<String>,
    /// Compliance requirements
    pub compliance: Vec<String>,
    /// Behavior guidelines
    pub guidelines: Vec<String>,
    /// Things to avoid
    pub avoid: Vec<String>,
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self {
            role: "You are a knowledgeable advisor on Indonesian visa, tax, legal, and business matters.".to_string(),
            agent_name: "Zantara".to_string(),
            company_name: "Bali Zero".to_string(),
            instructions: vec![
                "Answer questions using only the retrieved context provided to you".to_string(),
                "Cite the source collection behind every factual claim".to_string(),
                "Call a tool when the answer requires a calculation, a price, or a lookup you don't already know".to_string(),
                "Ask a clarifying question when the request is ambiguous rather than guessing".to_string(),
            ],
            compliance: vec![
                "Never state a regulation has changed unless it is present in retrieved context".to_string(),
                "Disclose that this is general guidance, not formal legal or tax advice".to_string(),
                "Do not fabricate document numbers, dates, or fees".to_string(),
            ],
            guidelines: vec![
                "Be direct and precise".to_string(),
                "Use the customer's language (Indonesian or English) consistently".to_string(),
                "Keep responses focused on the question asked".to_string(),
            ],
            avoid: vec![
                "Making promises about processing times or approval outcomes".to_string(),
                "Sharing internal reasoning or tool call details with the customer".to_string(),
                "Answering outside the visa/tax/legal/business domain".to_string(),
            ],
        }
    }
}

impl SystemPrompt {
    /// Build the base system prompt text shared by every tier.
    pub fn build(&self) -> String {
        let mut prompt = format!(
            "{}\n\nYou are {}. You work for {}.\n\n",
            self.role, self.agent_name, self.company_name
        );

        prompt.push_str("## Instructions\n");
        for instruction in &self.instructions {
            prompt.push_str(&format!("- {}\n", instruction));
        }

        prompt.push_str("\n## Compliance Requirements\n");
        for req in &self.compliance {
            prompt.push_str(&format!("- {}\n", req));
        }

        prompt.push_str("\n## Guidelines\n");
        for guideline in &self.guidelines {
            prompt.push_str(&format!("- {}\n", guideline));
        }

        prompt.push_str("\n## Avoid\n");
        for avoid in &self.avoid {
            prompt.push_str(&format!("- {}\n", avoid));
        }

        prompt
    }
}

/// Tier-specific prompt guidance appended to the base system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierPrompt {
    pub tier: String,
    pub objective: String,
    pub instructions: Vec<String>,
}

impl TierPrompt {
    pub fn fast() -> Self {
        Self {
            tier: ModelTier::Fast.as_str().to_string(),
            objective: "Answer a simple factual question directly from context".to_string(),
            instructions: vec![
                "Answer in one or two sentences".to_string(),
                "Skip tool calls unless the question explicitly needs a calculation or a price".to_string(),
            ],
        }
    }

    pub fn pro() -> Self {
        Self {
            tier: ModelTier::Pro.as_str().to_string(),
            objective: "Answer a standard advisory question with supporting detail".to_string(),
            instructions: vec![
                "Use retrieved context to ground every claim".to_string(),
                "Call tools as needed to fill in prices, calculations, or current records".to_string(),
                "Summarize the reasoning path briefly if it helps the customer understand the answer".to_string(),
            ],
        }
    }

    pub fn deep_think() -> Self {
        Self {
            tier: ModelTier::DeepThink.as_str().to_string(),
            objective: "Work through a multi-step or ambiguous question carefully".to_string(),
            instructions: vec![
                "Break the question into sub-questions before answering".to_string(),
                "Cross-check retrieved context across collections when the question spans domains".to_string(),
                "State explicitly when the answer depends on facts not present in retrieved context".to_string(),
            ],
        }
    }
}

/// Fallback templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackTemplates {
    /// Didn't understand
    pub not_understood: String,
    /// Technical issue
    pub technical_issue: String,
    /// Out of scope
    pub out_of_scope: String,
    /// Need more info
    pub need_more_info: String,
}

impl Default for FallbackTemplates {
    fn default() -> Self {
        Self {
            not_understood: "I'm sorry, I didn't quite catch that. Could you please rephrase your question?".to_string(),
            technical_issue: "I'm having trouble reaching one of my information sources right now. Could you try again in a moment?".to_string(),
            out_of_scope: "I specialize in Indonesian visa, tax, legal, and business questions. Could you rephrase your question within that scope?".to_string(),
            need_more_info: "Could you share a bit more detail so I can give you an accurate answer?".to_string(),
        }
    }
}

impl PromptTemplates {
    /// Get the tier-specific prompt fragment.
    pub fn get_tier_prompt(&self, tier: ModelTier) -> Option<&TierPrompt> {
        self.tier_prompts.get(tier.as_str())
    }

    /// Build the complete system prompt for a given model tier.
    pub fn build_system_prompt(&self, tier: ModelTier) -> String {
        let mut prompt = self.system_prompt.build();

        if let Some(tier_prompt) = self.get_tier_prompt(tier) {
            prompt.push_str(&format!(
                "\n## Current Mode: {}\nObjective: {}\n",
                tier_prompt.tier, tier_prompt.objective
            ));

            prompt.push_str("Instructions for this mode:\n");
            for instruction in &tier_prompt.instructions {
                prompt.push_str(&format!("- {}\n", instruction));
            }
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_templates_nonempty() {
        let templates = PromptTemplates::default();
        assert!(!templates.system_prompt.instructions.is_empty());
        assert_eq!(templates.tier_prompts.len(), 3);
    }

    #[test]
    fn system_prompt_build_contains_persona() {
        let templates = PromptTemplates::default();
        let prompt = templates.system_prompt.build();

        assert!(prompt.contains("Zantara"));
        assert!(prompt.contains("Bali Zero"));
        assert!(prompt.contains("Instructions"));
        assert!(prompt.contains("Compliance"));
    }

    #[test]
    fn all_tiers_have_prompts() {
        let templates = PromptTemplates::default();

        assert!(templates.get_tier_prompt(ModelTier::Fast).is_some());
        assert!(templates.get_tier_prompt(ModelTier::Pro).is_some());
        assert!(templates.get_tier_prompt(ModelTier::DeepThink).is_some());
    }

    #[test]
    fn build_system_prompt_includes_tier_objective() {
        let templates = PromptTemplates::default();
        let prompt = templates.build_system_prompt(ModelTier::DeepThink);

        assert!(prompt.contains("multi-step") || prompt.contains("ambiguous"));
    }
}
