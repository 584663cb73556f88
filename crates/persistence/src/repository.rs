//! Repositories over the tables the migrations create: conversation
//! turns, user profiles (slot-filled semantic facts), and CRM contacts.

use std::collections::HashMap;

use rag_core::{Turn, TurnMetadata, TurnRole};
use sqlx::{PgPool, Row};

use crate::error::PersistenceError;

pub struct ConversationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ConversationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, session_id: &str, turn: &Turn) -> Result<(), PersistenceError> {
        let metadata = turn.metadata.as_ref();
        sqlx::query(
            "INSERT INTO conversation_turns \
             (session_id, role, content, intent, verification_score, is_error) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(session_id)
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(metadata.and_then(|m| m.intent.clone()))
        .bind(metadata.and_then(|m| m.verification_score.map(|s| s as i16)))
        .bind(turn.is_error_stub())
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn history(&self, session_id: &str, limit: i64) -> Result<Vec<Turn>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT role, content, intent, verification_score, is_error, created_at \
             FROM conversation_turns WHERE session_id = $1 \
             ORDER BY created_at ASC LIMIT $2",
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let role_str: String = row.get("role");
                let role = match role_str.as_str() {
                    "user" => TurnRole::User,
                    "assistant" => TurnRole::Assistant,
                    _ => TurnRole::System,
                };
                let intent: Option<String> = row.get("intent");
                let verification_score: Option<i16> = row.get("verification_score");
                let is_error: bool = row.get("is_error");

                let mut metadata = TurnMetadata::new();
                metadata.intent = intent;
                metadata.verification_score = verification_score.map(|s| s as u8);
                metadata.is_error = is_error;

                Turn::new(role, row.get::<String, _>("content")).with_metadata(metadata)
            })
            .collect())
    }
}

pub struct UserProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserProfileRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn known_facts(&self, user_id: &str) -> Result<HashMap<String, String>, PersistenceError> {
        let row = sqlx::query("SELECT known_facts FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => {
                let facts: serde_json::Value = row.get("known_facts");
                Ok(serde_json::from_value(facts)?)
            }
            None => Ok(HashMap::new()),
        }
    }

    pub async fn upsert_fact(&self, user_id: &str, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut facts = self.known_facts(user_id).await?;
        facts.insert(key.to_string(), value.to_string());
        let facts_json = serde_json::to_value(&facts)?;

        sqlx::query(
            "INSERT INTO user_profiles (user_id, known_facts, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (user_id) DO UPDATE SET known_facts = $2, updated_at = now()",
        )
        .bind(user_id)
        .bind(facts_json)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

pub struct CrmRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CrmRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_contact(&self, user_id: &str, display_name: Option<&str>) -> Result<i64, PersistenceError> {
        let row = sqlx::query(
            "INSERT INTO crm_contacts (user_id, display_name) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING id",
        )
        .bind(user_id)
        .bind(display_name)
        .fetch_one(self.pool)
        .await?;
        Ok(row.get("id"))
    }

    pub async fn record_interaction(&self, contact_id: i64, summary: &str, intent: Option<&str>) -> Result<(), PersistenceError> {
        sqlx::query("INSERT INTO crm_interactions (contact_id, summary, intent) VALUES ($1, $2, $3)")
            .bind(contact_id)
            .bind(summary)
            .bind(intent)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
