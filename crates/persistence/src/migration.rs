//! Migration definitions: strictly ordered, each with idempotent SQL and
//! an optional rollback body, declaring dependencies on earlier numbers.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// One schema migration. `number` is the strict ordering key; `depends_on`
/// lists other numbers that must already be applied before this one runs.
#[derive(Debug, Clone)]
pub struct Migration {
    pub number: i64,
    pub name: &'static str,
    pub sql: &'static str,
    pub rollback_sql: Option<&'static str>,
    pub depends_on: &'static [i64],
}

impl Migration {
    /// Content checksum, used to detect a migration body changing after it
    /// was already applied somewhere.
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.sql.hash(&mut hasher);
        hasher.finish()
    }
}

/// All migrations, in application order. Conversation turns, user
/// profiles (slot-filled semantic facts), and CRM contact/interaction
/// records — the three persisted entities named for this system.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        number: 1,
        name: "create_schema_migrations",
        sql: r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                number BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                checksum BIGINT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                execution_ms BIGINT NOT NULL,
                rollback_sql TEXT
            )
        "#,
        rollback_sql: Some("DROP TABLE IF EXISTS schema_migrations"),
        depends_on: &[],
    },
    Migration {
        number: 2,
        name: "create_conversation_turns",
        sql: r#"
            CREATE TABLE IF NOT EXISTS conversation_turns (
                id BIGSERIAL PRIMARY KEY,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                intent TEXT,
                verification_score SMALLINT,
                is_error BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE INDEX IF NOT EXISTS idx_conversation_turns_session
                ON conversation_turns (session_id, created_at)
        "#,
        rollback_sql: Some("DROP TABLE IF EXISTS conversation_turns"),
        depends_on: &[1],
    },
    Migration {
        number: 3,
        name: "create_user_profiles",
        sql: r#"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                known_facts JSONB NOT NULL DEFAULT '{}'::jsonb,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
        "#,
        rollback_sql: Some("DROP TABLE IF EXISTS user_profiles"),
        depends_on: &[1],
    },
    Migration {
        number: 4,
        name: "create_crm_contacts",
        sql: r#"
            CREATE TABLE IF NOT EXISTS crm_contacts (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT NOT NULL UNIQUE,
                display_name TEXT,
                preferred_language TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE TABLE IF NOT EXISTS crm_interactions (
                id BIGSERIAL PRIMARY KEY,
                contact_id BIGINT NOT NULL REFERENCES crm_contacts (id),
                summary TEXT NOT NULL,
                intent TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE INDEX IF NOT EXISTS idx_crm_interactions_contact
                ON crm_interactions (contact_id, created_at)
        "#,
        rollback_sql: Some("DROP TABLE IF EXISTS crm_interactions; DROP TABLE IF EXISTS crm_contacts"),
        depends_on: &[1, 3],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_strictly_ordered() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].number < pair[1].number);
        }
    }

    #[test]
    fn dependencies_reference_earlier_numbers_only() {
        for migration in MIGRATIONS {
            for dep in migration.depends_on {
                assert!(*dep < migration.number);
            }
        }
    }

    #[test]
    fn checksum_is_stable_and_content_sensitive() {
        let a = &MIGRATIONS[0];
        assert_eq!(a.checksum(), a.checksum());

        let b = Migration {
            number: a.number,
            name: a.name,
            sql: "SELECT 1",
            rollback_sql: None,
            depends_on: a.depends_on,
        };
        assert_ne!(a.checksum(), b.checksum());
    }
}
